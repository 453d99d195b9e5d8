//! Core library for logindesk.
//!
//! Everything a login front end needs that is not drawing or key handling:
//!
//! - `browser`: legacy client detection
//! - `form`: login form state and request body encoding
//! - `api`: HTTP client for the login endpoint
//! - `storage`: namespaced key/value store for the session
//! - `auth`: client credentials and the stored session
//! - `messages`: localized user-facing text
//! - `controller`: the submit/response/reset flow tying it together
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod browser;
pub mod config;
pub mod controller;
pub mod form;
pub mod messages;
pub mod storage;

pub use api::{ApiError, LoginClient, LoginResponse};
pub use auth::{ClientCredentials, SecretStore, StoredSession};
pub use browser::{ClientIdentity, LegacyBrowser};
pub use config::Config;
pub use controller::{LoginController, Outcome, SubmitRejected, SubmitRequest, SubmitState};
pub use form::{FormFields, LoginField, LoginForm};
pub use messages::{Locale, Messages};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
