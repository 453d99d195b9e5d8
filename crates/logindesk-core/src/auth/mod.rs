//! Client credentials and the stored login session.
//!
//! This module provides:
//! - `ClientCredentials`: the application's id/secret pair and its Basic header
//! - `SecretStore`: OS-level storage for the client secret via keyring
//! - `StoredSession`: token and user id kept under client id namespaced keys

pub mod credentials;
pub mod session;

pub use credentials::{ClientCredentials, SecretStore};
pub use session::StoredSession;
