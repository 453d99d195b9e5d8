//! HTTP client for the login endpoint.
//!
//! The endpoint takes a base64 encoded JSON form as the raw request body and
//! identifies the calling application with HTTP Basic authentication built
//! from the client id/secret pair.

pub mod client;
pub mod error;

pub use client::{LoginClient, LoginResponse};
pub use error::ApiError;
