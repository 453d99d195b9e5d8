//! Login endpoint client.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::ClientCredentials;
use crate::form::FormFields;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the login endpoint relative to the API base URL
const LOGIN_PATH: &str = "/login";

/// Default HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Body of a login response.
///
/// `status` follows JavaScript truthiness since the backend is not strict
/// about its type; a missing or `null` status is false.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "truthy")]
    pub status: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

impl LoginResponse {
    /// Parse a response body. An empty or `null` body is a failed login.
    pub fn from_body(body: &str) -> Result<Self, ApiError> {
        let body = body.trim();
        if body.is_empty() {
            return Ok(Self::default());
        }
        let parsed: Option<Self> = serde_json::from_str(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;
        Ok(parsed.unwrap_or_default())
    }
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Client for the login endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct LoginClient {
    client: Client,
    api_url: String,
    credentials: ClientCredentials,
}

impl LoginClient {
    pub fn new(
        api_url: impl Into<String>,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            credentials,
        })
    }

    /// `<api_url>/login`, without doubling a trailing slash
    pub fn login_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), LOGIN_PATH)
    }

    /// Submit the form to the login endpoint.
    ///
    /// A non-2xx status or a transport failure is an error. A 2xx answer is
    /// returned as-is; whether it means success is decided by its `status`.
    pub async fn login(&self, fields: &FormFields) -> Result<LoginResponse, ApiError> {
        let url = self.login_url();
        let body = fields
            .encode_body()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        debug!(url = %url, fields = fields.len(), "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, self.credentials.basic_auth_header())
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, "Login request rejected");
            return Err(ApiError::from_status(status, &text));
        }

        LoginResponse::from_body(&text)
    }
}
