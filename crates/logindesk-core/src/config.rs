//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! where the login API lives, which client id to present, how to report
//! errors, and the last email that signed in successfully.
//!
//! Configuration is stored at `~/.config/logindesk/config.json`. A few
//! `LOGINDESK_*` environment variables override the file after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::auth::{ClientCredentials, SecretStore};
use crate::browser::ClientIdentity;
use crate::messages::Locale;

/// Application name used for config directory paths
const APP_NAME: &str = "logindesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "LOGINDESK_API_URL";
pub const ENV_CONTEXT_PATH: &str = "LOGINDESK_CONTEXT_PATH";
pub const ENV_CLIENT_ID: &str = "LOGINDESK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "LOGINDESK_CLIENT_SECRET";
pub const ENV_EMAIL: &str = "LOGINDESK_EMAIL";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the login API; the endpoint is `<api_url>/login`
    pub api_url: String,
    /// Base of the application; success navigates to `<context_path>/main.html`
    pub context_path: String,
    pub client_id: String,
    /// Only used when neither the environment nor the keychain has a secret
    pub client_secret: Option<String>,
    pub locale: Locale,
    pub request_timeout_secs: u64,
    /// Show the generic login error on transport failures instead of only logging
    pub show_transport_error: bool,
    /// Reported to the legacy client check
    pub identity: ClientIdentity,
    /// Hidden fields submitted after email and password
    pub extra_fields: Vec<(String, String)>,
    pub last_email: Option<String>,
    /// From `LOGINDESK_EMAIL`; never written to the file
    #[serde(skip)]
    pub email_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/etcdv3/api".to_string(),
            context_path: "http://localhost:8000".to_string(),
            client_id: APP_NAME.to_string(),
            client_secret: None,
            locale: Locale::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            show_transport_error: true,
            identity: ClientIdentity::current(),
            extra_fields: Vec::new(),
            last_email: None,
            email_override: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Remember `email` as the last successful login in the file at `path`.
    ///
    /// The file is re-read and only `last_email` changes, so overrides
    /// applied to this config never end up on disk.
    pub fn record_last_email(&mut self, path: &Path, email: &str) -> Result<()> {
        let mut on_disk = Self::load_from(path)?;
        on_disk.last_email = Some(email.to_string());
        on_disk.save_to(path)?;
        self.last_email = on_disk.last_email;
        Ok(())
    }

    /// Override file values with non-empty variables from `lookup`.
    /// The client secret is not copied into the config so it is never saved.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(path) = get(ENV_CONTEXT_PATH) {
            self.context_path = path;
        }
        if let Some(id) = get(ENV_CLIENT_ID) {
            self.client_id = id;
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.email_override = Some(email);
        }
    }

    /// Email to pre-fill: the override first, then the last successful login
    pub fn initial_email(&self) -> String {
        self.email_override
            .clone()
            .or_else(|| self.last_email.clone())
            .unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Client credentials, with the secret taken from the environment, then
    /// the OS keychain, then this config.
    pub fn resolve_credentials(&self) -> Result<ClientCredentials> {
        self.resolve_credentials_with(
            |name| std::env::var(name).ok(),
            |client_id| SecretStore::get(client_id).ok(),
        )
    }

    pub fn resolve_credentials_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
        keychain: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientCredentials> {
        let secret = env(ENV_CLIENT_SECRET)
            .filter(|s| !s.is_empty())
            .or_else(|| keychain(self.client_id.as_str()))
            .or_else(|| self.client_secret.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No client secret for '{}'. Set {} or run with --set-secret",
                    self.client_id,
                    ENV_CLIENT_SECRET
                )
            })?;
        Ok(ClientCredentials::new(self.client_id.clone(), secret))
    }

    /// `<context_path>/main.html`
    pub fn navigation_target(&self) -> String {
        format!("{}/main.html", self.context_path.trim_end_matches('/'))
    }
}
