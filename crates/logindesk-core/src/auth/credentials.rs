use std::fmt;

use anyhow::{Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use keyring::Entry;

const SERVICE_NAME: &str = "logindesk";

/// Identifies the calling application to the login API, not the end user.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Value for the `Authorization` header: `Basic base64(id:secret)`
    pub fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64_STANDARD.encode(pair))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Client secrets in the OS keychain, one entry per client id.
pub struct SecretStore;

impl SecretStore {
    pub fn store(client_id: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(secret)
            .context("Failed to store client secret in keychain")?;
        Ok(())
    }

    pub fn get(client_id: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve client secret from keychain")
    }

    pub fn delete(client_id: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, client_id)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete client secret from keychain")?;
        Ok(())
    }
}
