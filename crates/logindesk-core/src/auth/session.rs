use crate::storage::{namespaced_key, KeyValueStore, StorageError};

/// Key suffixes under the client id namespace
const TOKEN_KEY: &str = "token";
const USERID_KEY: &str = "userid";

/// Token and user id saved after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub userid: String,
}

impl StoredSession {
    pub fn new(token: impl Into<String>, userid: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            userid: userid.into(),
        }
    }

    pub fn token_key(client_id: &str) -> String {
        namespaced_key(client_id, TOKEN_KEY)
    }

    pub fn userid_key(client_id: &str) -> String {
        namespaced_key(client_id, USERID_KEY)
    }

    /// Write both entries under `client_id` in one store update
    pub fn save<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        client_id: &str,
    ) -> Result<(), StorageError> {
        let token_key = Self::token_key(client_id);
        let userid_key = Self::userid_key(client_id);
        store.save_items(&[
            (token_key.as_str(), self.token.as_str()),
            (userid_key.as_str(), self.userid.as_str()),
        ])
    }

    /// Read the session for `client_id`; both entries must be present
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, client_id: &str) -> Option<Self> {
        let token = store.get_value(&Self::token_key(client_id))?;
        let userid = store.get_value(&Self::userid_key(client_id))?;
        Some(Self::new(token, userid))
    }
}
