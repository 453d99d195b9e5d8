//! Persistent key/value storage, the terminal stand-in for browser local
//! storage.
//!
//! Values are plain strings. `FileStore` keeps every entry in a single JSON
//! file and writes through on each change; `MemoryStore` is the same thing
//! without the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Application name used for the data directory path
const APP_NAME: &str = "logindesk";

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not find data directory")]
    NoDataDir,

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// A stored string and when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

impl StoredValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            updated_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.updated_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Build the `<namespace>.<name>` key used for namespaced entries
pub fn namespaced_key(namespace: &str, name: &str) -> String {
    format!("{}.{}", namespace, name)
}

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<&StoredValue>;

    /// Write all entries or none of them
    fn save_items(&mut self, items: &[(&str, &str)]) -> Result<(), StorageError>;

    fn get_value(&self, key: &str) -> Option<&str> {
        self.get_item(key).map(|v| v.value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<&StoredValue> {
        self.items.get(key)
    }

    fn save_items(&mut self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in items {
            self.items.insert(key.to_string(), StoredValue::new(*value));
        }
        Ok(())
    }
}

/// JSON file backed store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: BTreeMap<String, StoredValue>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items: BTreeMap<String, StoredValue> = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = items.len(), "Storage opened");
        Ok(Self { path, items })
    }

    /// Open the store in the user's data directory
    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(Self::default_path()?)
    }

    pub fn default_path() -> Result<PathBuf, StorageError> {
        let data_dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(data_dir.join(APP_NAME).join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, items: &BTreeMap<String, StoredValue>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(items)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<&StoredValue> {
        self.items.get(key)
    }

    /// The in-memory entries change only once the file has been written
    fn save_items(&mut self, items: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut updated = self.items.clone();
        for (key, value) in items {
            updated.insert(key.to_string(), StoredValue::new(*value));
        }
        self.flush(&updated)?;
        self.items = updated;
        Ok(())
    }
}
