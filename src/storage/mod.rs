//! Key-value persistence for the counter.
//!
//! The state manager only sees [`KeyValueStore`]: two string keys, [`COUNT_KEY`]
//! and [`SETTINGS_KEY`]. [`MemoryStore`] backs tests; [`YamlFileStore`] keeps
//! every key in one YAML document on disk.

pub mod yaml_file;

pub use yaml_file::YamlFileStore;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Key holding the decimal count
pub const COUNT_KEY: &str = "count";

/// Key holding the YAML-encoded settings record
pub const SETTINGS_KEY: &str = "settings";

/// Errors raised by a [`KeyValueStore`]
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read store file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store file {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Failed to encode value for key {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String-valued key-value storage.
///
/// `set` must either store the value durably or return an error and leave the
/// previous value readable.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Volatile store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<IndexMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `entries`
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
