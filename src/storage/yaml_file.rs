use super::{KeyValueStore, StorageError};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::fs;
use std::sync::{Mutex, PoisonError};

/// Key-value store persisted as a single YAML mapping of strings.
///
/// The whole document is cached in memory and rewritten on every `set`
/// through a sibling temporary file followed by a rename.
#[derive(Debug)]
pub struct YamlFileStore {
    path: Utf8PathBuf,
    entries: Mutex<IndexMap<String, String>>,
}

impl YamlFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; the parent directory is created if
    /// needed. A file that does not parse as a mapping of strings is moved
    /// to a `.yaml.bak` sibling and the store starts empty.
    pub fn open<P: AsRef<Utf8Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let entries = match Self::read_document(&path) {
            Ok(entries) => entries,
            Err(StorageError::Parse { source, .. }) => {
                let backup = path.with_extension("yaml.bak");
                tracing::warn!(
                    "Store file {} is unreadable ({}), moving it to {} and starting empty",
                    path,
                    source,
                    backup
                );
                fs::rename(&path, &backup).map_err(|source| StorageError::Write {
                    path: backup.clone(),
                    source,
                })?;
                IndexMap::new()
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("Opened store {} with {} keys", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Read the document at `path`; a missing or blank file is empty
    fn read_document(path: &Utf8Path) -> Result<IndexMap<String, String>, StorageError> {
        if !path.exists() {
            tracing::info!("Store file {} not found, starting empty", path);
            return Ok(IndexMap::new());
        }

        let contents = fs::read_to_string(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if contents.trim().is_empty() {
            return Ok(IndexMap::new());
        }

        serde_yaml_ng::from_str(&contents).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_document(&self, entries: &IndexMap<String, String>) -> Result<(), StorageError> {
        let yaml = serde_yaml_ng::to_string(entries).map_err(|source| StorageError::Encode {
            key: self.path.to_string(),
            source,
        })?;

        let tmp_path = self.path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml).map_err(|source| StorageError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for YamlFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(key.to_string(), value.to_string());

        if let Err(e) = self.write_document(&entries) {
            // Keep the cache in line with what is on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.shift_remove(key),
            };
            return Err(e);
        }

        tracing::trace!("Stored key {} in {}", key, self.path);
        Ok(())
    }
}
