//! Durable key/value blob storage for client-side state.
//!
//! The quote cart and favorites persist through the [`Storage`] trait so the
//! backing medium can be swapped: [`FileStorage`] writes one file per key,
//! [`MemoryStorage`] keeps everything in process (tests, ephemeral sessions).

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config;
use crate::error::{Result, StorefrontError};

/// Read/write a durable blob by key.
pub trait Storage: Send + Sync {
    /// Returns `None` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so a crash mid-write never leaves a truncated file behind.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create the storage, creating `dir` if it does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorefrontError::InvalidArgument(format!(
                "Invalid storage key: {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path).map_err(|e| StorefrontError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage. Clones share the same underlying map, which makes it
/// easy to simulate a reload: build a second store over a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner
            .lock()
            .map_err(|_| StorefrontError::InvalidArgument("storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.map()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Versioned payloads
// ---------------------------------------------------------------------------

/// Serialize `entries` as `{"version": <current>, "<field>": [...]}`.
pub(crate) fn encode_versioned<T: Serialize>(field: &str, entries: &[T]) -> Result<String> {
    let mut obj = serde_json::Map::new();
    obj.insert("version".into(), Value::from(config::CART_SCHEMA_VERSION));
    obj.insert(field.into(), serde_json::to_value(entries)?);
    Ok(serde_json::to_string(&Value::Object(obj))?)
}

/// Extract the raw entries of a versioned payload.
///
/// A bare JSON array is the unversioned layout written before envelopes
/// existed and is accepted as version 0. Payloads written by a newer schema
/// are rejected rather than guessed at.
pub(crate) fn decode_versioned(raw: &str, field: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(raw)?;
    let (version, entries) = match value {
        Value::Array(entries) => (0, entries),
        Value::Object(mut obj) => {
            let version = obj.get("version").and_then(Value::as_u64).unwrap_or(0);
            match obj.remove(field) {
                Some(Value::Array(entries)) => (version, entries),
                _ => {
                    return Err(StorefrontError::InvalidArgument(format!(
                        "stored payload has no '{}' list",
                        field
                    )))
                }
            }
        }
        other => {
            return Err(StorefrontError::InvalidArgument(format!(
                "unexpected stored payload: {}",
                other
            )))
        }
    };

    if version > u64::from(config::CART_SCHEMA_VERSION) {
        return Err(StorefrontError::InvalidArgument(format!(
            "stored payload has unsupported schema version {}",
            version
        )));
    }
    Ok(entries)
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
