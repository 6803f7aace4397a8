//! JSON File Store
//!
//! Persists each key as `<data_dir>/<key>.json`, so state survives
//! restarts of the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ports::{KeyValueStore, StoreError};

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.data_dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Only JSON goes in
        serde_json::from_str::<serde_json::Value>(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.data_dir)?;

        // Atomic replace
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Saved {} ({} bytes)", path.display(), value.len());
        Ok(())
    }
}
