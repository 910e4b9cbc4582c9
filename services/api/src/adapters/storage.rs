//! services/api/src/adapters/storage.rs
//!
//! The durable storage adapter: one JSON file per key under a data directory.
//! It implements the `DurableStorage` port from the `core` crate.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use travel_planner_core::ports::{DurableStorage, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Creates the adapter, making sure the data directory exists.
    pub async fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::Unexpected(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

//=========================================================================================
// `DurableStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl DurableStorage for JsonFileStorage {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Writes to a sibling temp file first so a crash never leaves a half-written blob.
    async fn save(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to replace {}: {}", path.display(), e)))
    }
}
