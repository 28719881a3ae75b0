//! services/api/src/adapters/storage.rs
//!
//! Concrete implementations of the `KeyValueStorage` port: a file-backed store
//! for durable carts and an in-memory store for session-only mode and tests.

use async_trait::async_trait;
use pocket_shop_core::ports::{KeyValueStorage, PortError, PortResult};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

//=========================================================================================
// FileStorage
//=========================================================================================

/// Stores each key as `{base_path}/{key}.json`.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn slot_path(&self, key: &str) -> PortResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", key)))
    }
}

/// Rejects keys that could escape the base directory.
fn validate_key(key: &str) -> PortResult<()> {
    if key.is_empty() {
        return Err(PortError::Storage("storage key cannot be empty".to_string()));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") || key.chars().any(char::is_control)
    {
        return Err(PortError::Storage(format!(
            "storage key contains invalid characters: {key:?}"
        )));
    }
    Ok(())
}

fn storage_error(e: std::io::Error) -> PortError {
    PortError::Storage(e.to_string())
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.slot_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    /// Writes to a uniquely named temp file and renames it over the slot, so a
    /// crash mid-write leaves the previous value intact.
    async fn write(&self, key: &str, blob: &str) -> PortResult<()> {
        let path = self.slot_path(key)?;
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(storage_error)?;

        let tmp_path = self
            .base_path
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));

        let write_result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(blob.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(storage_error(e));
        }
        debug!("Wrote {} bytes to {}", blob.len(), path.display());
        Ok(())
    }
}

//=========================================================================================
// MemoryStorage
//=========================================================================================

/// Keeps slots in process memory; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.slots.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, blob: &str) -> PortResult<()> {
        self.slots
            .write()
            .await
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
