//! File-based Key-Value Store Adapter
//!
//! One JSON file per key under a base directory. File names are the SHA-256
//! of the rendered key; the key itself is kept inside the file for
//! debugging.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use crate::ports::{KeyValueStore, StoreError, StoreKey};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    key: String,
    value: Value,
}

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_path: PathBuf,
}

impl FileKeyValueStore {
    /// ```ignore
    /// let store = FileKeyValueStore::new("./data/store");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.base_path.join(format!("{}.json", hex::encode(digest)))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();
        let path = self.file_path(&key);

        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::IoError(e.to_string())),
        };

        let envelope: Envelope = serde_json::from_slice(&raw).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(envelope.value))
    }

    async fn set(&self, key: &StoreKey, value: Value) -> Result<(), StoreError> {
        self.ensure_dir().await?;
        let key = key.to_string();
        let path = self.file_path(&key);
        // Unique per write so concurrent writers never share a temp file.
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let bytes = serde_json::to_vec_pretty(&Envelope { key, value })
            .map_err(|e| StoreError::IoError(e.to_string()))?;

        // Write-then-rename so readers never see a half-written file.
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::IoError(e.to_string()))
    }

    async fn remove(&self, key: &StoreKey) -> Result<(), StoreError> {
        let path = self.file_path(&key.to_string());
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(e.to_string())),
        }
    }
}
