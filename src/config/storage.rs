//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on restart
    #[default]
    Memory,
    /// One JSON file per record under `data_dir`
    File,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    pub data_dir: Option<PathBuf>,

    /// YAML question bank loaded at startup
    pub questions_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.data_dir.is_none() {
            return Err(ValidationError::MissingRequired("STORAGE__DATA_DIR"));
        }
        Ok(())
    }
}
