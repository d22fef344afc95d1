//! Local filesystem state store.
//!
//! Persists the watcher state as a single JSON file. Writes go to a
//! temporary file first and are committed with an atomic rename, so a crash
//! mid-write never leaves a state file that `load()` cannot parse.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::PersistedState;
use crate::storage::{StateData, StateStore};

/// JSON-file state backend.
#[derive(Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::persistence(format!("create {parent:?}: {e}")))?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| AppError::persistence(format!("create {tmp:?}: {e}")))?;
        file.write_all(bytes)
            .await
            .map_err(|e| AppError::persistence(format!("write {tmp:?}: {e}")))?;
        file.flush()
            .await
            .map_err(|e| AppError::persistence(format!("flush {tmp:?}: {e}")))?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::persistence(format!("rename to {:?}: {e}", self.path)))?;
        Ok(())
    }

    /// Read the raw state file, returning None if it doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::persistence(format!("read {:?}: {e}", self.path))),
        }
    }

    /// Load the full on-disk record including its header.
    pub async fn load_data(&self) -> Result<Option<StateData>> {
        match self.read_bytes().await? {
            Some(bytes) => {
                let data = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::persistence(format!("parse {:?}: {e}", self.path))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<PersistedState> {
        match self.load_data().await? {
            Some(data) => Ok(data.challenges),
            None => {
                log::debug!("No state file at {:?}, starting empty", self.path);
                Ok(PersistedState::new())
            }
        }
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let data = StateData::new(state.clone());
        let bytes = serde_json::to_vec_pretty(&data)
            .map_err(|e| AppError::persistence(format!("serialize state: {e}")))?;
        self.write_bytes(&bytes).await?;
        log::debug!("Saved {} challenges to {:?}", data.count, self.path);
        Ok(())
    }
}
