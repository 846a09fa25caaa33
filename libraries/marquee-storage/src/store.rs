//! Typed JSON access on top of a `StorageBackend`.

use crate::backend::{FileBackend, MemoryBackend, StorageBackend};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Durable key → JSON value store.
///
/// Reads never fail: missing, unreadable and corrupt documents all come back as
/// absent so callers can proceed with defaults.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn StorageBackend>,
}

impl PersistentStore {
    /// Wrap an arbitrary backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// File-backed store rooted at `dir`
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(dir)))
    }

    /// Non-durable in-process store
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Whether written state survives a restart
    pub fn is_durable(&self) -> bool {
        self.backend.is_durable()
    }

    /// Read and parse the document under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.backend.read(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored document unreadable, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored document corrupt, treating as absent");
                None
            }
        }
    }

    /// Serialize `value` and durably replace the document under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.backend.write(key, &bytes).await?;
        debug!(key = %key, bytes = bytes.len(), "Stored document");
        Ok(())
    }

    /// Read a list document. Always yields a vector.
    ///
    /// A document that is not a JSON array, or whose elements do not parse as `T`,
    /// is reset to `[]` on disk.
    pub async fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let bytes = match self.backend.read(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored list unreadable, using empty list");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<T>>(&bytes) {
            Ok(items) => items,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored list corrupt, resetting to empty");
                if let Err(e) = self.backend.write(key, b"[]").await {
                    warn!(key = %key, error = %e, "Failed to reset corrupt list");
                }
                Vec::new()
            }
        }
    }

    /// Durably replace a list document
    pub async fn set_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.set(key, items).await
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("durable", &self.is_durable())
            .finish()
    }
}
