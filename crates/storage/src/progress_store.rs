//! Local durable copy of the progress map.
//!
//! The whole map lives in one JSON blob under [`PROGRESS_KEY`]. Reads never
//! fail: a missing, unreadable or malformed blob is an empty map.

use std::sync::Arc;

use prep_core::model::ProgressMap;
use tracing::{debug, warn};

use crate::repository::{BlobRepository, StorageError};

pub const PROGRESS_KEY: &str = "prep-meter-progress";

#[derive(Clone)]
pub struct LocalProgressStore {
    blobs: Arc<dyn BlobRepository>,
    key: String,
}

impl LocalProgressStore {
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobRepository>) -> Self {
        Self::with_key(blobs, PROGRESS_KEY)
    }

    #[must_use]
    pub fn with_key(blobs: Arc<dyn BlobRepository>, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored map, degrading to an empty map on any failure.
    pub async fn load(&self) -> ProgressMap {
        let blob = match self.blobs.get_blob(&self.key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!(key = %self.key, "no local progress stored yet");
                return ProgressMap::new();
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "local progress unreadable, starting empty");
                return ProgressMap::new();
            }
        };

        match ProgressMap::from_json(&blob) {
            Ok(map) => {
                debug!(key = %self.key, chapters = map.len(), "loaded local progress");
                map
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "local progress is malformed, starting empty");
                ProgressMap::new()
            }
        }
    }

    /// Replace the stored blob with the full `map`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(&self, map: &ProgressMap) -> Result<(), StorageError> {
        let blob = map
            .to_json()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.blobs.put_blob(&self.key, &blob).await
    }

    /// Remove the stored blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.blobs.delete_blob(&self.key).await
    }
}
