//! Whole-map import, export and reset.
//!
//! These bypass the per-chapter merge: an import replaces the map outright and
//! a reset empties it. Neither touches the remote store.

use std::fs;
use std::path::{Path, PathBuf};

use prep_core::model::ProgressMap;
use tracing::{info, warn};

use crate::error::TransferError;
use crate::progress_sync::ProgressSynchronizer;

/// File name used when exporting into a directory.
pub const DEFAULT_EXPORT_FILE: &str = "prep-meter-progress.json";

pub const RESET_PROMPT: &str =
    "Are you sure you want to reset all progress? This cannot be undone.";

/// Asks the learner to approve a destructive action.
pub trait ConfirmationGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Cleared,
    Declined,
}

impl ProgressSynchronizer {
    /// Pretty-printed JSON document of the current map.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Serialize` if serialization fails.
    pub fn export_document(&self) -> Result<String, TransferError> {
        self.snapshot()
            .to_json_pretty()
            .map_err(TransferError::Serialize)
    }

    /// Write the export document to `target`.
    ///
    /// A directory target receives [`DEFAULT_EXPORT_FILE`]. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns `TransferError` if serialization or the file write fails.
    pub fn export_to_file(&self, target: &Path) -> Result<PathBuf, TransferError> {
        let path = if target.is_dir() {
            target.join(DEFAULT_EXPORT_FILE)
        } else {
            target.to_path_buf()
        };
        let document = self.export_document()?;
        fs::write(&path, document)?;
        info!(path = %path.display(), "exported progress");
        Ok(path)
    }

    /// Replace the whole map with the parsed `document` and persist it.
    ///
    /// Returns the number of chapters imported.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidDocument` if the document does not parse;
    /// the current map and the local store are then left untouched.
    pub async fn import_document(&self, document: &str) -> Result<usize, TransferError> {
        let imported = ProgressMap::from_json(document).map_err(|err| {
            warn!(error = %err, "rejected progress import");
            TransferError::InvalidDocument(err)
        })?;

        self.local.save(&imported).await?;
        let chapters = imported.len();
        self.state().map = imported;
        info!(chapters, "imported progress");
        Ok(chapters)
    }

    /// Read `path` and import it.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Io` if the file cannot be read, otherwise as
    /// [`Self::import_document`].
    pub async fn import_file(&self, path: &Path) -> Result<usize, TransferError> {
        let document = fs::read_to_string(path)?;
        self.import_document(&document).await
    }

    /// Empty the map and remove the local copy once `gate` approves.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Storage` if the local blob cannot be removed;
    /// the in-memory map is kept in that case.
    pub async fn reset(&self, gate: &dyn ConfirmationGate) -> Result<ResetOutcome, TransferError> {
        if !gate.confirm(RESET_PROMPT) {
            return Ok(ResetOutcome::Declined);
        }
        self.local.clear().await?;
        self.state().map = ProgressMap::new();
        info!("progress reset");
        Ok(ResetOutcome::Cleared)
    }
}
