//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{CredentialsError, StudySessionError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the remote record store client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote store is unavailable: {0}")]
    Unavailable(String),
    #[error("remote request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("remote response was malformed: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ProgressSynchronizer` writes.
///
/// Remote failures never appear here; only the local write can fail a call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by progress import, export and reset.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    #[error("error importing progress file, please check the file format: {0}")]
    InvalidDocument(#[source] serde_json::Error),
    #[error("could not serialize progress: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StudyLogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyLogError {
    #[error(transparent)]
    Session(#[from] StudySessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
