#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod progress_sync;
pub mod remote;
pub mod study_log_service;
pub mod transfer;

pub use prep_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, IDENTITY_KEY};
pub use error::{AppServicesError, AuthError, RemoteError, StudyLogError, SyncError, TransferError};
pub use progress_sync::{LoadSource, ProgressSynchronizer};
pub use remote::{
    PostgrestClient, ProgressRow, RemoteAuthGateway, RemoteProgressGateway,
    RemoteStudySessionGateway, StudySessionRecord,
};
pub use study_log_service::StudyLogService;
pub use transfer::{ConfirmationGate, DEFAULT_EXPORT_FILE, RESET_PROMPT, ResetOutcome};
