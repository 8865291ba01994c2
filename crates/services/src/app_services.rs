use std::sync::Arc;

use prep_core::model::{RemoteSettings, UserIdentity};
use storage::LocalProgressStore;
use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::progress_sync::{LoadSource, ProgressSynchronizer};
use crate::remote::{
    PostgrestClient, RemoteAuthGateway, RemoteProgressGateway, RemoteStudySessionGateway,
};
use crate::study_log_service::StudyLogService;

/// Assembles app-facing services. Remote mode is decided here, once.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressSynchronizer>,
    auth: Arc<AuthService>,
    study_log: Arc<StudyLogService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client for the remote store cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        remote: Option<RemoteSettings>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock, remote)
    }

    /// # Errors
    ///
    /// Returns `AppServicesError::Remote` if the HTTP client cannot be built.
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        remote: Option<RemoteSettings>,
    ) -> Result<Self, AppServicesError> {
        let client = remote.map(PostgrestClient::new).transpose()?.map(Arc::new);
        let progress_gateway = client
            .clone()
            .map(|c| c as Arc<dyn RemoteProgressGateway>);
        let auth_gateway = client
            .clone()
            .map(|c| c as Arc<dyn RemoteAuthGateway>);
        let sessions_gateway = client.map(|c| c as Arc<dyn RemoteStudySessionGateway>);

        let local = LocalProgressStore::new(Arc::clone(&storage.blobs));
        let progress = Arc::new(ProgressSynchronizer::new(clock, local, progress_gateway));
        let auth = Arc::new(AuthService::new(Arc::clone(&storage.blobs), auth_gateway));
        let study_log = Arc::new(StudyLogService::new(
            clock,
            Arc::clone(&storage.study_sessions),
            sessions_gateway,
        ));

        Ok(Self {
            progress,
            auth,
            study_log,
        })
    }

    /// Resolve the session identity and load progress for it.
    ///
    /// Only a remote identity selects remote progress and remote study
    /// sessions; a local identity and no identity both mean local-only mode.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Auth` if the identity store cannot be read.
    pub async fn start(&self) -> Result<(Option<UserIdentity>, LoadSource), AppServicesError> {
        let identity = self.auth.current_user().await?;
        self.study_log
            .set_user(identity.as_ref().map(|identity| identity.id.clone()));
        let user = identity
            .as_ref()
            .filter(|identity| !identity.is_local())
            .map(|identity| identity.id.clone());
        let (map, source) = self.progress.load_with_source(user).await;
        info!(chapters = map.len(), ?source, remote = self.progress.has_remote(), "progress ready");
        Ok((identity, source))
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressSynchronizer> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn study_log(&self) -> Arc<StudyLogService> {
        Arc::clone(&self.study_log)
    }
}
