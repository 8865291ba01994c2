//! Optional remote record store.
//!
//! The synchronizer, the study log and the auth service only see the narrow
//! traits below;
//! [`PostgrestClient`] is the HTTP implementation used by the binary.

mod postgrest;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use prep_core::model::{
    ChapterId, ChapterProgress, Credentials, StudySession, Understanding, UserId, UserIdentity,
};
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

pub use postgrest::PostgrestClient;

/// One `(user, chapter)` record in the remote progress table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub user_id: UserId,
    pub chapter_id: ChapterId,
    pub completed: bool,
    pub revised: bool,
    pub understanding: Understanding,
    pub important: bool,
    #[serde(default)]
    pub subtopics: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    #[must_use]
    pub fn new(
        user_id: UserId,
        chapter_id: ChapterId,
        progress: &ChapterProgress,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            chapter_id,
            completed: progress.completed,
            revised: progress.revised,
            understanding: progress.understanding,
            important: progress.important,
            subtopics: Some(progress.subtopics.clone()),
            updated_at: Some(updated_at),
        }
    }

    #[must_use]
    pub fn into_entry(self) -> (ChapterId, ChapterProgress) {
        (
            self.chapter_id,
            ChapterProgress {
                completed: self.completed,
                revised: self.revised,
                understanding: self.understanding,
                important: self.important,
                subtopics: self.subtopics.unwrap_or_default(),
            },
        )
    }
}

/// One row of the remote study session table. `duration` is in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySessionRecord {
    pub user_id: UserId,
    pub subject: String,
    pub duration: u32,
    pub session_date: NaiveDate,
}

impl From<&StudySession> for StudySessionRecord {
    fn from(session: &StudySession) -> Self {
        Self {
            user_id: session.user_id().clone(),
            subject: session.subject().to_owned(),
            duration: session.duration_secs(),
            session_date: session.session_date(),
        }
    }
}

impl StudySessionRecord {
    /// # Errors
    ///
    /// Returns `RemoteError::Malformed` for a blank subject or a zero duration.
    pub fn into_session(self) -> Result<StudySession, RemoteError> {
        StudySession::new(self.user_id, self.subject, self.duration, self.session_date)
            .map_err(|err| RemoteError::Malformed(err.to_string()))
    }
}

/// Record-store access needed by the progress synchronizer.
#[async_trait]
pub trait RemoteProgressGateway: Send + Sync {
    /// All progress rows belonging to `user`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on transport failures or malformed rows.
    async fn fetch_by_user(&self, user: &UserId) -> Result<Vec<ProgressRow>, RemoteError>;

    /// Insert or replace the row keyed by `(row.user_id, row.chapter_id)`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on transport failures or rejected writes.
    async fn upsert(&self, row: &ProgressRow) -> Result<(), RemoteError>;
}

/// Record-store access needed by the study log.
#[async_trait]
pub trait RemoteStudySessionGateway: Send + Sync {
    /// All sessions owned by `user`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on transport failures or malformed rows.
    async fn fetch_sessions(&self, user: &UserId) -> Result<Vec<StudySession>, RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` on transport failures or rejected writes.
    async fn insert_session(&self, session: &StudySession) -> Result<(), RemoteError>;
}

/// Account operations of the remote backend.
#[async_trait]
pub trait RemoteAuthGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `RemoteError` when the backend rejects the credentials or is unreachable.
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserIdentity, RemoteError>;

    /// # Errors
    ///
    /// Returns `RemoteError` when the backend rejects the sign-up or is unreachable.
    async fn sign_up(&self, credentials: &Credentials) -> Result<UserIdentity, RemoteError>;
}
