//! Timed study blocks, scoped to the signed-in learner.
//!
//! Every session is appended to the local log. When a remote gateway is
//! configured and the owner is a remote account, the session is also inserted
//! remotely and reads prefer the remote copy; remote failures are logged and
//! reads fall back to the local log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use prep_core::model::{
    DailyStudyTotals, StudySession, StudySessionId, UserId, total_on, weekly_breakdown,
};
use storage::repository::StudySessionRepository;
use tracing::{debug, warn};

use crate::Clock;
use crate::error::StudyLogError;
use crate::remote::RemoteStudySessionGateway;

/// Records timed study blocks and reports study time.
pub struct StudyLogService {
    clock: Clock,
    sessions: Arc<dyn StudySessionRepository>,
    remote: Option<Arc<dyn RemoteStudySessionGateway>>,
    user: Mutex<Option<UserId>>,
}

impl StudyLogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        sessions: Arc<dyn StudySessionRepository>,
        remote: Option<Arc<dyn RemoteStudySessionGateway>>,
    ) -> Self {
        Self {
            clock,
            sessions,
            remote,
            user: Mutex::new(None),
        }
    }

    /// Log sessions for `user` from now on; `None` means the local learner.
    pub fn set_user(&self, user: Option<UserId>) {
        *self.user_slot() = user;
    }

    /// Owner of newly recorded sessions.
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.user_slot().clone().unwrap_or_else(UserId::local)
    }

    fn user_slot(&self) -> MutexGuard<'_, Option<UserId>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remote_for(&self, owner: &UserId) -> Option<&Arc<dyn RemoteStudySessionGateway>> {
        self.remote
            .as_ref()
            .filter(|_| owner.as_str() != UserId::LOCAL)
    }

    /// Log a finished study block dated today.
    ///
    /// Returns the id assigned by the local log.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::Session` for a blank subject or zero duration,
    /// and `StudyLogError::Storage` if the local write fails. Remote failures
    /// are logged only.
    pub async fn record(
        &self,
        subject: &str,
        duration: Duration,
    ) -> Result<StudySessionId, StudyLogError> {
        let owner = self.owner();
        let secs = u32::try_from(duration.as_secs()).unwrap_or(u32::MAX);
        let session = StudySession::new(owner.clone(), subject, secs, self.clock.today())?;

        if let Some(remote) = self.remote_for(&owner) {
            if let Err(err) = remote.insert_session(&session).await {
                warn!(user = %owner, error = %err, "remote study session insert failed");
            }
        }

        let id = self.sessions.append_session(&session).await?;
        debug!(%id, user = %owner, subject = session.subject(), secs, "study session recorded");
        Ok(id)
    }

    /// Sessions dated on or after `from`, newest first.
    async fn sessions_since(&self, from: NaiveDate) -> Result<Vec<StudySession>, StudyLogError> {
        let owner = self.owner();
        if let Some(remote) = self.remote_for(&owner) {
            match remote.fetch_sessions(&owner).await {
                Ok(sessions) => {
                    let mut sessions: Vec<_> = sessions
                        .into_iter()
                        .filter(|s| s.session_date() >= from)
                        .collect();
                    sessions.sort_by_key(|s| std::cmp::Reverse(s.session_date()));
                    return Ok(sessions);
                }
                Err(err) => {
                    warn!(user = %owner, error = %err, "remote study sessions unavailable, using local log");
                }
            }
        }
        let rows = self.sessions.list_sessions_since(&owner, from).await?;
        Ok(rows.into_iter().map(|row| row.session).collect())
    }

    /// Most recent sessions first.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::Storage` if the local log cannot be read.
    pub async fn recent(&self, limit: u32) -> Result<Vec<StudySession>, StudyLogError> {
        let mut sessions = self.sessions_since(NaiveDate::MIN).await?;
        sessions.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(sessions)
    }

    /// Seconds studied today.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::Storage` if the local log cannot be read.
    pub async fn today_total_secs(&self) -> Result<u64, StudyLogError> {
        let today = self.clock.today();
        let sessions = self.sessions_since(today).await?;
        Ok(total_on(&sessions, today))
    }

    /// Per-subject totals for the last seven days, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StudyLogError::Storage` if the local log cannot be read.
    pub async fn weekly_breakdown(&self) -> Result<Vec<DailyStudyTotals>, StudyLogError> {
        let today = self.clock.today();
        let sessions = self.sessions_since(today - ChronoDuration::days(6)).await?;
        Ok(weekly_breakdown(&sessions, today))
    }
}
