use async_trait::async_trait;
use chrono::NaiveDate;
use prep_core::model::{StudySession, StudySessionId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable text blobs addressed by a fixed key.
#[async_trait]
pub trait BlobRepository: Send + Sync {
    /// Fetch the blob stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the blob cannot be stored.
    async fn put_blob(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the blob under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_blob(&self, key: &str) -> Result<(), StorageError>;
}

/// Persisted study session together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySessionRow {
    pub id: StudySessionId,
    pub session: StudySession,
}

impl StudySessionRow {
    #[must_use]
    pub fn new(id: StudySessionId, session: StudySession) -> Self {
        Self { id, session }
    }
}

#[async_trait]
pub trait StudySessionRepository: Send + Sync {
    /// Append a study session and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn append_session(&self, session: &StudySession)
    -> Result<StudySessionId, StorageError>;

    /// Most recent sessions of `user` first, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or mapping failures.
    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySessionRow>, StorageError>;

    /// Sessions of `user` dated on or after `from`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or mapping failures.
    async fn list_sessions_since(
        &self,
        user: &UserId,
        from: NaiveDate,
    ) -> Result<Vec<StudySessionRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    blobs: Arc<Mutex<HashMap<String, String>>>,
    sessions: Arc<Mutex<Vec<StudySessionRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(rows: &mut [StudySessionRow]) {
    rows.sort_by(|a, b| {
        b.session
            .session_date()
            .cmp(&a.session.session_date())
            .then(b.id.cmp(&a.id))
    });
}

#[async_trait]
impl BlobRepository for InMemoryRepository {
    async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn put_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete_blob(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl StudySessionRepository for InMemoryRepository {
    async fn append_session(
        &self,
        session: &StudySession,
    ) -> Result<StudySessionId, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.iter().map(|row| row.id.value()).max().unwrap_or(0) + 1;
        let id = StudySessionId::new(next);
        guard.push(StudySessionRow::new(id, session.clone()));
        Ok(id)
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySessionRow>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| row.session.user_id() == user)
            .cloned()
            .collect();
        newest_first(&mut rows);
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    async fn list_sessions_since(
        &self,
        user: &UserId,
        from: NaiveDate,
    ) -> Result<Vec<StudySessionRow>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|row| row.session.user_id() == user && row.session.session_date() >= from)
            .cloned()
            .collect();
        newest_first(&mut rows);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub blobs: Arc<dyn BlobRepository>,
    pub study_sessions: Arc<dyn StudySessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let blobs: Arc<dyn BlobRepository> = Arc::new(repo.clone());
        let study_sessions: Arc<dyn StudySessionRepository> = Arc::new(repo);
        Self {
            blobs,
            study_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn blob_put_get_delete() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_blob("k").await.unwrap(), None);
        repo.put_blob("k", "v1").await.unwrap();
        repo.put_blob("k", "v2").await.unwrap();
        assert_eq!(repo.get_blob("k").await.unwrap().as_deref(), Some("v2"));
        repo.delete_blob("k").await.unwrap();
        repo.delete_blob("k").await.unwrap();
        assert_eq!(repo.get_blob("k").await.unwrap(), None);
    }

    fn session(user: &UserId, subject: &str, secs: u32, date: NaiveDate) -> StudySession {
        StudySession::new(user.clone(), subject, secs, date).unwrap()
    }

    #[tokio::test]
    async fn sessions_listed_newest_first() {
        let repo = InMemoryRepository::new();
        let me = UserId::local();
        let older = session(&me, "Physics", 600, day(1));
        let newer = session(&me, "Chemistry", 300, day(3));
        repo.append_session(&older).await.unwrap();
        let newer_id = repo.append_session(&newer).await.unwrap();

        let rows = repo.list_sessions(&me, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, newer_id);

        let recent = repo.list_sessions_since(&me, day(2)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].session, newer);

        assert_eq!(repo.list_sessions(&me, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sessions_are_scoped_to_their_owner() {
        let repo = InMemoryRepository::new();
        let asha = UserId::new("asha").unwrap();
        let ravi = UserId::new("ravi").unwrap();
        repo.append_session(&session(&asha, "Physics", 600, day(2)))
            .await
            .unwrap();
        repo.append_session(&session(&ravi, "Biology", 900, day(2)))
            .await
            .unwrap();

        let rows = repo.list_sessions_since(&asha, day(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session.subject(), "Physics");
        assert!(repo.list_sessions(&UserId::local(), 10).await.unwrap().is_empty());
    }
}
