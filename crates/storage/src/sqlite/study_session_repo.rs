use async_trait::async_trait;
use chrono::NaiveDate;
use prep_core::model::{StudySession, StudySessionId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_study_session_row, study_session_id_from_i64};
use crate::repository::{StorageError, StudySessionRepository, StudySessionRow};

#[async_trait]
impl StudySessionRepository for SqliteRepository {
    async fn append_session(
        &self,
        session: &StudySession,
    ) -> Result<StudySessionId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO study_sessions
                    (user_id, subject, duration_secs, session_date, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(session.user_id().as_str())
        .bind(session.subject())
        .bind(i64::from(session.duration_secs()))
        .bind(session.session_date())
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        study_session_id_from_i64(res.last_insert_rowid())
    }

    async fn list_sessions(
        &self,
        user: &UserId,
        limit: u32,
    ) -> Result<Vec<StudySessionRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, subject, duration_secs, session_date
                FROM study_sessions
                WHERE user_id = ?1
                ORDER BY session_date DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_study_session_row).collect()
    }

    async fn list_sessions_since(
        &self,
        user: &UserId,
        from: NaiveDate,
    ) -> Result<Vec<StudySessionRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, user_id, subject, duration_secs, session_date
                FROM study_sessions
                WHERE user_id = ?1 AND session_date >= ?2
                ORDER BY session_date DESC, id DESC
            ",
        )
        .bind(user.as_str())
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_study_session_row).collect()
    }
}
