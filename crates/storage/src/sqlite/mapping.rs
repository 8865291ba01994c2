use chrono::NaiveDate;
use prep_core::model::{StudySession, StudySessionId, UserId};
use sqlx::Row;

use crate::repository::{StorageError, StudySessionRow};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn study_session_id_from_i64(v: i64) -> Result<StudySessionId, StorageError> {
    Ok(StudySessionId::new(i64_to_u64("study_session_id", v)?))
}

pub(crate) fn map_study_session_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StudySessionRow, StorageError> {
    let id = study_session_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let user_id: String = row.try_get("user_id").map_err(ser)?;
    let user_id = UserId::new(user_id).map_err(ser)?;
    let subject: String = row.try_get("subject").map_err(ser)?;
    let duration_i64: i64 = row.try_get("duration_secs").map_err(ser)?;
    let duration_secs = u32::try_from(duration_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid duration_secs: {duration_i64}"))
    })?;
    let session_date: NaiveDate = row.try_get("session_date").map_err(ser)?;

    let session =
        StudySession::new(user_id, subject, duration_secs, session_date).map_err(ser)?;
    Ok(StudySessionRow::new(id, session))
}
