use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use super::ids::UserId;

/// Subjects tracked in the weekly study breakdown.
pub const TRACKED_SUBJECTS: [&str; 4] = ["physics", "chemistry", "mathematics", "biology"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StudySessionError {
    #[error("study session subject cannot be empty")]
    EmptySubject,

    #[error("study session duration must be > 0")]
    ZeroDuration,
}

/// A completed, timed study block owned by one learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    user_id: UserId,
    subject: String,
    duration_secs: u32,
    session_date: NaiveDate,
}

impl StudySession {
    /// Creates a validated study session.
    ///
    /// # Errors
    ///
    /// Returns `StudySessionError` if the subject is blank or the duration is zero.
    pub fn new(
        user_id: UserId,
        subject: impl Into<String>,
        duration_secs: u32,
        session_date: NaiveDate,
    ) -> Result<Self, StudySessionError> {
        let subject = subject.into().trim().to_owned();
        if subject.is_empty() {
            return Err(StudySessionError::EmptySubject);
        }
        if duration_secs == 0 {
            return Err(StudySessionError::ZeroDuration);
        }
        Ok(Self {
            user_id,
            subject,
            duration_secs,
            session_date,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn session_date(&self) -> NaiveDate {
        self.session_date
    }
}

/// Study time per tracked subject for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStudyTotals {
    pub date: NaiveDate,
    pub per_subject: BTreeMap<&'static str, u64>,
}

impl DailyStudyTotals {
    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.per_subject.values().sum()
    }
}

/// Seconds studied on `date` across all subjects.
#[must_use]
pub fn total_on<'a>(sessions: impl IntoIterator<Item = &'a StudySession>, date: NaiveDate) -> u64 {
    sessions
        .into_iter()
        .filter(|session| session.session_date == date)
        .map(|session| u64::from(session.duration_secs))
        .sum()
}

/// The seven days ending at `today`, oldest first.
///
/// Sessions for subjects outside [`TRACKED_SUBJECTS`] are not counted.
#[must_use]
pub fn weekly_breakdown(sessions: &[StudySession], today: NaiveDate) -> Vec<DailyStudyTotals> {
    (0..7)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .map(|date| {
            let per_subject = TRACKED_SUBJECTS
                .iter()
                .map(|subject| {
                    let secs = sessions
                        .iter()
                        .filter(|s| s.session_date == date)
                        .filter(|s| s.subject.eq_ignore_ascii_case(subject))
                        .map(|s| u64::from(s.duration_secs))
                        .sum();
                    (*subject, secs)
                })
                .collect();
            DailyStudyTotals { date, per_subject }
        })
        .collect()
}
