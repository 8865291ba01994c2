use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a syllabus chapter, conventionally `"<Subject>-<Class>-<ChapterNumericId>"`.
///
/// Any non-empty string is accepted so that progress documents written by
/// older syllabus versions still load; [`ChapterId::parts`] only succeeds for
/// ids following the convention.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChapterId(String);

/// Borrowed view of a well-formed chapter id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterIdParts<'a> {
    pub subject: &'a str,
    pub class: u8,
    pub number: u32,
}

impl ChapterId {
    /// Creates a `ChapterId` from a raw string.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty or only whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ParseIdError::new("ChapterId"));
        }
        Ok(Self(raw))
    }

    /// Builds an id following the `"<Subject>-<Class>-<ChapterNumericId>"` convention.
    #[must_use]
    pub fn compose(subject: &str, class: u8, number: u32) -> Self {
        Self(format!("{subject}-{class}-{number}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the id into subject, class and chapter number.
    ///
    /// Returns `None` when the id does not follow the naming convention.
    #[must_use]
    pub fn parts(&self) -> Option<ChapterIdParts<'_>> {
        let mut pieces = self.0.rsplitn(3, '-');
        let number = pieces.next()?.parse().ok()?;
        let class = pieces.next()?.parse().ok()?;
        let subject = pieces.next().filter(|s| !s.is_empty())?;
        Some(ChapterIdParts {
            subject,
            class,
            number,
        })
    }

    /// Case-insensitive prefix match used for per-subject aggregation.
    #[must_use]
    pub fn has_subject_prefix(&self, subject: &str) -> bool {
        self.0.to_lowercase().starts_with(&subject.to_lowercase())
    }
}

impl TryFrom<String> for ChapterId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChapterId> for String {
    fn from(id: ChapterId) -> Self {
        id.0
    }
}

/// Opaque identifier of an authenticated learner.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Identifier used for the identity created in local-only mode.
    pub const LOCAL: &'static str = "local-user";

    /// Creates a `UserId`.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the id is empty or only whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseIdError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ParseIdError::new("UserId"));
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn local() -> Self {
        Self(Self::LOCAL.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Unique identifier for a logged study session
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudySessionId(u64);

impl StudySessionId {
    /// Creates a new `StudySessionId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChapterId({})", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for StudySessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StudySessionId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudySessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl ParseIdError {
    fn new(kind: &'static str) -> Self {
        Self { kind }
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ChapterId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for StudySessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(StudySessionId::new)
            .map_err(|_| ParseIdError::new("StudySessionId"))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_id_compose_and_parts() {
        let id = ChapterId::compose("Physics", 11, 4);
        assert_eq!(id.as_str(), "Physics-11-4");
        let parts = id.parts().unwrap();
        assert_eq!(parts.subject, "Physics");
        assert_eq!(parts.class, 11);
        assert_eq!(parts.number, 4);
    }

    #[test]
    fn test_chapter_id_parts_with_hyphenated_subject() {
        let id: ChapterId = "Organic-Chemistry-12-3".parse().unwrap();
        let parts = id.parts().unwrap();
        assert_eq!(parts.subject, "Organic-Chemistry");
        assert_eq!(parts.class, 12);
    }

    #[test]
    fn test_chapter_id_without_convention_has_no_parts() {
        let id: ChapterId = "misc".parse().unwrap();
        assert!(id.parts().is_none());
    }

    #[test]
    fn test_chapter_id_rejects_blank() {
        assert!("   ".parse::<ChapterId>().is_err());
        assert!(ChapterId::new(String::new()).is_err());
    }

    #[test]
    fn test_subject_prefix_is_case_insensitive() {
        let id: ChapterId = "Physics-11-1".parse().unwrap();
        assert!(id.has_subject_prefix("physics"));
        assert!(id.has_subject_prefix("PHYSICS"));
        assert!(!id.has_subject_prefix("chemistry"));
    }

    #[test]
    fn test_chapter_id_serde_is_plain_string() {
        let id = ChapterId::compose("Mathematics", 12, 7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Mathematics-12-7\"");
        let back: ChapterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ChapterId>("\"\"").is_err());
    }

    #[test]
    fn test_user_id_local() {
        assert_eq!(UserId::local().as_str(), "local-user");
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn test_study_session_id_from_str() {
        let id: StudySessionId = "55".parse().unwrap();
        assert_eq!(id, StudySessionId::new(55));
        assert!("x".parse::<StudySessionId>().is_err());
    }
}
