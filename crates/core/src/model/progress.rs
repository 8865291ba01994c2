use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ChapterId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("understanding level must be between 0 and 5, got {0}")]
    InvalidUnderstanding(u8),
}

//
// ─── UNDERSTANDING ─────────────────────────────────────────────────────────────
//

/// Self-assessed understanding of a chapter, `0` meaning "not set".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Understanding(u8);

impl Understanding {
    pub const UNSET: Self = Self(0);
    pub const MAX: u8 = 5;

    /// Creates an understanding level.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidUnderstanding` when `level > 5`.
    pub fn new(level: u8) -> Result<Self, ProgressError> {
        if level > Self::MAX {
            return Err(ProgressError::InvalidUnderstanding(level));
        }
        Ok(Self(level))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_set(self) -> bool {
        self.0 > 0
    }

    /// Human-readable label shown next to the level.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Bad",
            2 => "Moderate",
            3 => "Good",
            4 => "Genius",
            5 => "PhD-level",
            _ => "Not Set",
        }
    }
}

impl TryFrom<u8> for Understanding {
    type Error = ProgressError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Understanding> for u8 {
    fn from(level: Understanding) -> Self {
        level.0
    }
}

//
// ─── CHAPTER PROGRESS ──────────────────────────────────────────────────────────
//

/// Key under which subtopic completion is stored, derived from the subtopic's
/// position in the syllabus chapter.
#[must_use]
pub fn subtopic_key(index: usize) -> String {
    format!("subtopic-{index}")
}

/// Progress recorded for one chapter.
///
/// The `Default` value is the record every unknown chapter is treated as.
/// Missing fields in persisted documents fall back to that value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterProgress {
    pub completed: bool,
    pub revised: bool,
    pub understanding: Understanding,
    pub important: bool,
    pub subtopics: BTreeMap<String, bool>,
}

impl ChapterProgress {
    #[must_use]
    pub fn subtopic_done(&self, index: usize) -> bool {
        self.subtopics
            .get(&subtopic_key(index))
            .copied()
            .unwrap_or(false)
    }

    #[must_use]
    pub fn completed_subtopics(&self) -> usize {
        self.subtopics.values().filter(|done| **done).count()
    }
}

/// Partial update of a [`ChapterProgress`]; unset fields keep their current value.
///
/// A present `subtopics` map replaces the stored one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterProgressPatch {
    pub completed: Option<bool>,
    pub revised: Option<bool>,
    pub understanding: Option<Understanding>,
    pub important: Option<bool>,
    pub subtopics: Option<BTreeMap<String, bool>>,
}

impl ChapterProgressPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completed(mut self, value: bool) -> Self {
        self.completed = Some(value);
        self
    }

    #[must_use]
    pub fn revised(mut self, value: bool) -> Self {
        self.revised = Some(value);
        self
    }

    #[must_use]
    pub fn understanding(mut self, value: Understanding) -> Self {
        self.understanding = Some(value);
        self
    }

    #[must_use]
    pub fn important(mut self, value: bool) -> Self {
        self.important = Some(value);
        self
    }

    #[must_use]
    pub fn subtopics(mut self, value: BTreeMap<String, bool>) -> Self {
        self.subtopics = Some(value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay this patch on `base`, later values winning.
    #[must_use]
    pub fn apply(&self, mut base: ChapterProgress) -> ChapterProgress {
        if let Some(completed) = self.completed {
            base.completed = completed;
        }
        if let Some(revised) = self.revised {
            base.revised = revised;
        }
        if let Some(understanding) = self.understanding {
            base.understanding = understanding;
        }
        if let Some(important) = self.important {
            base.important = important;
        }
        if let Some(subtopics) = &self.subtopics {
            base.subtopics = subtopics.clone();
        }
        base
    }
}

//
// ─── PROGRESS MAP ──────────────────────────────────────────────────────────────
//

/// All recorded chapter progress, keyed by chapter id in insertion order.
///
/// Equality ignores ordering; the JSON form is a plain object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap(IndexMap<ChapterId, ChapterProgress>);

impl ProgressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ChapterId) -> Option<&ChapterProgress> {
        self.0.get(id)
    }

    /// Stored record for `id`, or the zero value when the chapter is unknown.
    #[must_use]
    pub fn progress_of(&self, id: &ChapterId) -> ChapterProgress {
        self.0.get(id).cloned().unwrap_or_default()
    }

    /// Insert or replace a record, keeping the original position of existing ids.
    pub fn insert(&mut self, id: ChapterId, progress: ChapterProgress) -> Option<ChapterProgress> {
        self.0.insert(id, progress)
    }

    /// Merge `patch` over the current (or default) record and store the result.
    pub fn upsert(&mut self, id: ChapterId, patch: &ChapterProgressPatch) -> ChapterProgress {
        let merged = patch.apply(self.progress_of(&id));
        self.0.insert(id, merged.clone());
        merged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChapterId, &ChapterProgress)> {
        self.0.iter()
    }

    pub fn chapter_ids(&self) -> impl Iterator<Item = &ChapterId> {
        self.0.keys()
    }

    pub fn chapters(&self) -> impl Iterator<Item = &ChapterProgress> {
        self.0.values()
    }

    /// Pretty-printed JSON document of the whole map.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Compact JSON form used for the local blob.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON document into a map. Nothing is partially accepted.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` on syntax errors, a non-object top level,
    /// blank chapter ids, or out-of-range understanding levels.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}

impl FromIterator<(ChapterId, ChapterProgress)> for ProgressMap {
    fn from_iter<T: IntoIterator<Item = (ChapterId, ChapterProgress)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ProgressMap {
    type Item = (&'a ChapterId, &'a ChapterProgress);
    type IntoIter = indexmap::map::Iter<'a, ChapterId, ChapterProgress>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ProgressMap {
    type Item = (ChapterId, ChapterProgress);
    type IntoIter = indexmap::map::IntoIter<ChapterId, ChapterProgress>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ChapterId {
        raw.parse().unwrap()
    }

    #[test]
    fn understanding_rejects_out_of_range() {
        assert!(Understanding::new(5).is_ok());
        assert_eq!(
            Understanding::new(6),
            Err(ProgressError::InvalidUnderstanding(6))
        );
    }

    #[test]
    fn understanding_labels() {
        assert_eq!(Understanding::UNSET.label(), "Not Set");
        assert_eq!(Understanding::new(1).unwrap().label(), "Bad");
        assert_eq!(Understanding::new(5).unwrap().label(), "PhD-level");
    }

    #[test]
    fn missing_chapter_is_zero_value() {
        let map = ProgressMap::new();
        let progress = map.progress_of(&id("Physics-11-1"));
        assert_eq!(progress, ChapterProgress::default());
        assert!(!progress.completed);
        assert_eq!(progress.understanding, Understanding::UNSET);
        assert!(progress.subtopics.is_empty());
    }

    #[test]
    fn upsert_merges_over_existing_record() {
        let mut map = ProgressMap::new();
        map.upsert(id("Physics-11-1"), &ChapterProgressPatch::new().completed(true));
        let merged = map.upsert(
            id("Physics-11-1"),
            &ChapterProgressPatch::new().important(true),
        );
        assert!(merged.completed);
        assert!(merged.important);
        assert!(!merged.revised);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn subtopics_patch_replaces_whole_map() {
        let mut base = ChapterProgress::default();
        base.subtopics.insert(subtopic_key(0), true);
        let mut next = BTreeMap::new();
        next.insert(subtopic_key(1), true);
        let merged = ChapterProgressPatch::new().subtopics(next).apply(base);
        assert!(!merged.subtopic_done(0));
        assert!(merged.subtopic_done(1));
        assert_eq!(merged.completed_subtopics(), 1);
    }

    #[test]
    fn json_shape_matches_plain_object() {
        let mut map = ProgressMap::new();
        map.upsert(
            id("Chemistry-12-2"),
            &ChapterProgressPatch::new()
                .revised(true)
                .understanding(Understanding::new(3).unwrap()),
        );
        let value: serde_json::Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Chemistry-12-2": {
                    "completed": false,
                    "revised": true,
                    "understanding": 3,
                    "important": false,
                    "subtopics": {}
                }
            })
        );
    }

    #[test]
    fn from_json_fills_missing_fields_with_defaults() {
        let map = ProgressMap::from_json(r#"{"Biology-11-1": {"completed": true}}"#).unwrap();
        let progress = map.progress_of(&id("Biology-11-1"));
        assert!(progress.completed);
        assert!(progress.subtopics.is_empty());
    }

    #[test]
    fn from_json_rejects_bad_documents() {
        assert!(ProgressMap::from_json("{not json").is_err());
        assert!(ProgressMap::from_json("[1, 2]").is_err());
        assert!(ProgressMap::from_json(r#"{"Physics-11-1": {"understanding": 9}}"#).is_err());
        assert!(ProgressMap::from_json(r#"{"": {}}"#).is_err());
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a: ProgressMap = [
            (id("Physics-11-1"), ChapterProgress::default()),
            (id("Physics-11-2"), ChapterProgress::default()),
        ]
        .into_iter()
        .collect();
        let b: ProgressMap = [
            (id("Physics-11-2"), ChapterProgress::default()),
            (id("Physics-11-1"), ChapterProgress::default()),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }
}
