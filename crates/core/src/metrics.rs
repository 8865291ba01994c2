//! Aggregates derived from a [`ProgressMap`] snapshot.
//!
//! Every function here is pure. Percentages are in `[0, 100]` and an empty
//! selection yields `0.0`, never `NaN`.

use crate::model::{ChapterId, ProgressMap};

/// Subjects of the syllabus shown in the per-subject overview.
pub const SYLLABUS_SUBJECTS: [&str; 4] = ["Physics", "Chemistry", "Mathematics", "Biology"];

fn percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = completed as f64 / total as f64;
    ratio * 100.0
}

#[must_use]
pub fn total_chapters(map: &ProgressMap) -> usize {
    map.len()
}

#[must_use]
pub fn completed_chapters(map: &ProgressMap) -> usize {
    map.chapters().filter(|chapter| chapter.completed).count()
}

/// Share of recorded chapters marked completed.
#[must_use]
pub fn overall_progress(map: &ProgressMap) -> f64 {
    percent(completed_chapters(map), total_chapters(map))
}

/// Completion share among chapters whose id starts with `subject` (case-insensitive).
#[must_use]
pub fn subject_progress(map: &ProgressMap, subject: &str) -> f64 {
    let (total, completed) = map
        .iter()
        .filter(|(id, _)| id.has_subject_prefix(subject))
        .fold((0, 0), |(total, completed), (_, chapter)| {
            (total + 1, completed + usize::from(chapter.completed))
        });
    percent(completed, total)
}

/// Ids flagged important, in the map's insertion order.
#[must_use]
pub fn important_chapter_ids(map: &ProgressMap) -> Vec<ChapterId> {
    map.iter()
        .filter(|(_, chapter)| chapter.important)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Per-subject completion share.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectProgress {
    pub subject: String,
    pub percent: f64,
}

/// All dashboard aggregates computed from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    pub overall_percent: f64,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub important_chapters: Vec<ChapterId>,
    pub subjects: Vec<SubjectProgress>,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_map<S: AsRef<str>>(map: &ProgressMap, subjects: &[S]) -> Self {
        Self {
            overall_percent: overall_progress(map),
            total_chapters: total_chapters(map),
            completed_chapters: completed_chapters(map),
            important_chapters: important_chapter_ids(map),
            subjects: subjects
                .iter()
                .map(|subject| SubjectProgress {
                    subject: subject.as_ref().to_owned(),
                    percent: subject_progress(map, subject.as_ref()),
                })
                .collect(),
        }
    }
}
