use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::{LessonId, SectionId};
use crate::model::lesson::Lesson;

//
// ─── SECTION STATUS ────────────────────────────────────────────────────────────
//

/// Per-section learner status. Ordered so that "moving forward" is `>`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl SectionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionStatus::NotStarted => "not_started",
            SectionStatus::InProgress => "in_progress",
            SectionStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, SectionStatus::Completed)
    }
}

//
// ─── SECTION PROGRESS ──────────────────────────────────────────────────────────
//

/// Progress record for one section. The default value is what an absent entry means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionProgress {
    pub status: SectionStatus,
    pub attempt_count: u32,
}

impl SectionProgress {
    /// Advance to `next` if it is ahead of the current status. Never regresses.
    pub(crate) fn advance_to(&mut self, next: SectionStatus) -> bool {
        if next > self.status {
            self.status = next;
            true
        } else {
            false
        }
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// One learner's progress through one lesson. This is the unit that gets persisted.
///
/// Entries in `sections_progress` are created lazily; read them through
/// [`LessonProgress::section_progress`], which returns the default for absent keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    lesson_id: LessonId,
    #[serde(default)]
    sections_progress: BTreeMap<SectionId, SectionProgress>,
    #[serde(default)]
    current_section_index: usize,
}

impl LessonProgress {
    /// Fresh progress for a lesson: nothing recorded, viewing the first section.
    #[must_use]
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            sections_progress: BTreeMap::new(),
            current_section_index: 0,
        }
    }

    #[must_use]
    pub fn for_lesson(lesson: &Lesson) -> Self {
        Self::new(lesson.id().clone())
    }

    #[must_use]
    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    #[must_use]
    pub fn current_section_index(&self) -> usize {
        self.current_section_index
    }

    /// True when this progress was recorded for `lesson`.
    #[must_use]
    pub fn belongs_to(&self, lesson: &Lesson) -> bool {
        &self.lesson_id == lesson.id()
    }

    /// Progress for a section, defaulting to `not_started` with zero attempts.
    #[must_use]
    pub fn section_progress(&self, id: &SectionId) -> SectionProgress {
        self.sections_progress.get(id).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn status_of(&self, id: &SectionId) -> SectionStatus {
        self.section_progress(id).status
    }

    #[must_use]
    pub fn attempt_count(&self, id: &SectionId) -> u32 {
        self.section_progress(id).attempt_count
    }

    /// Raw recorded entries, including any that no longer match a section of the lesson.
    pub fn entries(&self) -> impl Iterator<Item = (&SectionId, &SectionProgress)> {
        self.sections_progress.iter()
    }

    /// Entries whose section id is not part of `lesson`.
    pub fn orphaned_entries<'a>(&'a self, lesson: &'a Lesson) -> impl Iterator<Item = &'a SectionId> {
        self.sections_progress
            .keys()
            .filter(move |id| !lesson.contains(id))
    }

    pub(crate) fn entry_mut(&mut self, id: &SectionId) -> &mut SectionProgress {
        self.sections_progress.entry(id.clone()).or_default()
    }

    pub(crate) fn set_current_section_index(&mut self, index: usize) {
        self.current_section_index = index;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entry_reads_as_not_started() {
        let progress = LessonProgress::new(LessonId::new("arrays"));
        let entry = progress.section_progress(&SectionId::new("missing"));
        assert_eq!(entry.status, SectionStatus::NotStarted);
        assert_eq!(entry.attempt_count, 0);
    }

    #[test]
    fn status_never_regresses() {
        let mut entry = SectionProgress::default();
        assert!(entry.advance_to(SectionStatus::Completed));
        assert!(!entry.advance_to(SectionStatus::InProgress));
        assert_eq!(entry.status, SectionStatus::Completed);
    }

    #[test]
    fn status_order_is_forward() {
        assert!(SectionStatus::NotStarted < SectionStatus::InProgress);
        assert!(SectionStatus::InProgress < SectionStatus::Completed);
    }

    #[test]
    fn progress_serializes_with_snake_case_status() {
        let mut progress = LessonProgress::new(LessonId::new("l1"));
        progress.entry_mut(&SectionId::new("s1")).status = SectionStatus::InProgress;
        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains("\"in_progress\""));
        let back: LessonProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }

    #[test]
    fn missing_fields_deserialize_to_fresh_progress() {
        let progress: LessonProgress = serde_json::from_str(r#"{"lesson_id":"l1"}"#).unwrap();
        assert_eq!(progress, LessonProgress::new(LessonId::new("l1")));
    }
}
