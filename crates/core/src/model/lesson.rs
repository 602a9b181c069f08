use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, SectionId};
use crate::model::section::Section;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson id cannot be empty")]
    EmptyId,

    #[error("lesson {lesson} has an empty title")]
    EmptyTitle { lesson: LessonId },

    #[error("lesson {lesson} has a section with an empty id at position {position}")]
    EmptySectionId { lesson: LessonId, position: usize },

    #[error("lesson {lesson} repeats section id {section}")]
    DuplicateSectionId { lesson: LessonId, section: SectionId },

    #[error("section {section} reveals a hint after its solution")]
    HintAfterSolution { section: SectionId },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Authored, not-yet-validated lesson as it comes out of content files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl LessonDraft {
    /// Validate authoring invariants and produce an immutable `Lesson`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if ids are empty or repeated, the title is blank,
    /// or an exercise reveals a hint later than its solution.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(LessonError::EmptyId);
        }
        let id = LessonId::new(id);
        if self.title.trim().is_empty() {
            return Err(LessonError::EmptyTitle { lesson: id });
        }

        let mut seen = HashSet::with_capacity(self.sections.len());
        for (position, section) in self.sections.iter().enumerate() {
            if section.id.as_str().trim().is_empty() {
                return Err(LessonError::EmptySectionId {
                    lesson: id,
                    position,
                });
            }
            if !seen.insert(section.id.as_str()) {
                return Err(LessonError::DuplicateSectionId {
                    lesson: id,
                    section: section.id.clone(),
                });
            }
            if let Some(exercise) = section.exercise()
                && let Some(solution) = &exercise.solution
                && exercise
                    .hints
                    .iter()
                    .any(|hint| hint.after_attempt > solution.after_attempt)
            {
                return Err(LessonError::HintAfterSolution {
                    section: section.id.clone(),
                });
            }
        }

        Ok(Lesson {
            id,
            title: self.title,
            sections: self.sections,
        })
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// Ordered, read-only sequence of sections. Order defines the unlock chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    sections: Vec<Section>,
}

impl Lesson {
    /// Build a lesson from already-typed parts.
    ///
    /// # Errors
    ///
    /// Same as [`LessonDraft::validate`].
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        sections: Vec<Section>,
    ) -> Result<Self, LessonError> {
        LessonDraft {
            id: id.as_str().to_owned(),
            title: title.into(),
            sections,
        }
        .validate()
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    #[must_use]
    pub fn position_of(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|section| &section.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &SectionId) -> bool {
        self.position_of(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::section::{ExercisePayload, Hint, SectionContent, Solution};

    fn reading(id: &str) -> Section {
        Section::new(
            SectionId::new(id),
            id.to_uppercase(),
            SectionContent::Reading { body: "text".into() },
        )
    }

    #[test]
    fn lesson_keeps_section_order() {
        let lesson = Lesson::new(
            LessonId::new("arrays"),
            "Arrays",
            vec![reading("a"), reading("b"), reading("c")],
        )
        .unwrap();
        assert_eq!(lesson.len(), 3);
        assert_eq!(lesson.position_of(&SectionId::new("c")), Some(2));
        assert!(lesson.section(3).is_none());
    }

    #[test]
    fn duplicate_section_ids_are_rejected() {
        let err = Lesson::new(
            LessonId::new("arrays"),
            "Arrays",
            vec![reading("a"), reading("a")],
        )
        .unwrap_err();
        assert!(matches!(err, LessonError::DuplicateSectionId { .. }));
    }

    #[test]
    fn empty_lesson_id_is_rejected() {
        let draft = LessonDraft {
            id: "  ".into(),
            title: "Untitled".into(),
            sections: Vec::new(),
        };
        assert_eq!(draft.validate().unwrap_err(), LessonError::EmptyId);
    }

    #[test]
    fn empty_lesson_is_valid_content() {
        let lesson = Lesson::new(LessonId::new("empty"), "Empty", Vec::new()).unwrap();
        assert!(lesson.is_empty());
    }

    #[test]
    fn hint_later_than_solution_is_rejected() {
        let exercise = Section::new(
            SectionId::new("ex"),
            "Exercise",
            SectionContent::Exercise(ExercisePayload {
                instructions: "do it".into(),
                starter_code: String::new(),
                hints: vec![Hint {
                    text: "late".into(),
                    after_attempt: 5,
                }],
                solution: Some(Solution {
                    code: String::new(),
                    explanation: None,
                    after_attempt: 3,
                }),
                test_cases: Vec::new(),
                quiz_placement: None,
            }),
        );
        let err = Lesson::new(LessonId::new("l"), "L", vec![exercise]).unwrap_err();
        assert!(matches!(err, LessonError::HintAfterSolution { .. }));
    }
}
