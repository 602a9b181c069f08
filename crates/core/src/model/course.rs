use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, ModuleId};
use crate::model::lesson::{Lesson, LessonDraft, LessonError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("module id cannot be empty (position {position})")]
    EmptyModuleId { position: usize },

    #[error("module id {0} is used twice")]
    DuplicateModuleId(ModuleId),

    #[error("lesson id {0} is used twice")]
    DuplicateLessonId(LessonId),

    #[error(transparent)]
    Lesson(#[from] LessonError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModuleDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseDraft {
    #[serde(default)]
    pub modules: Vec<CourseModuleDraft>,
}

impl CourseDraft {
    /// Validate every module and lesson of an authored course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` for blank or repeated module ids, lesson ids
    /// repeated across modules, and any `LessonError`.
    pub fn validate(self) -> Result<Course, CourseError> {
        let mut module_ids = HashSet::new();
        let mut lesson_ids = HashSet::new();
        let mut modules = Vec::with_capacity(self.modules.len());

        for (position, draft) in self.modules.into_iter().enumerate() {
            let id: ModuleId = draft
                .id
                .parse()
                .map_err(|_| CourseError::EmptyModuleId { position })?;
            if !module_ids.insert(id.clone()) {
                return Err(CourseError::DuplicateModuleId(id));
            }

            let mut lessons = Vec::with_capacity(draft.lessons.len());
            for lesson in draft.lessons {
                let lesson = lesson.validate()?;
                if !lesson_ids.insert(lesson.id().clone()) {
                    return Err(CourseError::DuplicateLessonId(lesson.id().clone()));
                }
                lessons.push(lesson);
            }

            modules.push(CourseModule {
                id,
                title: draft.title,
                lessons,
            });
        }

        Ok(Course { modules })
    }
}

/// A named group of lessons shown as one entry in the course sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseModule {
    id: ModuleId,
    title: String,
    lessons: Vec<Lesson>,
}

impl CourseModule {
    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }
}

/// Static course catalog: ordered modules, each an ordered list of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Course {
    modules: Vec<CourseModule>,
}

impl Course {
    #[must_use]
    pub fn modules(&self) -> &[CourseModule] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, index: usize) -> Option<&CourseModule> {
        self.modules.get(index)
    }

    /// Locate a lesson and the index of the module that owns it.
    #[must_use]
    pub fn find_lesson(&self, id: &LessonId) -> Option<(usize, &Lesson)> {
        self.modules.iter().enumerate().find_map(|(index, module)| {
            module
                .lessons
                .iter()
                .find(|lesson| lesson.id() == id)
                .map(|lesson| (index, lesson))
        })
    }

    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.modules.iter().find_map(|module| module.lessons.first())
    }

    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|module| module.lessons.iter())
    }
}
