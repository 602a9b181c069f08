use std::collections::BTreeSet;
use std::sync::Arc;

use lesson_core::model::{Course, Lesson, LessonId, SectionId, SectionProgress};
use lesson_core::{Navigated, TransitionRejected};
use services::{AppServices, AppServicesError, LessonProgressService, Outcome, ProgressStore};
use thiserror::Error;

use crate::vm::{
    CourseSidebarVm, ExerciseVm, LessonSidebarVm, map_course_sidebar, map_exercise,
    map_lesson_sidebar,
};

/// Failure surfaced to a view. Details are logged where they happen.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ViewError {
    #[error("that lesson is not in the course")]
    UnknownLesson,
    #[error("progress could not be loaded or saved")]
    Storage,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::UnknownLesson => "That lesson does not exist.",
            Self::Storage => "Something went wrong. Please try again.",
        }
    }
}

impl From<AppServicesError> for ViewError {
    fn from(err: AppServicesError) -> Self {
        match err {
            AppServicesError::UnknownLesson(id) => {
                tracing::warn!(lesson = %id, "requested lesson not found");
                Self::UnknownLesson
            }
            other => {
                tracing::error!(error = %other, "lesson services failed");
                Self::Storage
            }
        }
    }
}

impl From<services::ProgressServiceError> for ViewError {
    fn from(err: services::ProgressServiceError) -> Self {
        tracing::error!(error = %err, "progress service failed");
        Self::Storage
    }
}

/// Which course modules are expanded in the sidebar.
///
/// Owned by the presentation layer and passed into the course sidebar; the
/// engine never sees it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SidebarUiState {
    expanded: BTreeSet<usize>,
}

impl SidebarUiState {
    #[must_use]
    pub fn is_expanded(&self, module: usize) -> bool {
        self.expanded.contains(&module)
    }

    pub fn expand(&mut self, module: usize) {
        self.expanded.insert(module);
    }

    /// Flip a module open or closed. Returns the new expansion state.
    pub fn toggle(&mut self, module: usize) -> bool {
        if self.expanded.remove(&module) {
            false
        } else {
            self.expanded.insert(module);
            true
        }
    }
}

/// A navigation request coming back from a rendering surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationIntent {
    SelectSection(usize),
    SelectModule(usize),
    ToggleModule(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentOutcome {
    Navigated(Navigated),
    Rejected(TransitionRejected),
    ModuleSelected {
        index: usize,
        opened: Option<LessonId>,
    },
    ModuleToggled {
        index: usize,
        expanded: bool,
    },
    /// The intent named a module that does not exist.
    Ignored,
}

/// Application-level state shared by every navigation surface.
///
/// Holds the open lesson's [`ProgressStore`], so the course sidebar, the
/// lesson sidebar and the exercise panel all read one progress value.
pub struct AppState {
    course: Arc<Course>,
    progress: Arc<LessonProgressService>,
    store: ProgressStore,
    active_module: usize,
    sidebar: SidebarUiState,
}

impl AppState {
    /// Open `preferred`, or the first lesson of the course, and expand its module.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::UnknownLesson` for an id outside the course, and
    /// `ViewError::Storage` if stored progress cannot be read.
    pub async fn open(
        services: &AppServices,
        preferred: Option<&LessonId>,
    ) -> Result<Self, ViewError> {
        let (active_module, store) = services.open_lesson(preferred).await?;
        let mut sidebar = SidebarUiState::default();
        sidebar.expand(active_module);
        Ok(Self {
            course: services.course(),
            progress: services.progress(),
            store,
            active_module,
            sidebar,
        })
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    /// Handle onto the open lesson's progress; clones share the same state.
    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        self.store.lesson()
    }

    #[must_use]
    pub fn active_module(&self) -> usize {
        self.active_module
    }

    #[must_use]
    pub fn sidebar(&self) -> &SidebarUiState {
        &self.sidebar
    }

    #[must_use]
    pub fn lesson_sidebar(&self) -> LessonSidebarVm {
        map_lesson_sidebar(&self.store)
    }

    #[must_use]
    pub fn course_sidebar(&self) -> CourseSidebarVm {
        map_course_sidebar(&self.course, self.active_module, &self.sidebar, &self.store)
    }

    #[must_use]
    pub fn exercise(&self, index: usize) -> Option<ExerciseVm> {
        map_exercise(&self.store, index)
    }

    /// Apply a navigation intent.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Storage` if an accepted change cannot be saved.
    pub async fn apply(&mut self, intent: NavigationIntent) -> Result<IntentOutcome, ViewError> {
        match intent {
            NavigationIntent::SelectSection(index) => {
                let outcome = self.progress.navigate(&self.store, index).await?;
                Ok(match outcome {
                    Outcome::Applied(navigated) => IntentOutcome::Navigated(navigated),
                    Outcome::Rejected(reason) => IntentOutcome::Rejected(reason),
                })
            }
            NavigationIntent::SelectModule(index) => self.select_module(index).await,
            NavigationIntent::ToggleModule(index) => {
                if self.course.module(index).is_none() {
                    return Ok(IntentOutcome::Ignored);
                }
                let expanded = self.sidebar.toggle(index);
                Ok(IntentOutcome::ModuleToggled { index, expanded })
            }
        }
    }

    async fn select_module(&mut self, index: usize) -> Result<IntentOutcome, ViewError> {
        let Some(module) = self.course.module(index) else {
            return Ok(IntentOutcome::Ignored);
        };

        let open_id = self.store.lesson().id();
        let holds_open = module.lessons().iter().any(|lesson| lesson.id() == open_id);
        let first = module.lessons().first().filter(|_| !holds_open).cloned();

        // Nothing changes until the new lesson is open.
        let opened = match first {
            Some(first) => {
                let id = first.id().clone();
                self.store = self.progress.open_lesson(Arc::new(first)).await?;
                Some(id)
            }
            None => None,
        };
        self.active_module = index;
        self.sidebar.expand(index);
        Ok(IntentOutcome::ModuleSelected { index, opened })
    }

    /// # Errors
    ///
    /// Returns `ViewError::Storage` if the attempt cannot be saved.
    pub async fn record_attempt(
        &self,
        section_id: &SectionId,
    ) -> Result<Outcome<SectionProgress>, ViewError> {
        Ok(self.progress.record_attempt(&self.store, section_id).await?)
    }

    /// # Errors
    ///
    /// Returns `ViewError::Storage` if the completion cannot be saved.
    pub async fn mark_completed(
        &self,
        section_id: &SectionId,
    ) -> Result<Outcome<SectionProgress>, ViewError> {
        Ok(self.progress.mark_completed(&self.store, section_id).await?)
    }

    /// Wipe all stored progress and restart the open lesson.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Storage` if the wipe fails.
    pub async fn reset_all(&self) -> Result<u64, ViewError> {
        Ok(self.progress.reset_all(Some(&self.store)).await?)
    }
}
