use std::sync::Arc;

use lesson_core::model::{Course, Lesson, LessonId};
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::progress::{LessonProgressService, ProgressStore};
use crate::Clock;

/// Assembles app-facing services around one course catalog.
#[derive(Clone)]
pub struct AppServices {
    course: Arc<Course>,
    progress: Arc<LessonProgressService>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("course", &self.course)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        course: Course,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock, course)
    }

    /// Build services over ephemeral in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::EmptyCatalog` if the course has no lessons.
    pub fn in_memory(clock: Clock, course: Course) -> Result<Self, AppServicesError> {
        Self::from_storage(&Storage::in_memory(), clock, course)
    }

    /// Build services over an already assembled `Storage`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::EmptyCatalog` if the course has no lessons.
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        course: Course,
    ) -> Result<Self, AppServicesError> {
        if course.first_lesson().is_none() {
            return Err(AppServicesError::EmptyCatalog);
        }
        let progress = Arc::new(LessonProgressService::new(
            clock,
            Arc::clone(&storage.progress),
        ));
        Ok(Self {
            course: Arc::new(course),
            progress,
        })
    }

    #[must_use]
    pub fn course(&self) -> Arc<Course> {
        Arc::clone(&self.course)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<LessonProgressService> {
        Arc::clone(&self.progress)
    }

    /// Pick the requested lesson, or the first lesson of the course when none is given.
    ///
    /// Returns the lesson together with the index of the module that holds it.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::UnknownLesson` if the id is not in the catalog.
    pub fn resolve_lesson(
        &self,
        preferred: Option<&LessonId>,
    ) -> Result<(usize, Arc<Lesson>), AppServicesError> {
        let found = match preferred {
            Some(id) => self
                .course
                .find_lesson(id)
                .ok_or_else(|| AppServicesError::UnknownLesson(id.clone()))?,
            None => self
                .course
                .modules()
                .iter()
                .enumerate()
                .find_map(|(index, module)| module.lessons().first().map(|l| (index, l)))
                .ok_or(AppServicesError::EmptyCatalog)?,
        };
        Ok((found.0, Arc::new(found.1.clone())))
    }

    /// Resolve a lesson and open its shared progress store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the lesson is unknown or progress cannot be loaded.
    pub async fn open_lesson(
        &self,
        preferred: Option<&LessonId>,
    ) -> Result<(usize, ProgressStore), AppServicesError> {
        let (module_index, lesson) = self.resolve_lesson(preferred)?;
        let store = self.progress.open_lesson(lesson).await?;
        Ok((module_index, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_course;

    fn course() -> Course {
        parse_course(
            r#"{"modules":[
                {"id":"empty","title":"Soon","lessons":[]},
                {"id":"graphs","title":"Graphs","lessons":[
                    {"id":"bfs","title":"BFS","sections":[{"id":"q","title":"Queue","kind":"reading","body":""}]},
                    {"id":"dfs","title":"DFS","sections":[{"id":"s","title":"Stack","kind":"reading","body":""}]}
                ]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_to_first_lesson_of_first_non_empty_module() {
        let services = AppServices::in_memory(Clock::default(), course()).unwrap();
        let (module, lesson) = services.resolve_lesson(None).unwrap();
        assert_eq!(module, 1);
        assert_eq!(lesson.id(), &LessonId::new("bfs"));
    }

    #[test]
    fn unknown_lesson_is_reported() {
        let services = AppServices::in_memory(Clock::default(), course()).unwrap();
        let err = services
            .resolve_lesson(Some(&LessonId::new("dijkstra")))
            .unwrap_err();
        assert!(matches!(err, AppServicesError::UnknownLesson(_)));
    }

    #[test]
    fn empty_catalog_is_refused() {
        let err = AppServices::in_memory(Clock::default(), Course::default()).unwrap_err();
        assert!(matches!(err, AppServicesError::EmptyCatalog));
    }
}
