use std::sync::Arc;

use lesson_core::model::{Lesson, LessonProgress, SectionId, SectionProgress};
use lesson_core::{Navigated, TransitionRejected};
use storage::repository::ProgressRepository;

use super::store::ProgressStore;
use crate::error::ProgressServiceError;
use crate::Clock;

/// What happened to a requested transition.
///
/// A rejection is an ordinary result: nothing changed and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Rejected(TransitionRejected),
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&TransitionRejected> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

/// Opens lessons and applies learner actions, persisting every accepted change.
#[derive(Clone)]
pub struct LessonProgressService {
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
}

impl LessonProgressService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, repo }
    }

    /// Load the learner's progress for `lesson` and wrap it in a shared store.
    ///
    /// Progress stored for a different lesson is discarded for a fresh start,
    /// and a cursor that points at a locked section is pulled back. Repairs are
    /// written back immediately.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if loading or saving fails.
    pub async fn open_lesson(
        &self,
        lesson: Arc<Lesson>,
    ) -> Result<ProgressStore, ProgressServiceError> {
        let stored = self.repo.load_progress(lesson.id()).await?;

        let progress = match stored {
            None => LessonProgress::for_lesson(&lesson),
            Some(record) => {
                let loaded = record.progress;
                if !loaded.belongs_to(&lesson) {
                    tracing::warn!(
                        lesson = %lesson.id(),
                        stored = %loaded.lesson_id(),
                        "discarding progress recorded for another lesson"
                    );
                }
                let orphaned = loaded.orphaned_entries(&lesson).count();
                if orphaned > 0 {
                    tracing::warn!(
                        lesson = %lesson.id(),
                        orphaned,
                        "progress has entries for sections no longer in the lesson"
                    );
                }

                let reconciled = lesson_core::reconcile(&lesson, loaded.clone());
                if reconciled != loaded {
                    self.repo.save_progress(&reconciled, self.clock.now()).await?;
                    tracing::debug!(lesson = %lesson.id(), "repaired progress saved");
                }
                reconciled
            }
        };

        let store = ProgressStore::new(lesson, progress);
        let summary = store.summary();
        tracing::info!(
            lesson = %store.lesson().id(),
            completed = summary.completed,
            total = summary.total,
            current = store.current_section_index(),
            "lesson opened"
        );
        Ok(store)
    }

    /// Count an attempt on a section.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the accepted change cannot be saved.
    pub async fn record_attempt(
        &self,
        store: &ProgressStore,
        section_id: &SectionId,
    ) -> Result<Outcome<SectionProgress>, ProgressServiceError> {
        self.commit(store, "record_attempt", |lesson, progress| {
            lesson_core::record_attempt(lesson, progress, section_id)
        })
        .await
    }

    /// Mark a section completed. Completing an already completed section is
    /// applied without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the accepted change cannot be saved.
    pub async fn mark_completed(
        &self,
        store: &ProgressStore,
        section_id: &SectionId,
    ) -> Result<Outcome<SectionProgress>, ProgressServiceError> {
        let _writer = store.lock_writer().await;
        let result = store.apply(|lesson, progress| {
            lesson_core::mark_completed(lesson, progress, section_id)
        });
        let (entry, changed) = match result {
            Ok(applied) => applied,
            Err(reason) => return Ok(reject(store, "mark_completed", reason)),
        };

        if changed {
            self.persist(store).await?;
            let summary = store.summary();
            tracing::debug!(
                lesson = %store.lesson().id(),
                section = %section_id,
                completed = summary.completed,
                total = summary.total,
                "section completed"
            );
            if summary.is_complete() {
                tracing::info!(lesson = %store.lesson().id(), "lesson completed");
            }
        }
        Ok(Outcome::Applied(entry))
    }

    /// Move the learner's cursor to `index`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the accepted change cannot be saved.
    pub async fn navigate(
        &self,
        store: &ProgressStore,
        index: usize,
    ) -> Result<Outcome<Navigated>, ProgressServiceError> {
        self.commit(store, "navigate", |lesson, progress| {
            lesson_core::navigate(lesson, progress, index)
        })
        .await
    }

    /// Wipe stored progress for every lesson. An open store, if given, is
    /// restarted so its readers see the reset.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the wipe fails.
    pub async fn reset_all(
        &self,
        open: Option<&ProgressStore>,
    ) -> Result<u64, ProgressServiceError> {
        let _writer = match open {
            Some(store) => Some(store.lock_writer().await),
            None => None,
        };
        let removed = self.repo.reset_all().await?;
        if let Some(store) = open {
            store.restart();
        }
        tracing::info!(removed, "all lesson progress reset");
        Ok(removed)
    }

    async fn commit<T>(
        &self,
        store: &ProgressStore,
        action: &'static str,
        transition: impl FnOnce(&Lesson, &mut LessonProgress) -> Result<T, TransitionRejected>,
    ) -> Result<Outcome<T>, ProgressServiceError> {
        let _writer = store.lock_writer().await;
        match store.apply(transition) {
            Ok(value) => {
                self.persist(store).await?;
                tracing::debug!(lesson = %store.lesson().id(), action, "transition applied");
                Ok(Outcome::Applied(value))
            }
            Err(reason) => Ok(reject(store, action, reason)),
        }
    }

    async fn persist(&self, store: &ProgressStore) -> Result<(), ProgressServiceError> {
        let snapshot = store.snapshot();
        self.repo.save_progress(&snapshot, self.clock.now()).await?;
        Ok(())
    }
}

fn reject<T>(store: &ProgressStore, action: &'static str, reason: TransitionRejected) -> Outcome<T> {
    tracing::debug!(
        lesson = %store.lesson().id(),
        action,
        %reason,
        "transition rejected"
    );
    Outcome::Rejected(reason)
}
