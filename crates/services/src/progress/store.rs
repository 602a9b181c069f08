use std::fmt;
use std::sync::Arc;

use lesson_core::model::{Lesson, LessonProgress, SectionProgress};
use lesson_core::{ProgressSummary, TransitionRejected};
use tokio::sync::{Mutex, MutexGuard, watch};

/// Single source of truth for one lesson's progress.
///
/// Cloning the store hands out another handle to the same state; every
/// navigation surface reads through its own handle and always sees the value
/// left by the latest applied mutation. Writes go through [`ProgressStore::apply`]
/// and are serialized by a writer lock held by the service while it persists.
#[derive(Clone)]
pub struct ProgressStore {
    lesson: Arc<Lesson>,
    state: Arc<watch::Sender<LessonProgress>>,
    writer: Arc<Mutex<()>>,
}

impl ProgressStore {
    /// Wrap progress for `lesson`. Callers pass progress already reconciled
    /// against the lesson.
    #[must_use]
    pub fn new(lesson: Arc<Lesson>, progress: LessonProgress) -> Self {
        let (state, _) = watch::channel(progress);
        Self {
            lesson,
            state: Arc::new(state),
            writer: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    /// Owned copy of the current progress.
    #[must_use]
    pub fn snapshot(&self) -> LessonProgress {
        self.state.borrow().clone()
    }

    /// Run `f` against the current progress without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&Lesson, &LessonProgress) -> R) -> R {
        let progress = self.state.borrow();
        f(&self.lesson, &progress)
    }

    /// Receiver notified after every applied mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LessonProgress> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn current_section_index(&self) -> usize {
        self.state.borrow().current_section_index()
    }

    #[must_use]
    pub fn section_progress(&self, index: usize) -> SectionProgress {
        self.read(|lesson, progress| {
            lesson
                .section(index)
                .map(|section| progress.section_progress(&section.id))
                .unwrap_or_default()
        })
    }

    #[must_use]
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.read(|lesson, progress| lesson_core::is_index_unlocked(index, progress, lesson))
    }

    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        self.read(|lesson, progress| lesson_core::summarize(lesson, progress))
    }

    pub(crate) async fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Apply one transition to a working copy and publish it only when it is
    /// accepted. A rejected transition leaves the state untouched and wakes no
    /// subscriber. Writers hold the writer lock around this call.
    pub(crate) fn apply<T>(
        &self,
        transition: impl FnOnce(&Lesson, &mut LessonProgress) -> Result<T, TransitionRejected>,
    ) -> Result<T, TransitionRejected> {
        let mut next = self.snapshot();
        let value = transition(&self.lesson, &mut next)?;
        self.state.send_replace(next);
        Ok(value)
    }

    /// Replace the state with fresh progress, as after a global reset.
    pub(crate) fn restart(&self) {
        self.state
            .send_replace(LessonProgress::for_lesson(&self.lesson));
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = self.state.borrow();
        f.debug_struct("ProgressStore")
            .field("lesson_id", self.lesson.id())
            .field("current_section_index", &progress.current_section_index())
            .field("receivers", &self.state.receiver_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{LessonId, Section, SectionContent, SectionId};

    fn store() -> ProgressStore {
        let lesson = Lesson::new(
            LessonId::new("stack"),
            "Stack",
            vec![
                Section::new(
                    SectionId::new("push"),
                    "Push",
                    SectionContent::Reading { body: String::new() },
                ),
                Section::new(
                    SectionId::new("pop"),
                    "Pop",
                    SectionContent::Reading { body: String::new() },
                ),
            ],
        )
        .unwrap();
        let progress = LessonProgress::for_lesson(&lesson);
        ProgressStore::new(Arc::new(lesson), progress)
    }

    #[test]
    fn clones_share_one_state() {
        let sidebar = store();
        let lesson_panel = sidebar.clone();

        sidebar
            .apply(|lesson, progress| {
                lesson_core::mark_completed(lesson, progress, &SectionId::new("push"))
            })
            .unwrap();

        assert!(lesson_panel.is_unlocked(1));
        assert_eq!(lesson_panel.summary().completed, 1);
    }

    #[test]
    fn rejected_transition_does_not_notify() {
        let store = store();
        let rx = store.subscribe();

        let rejected = store.apply(|lesson, progress| lesson_core::navigate(lesson, progress, 1));
        assert!(rejected.is_err());
        assert!(!rx.has_changed().unwrap());

        store
            .apply(|lesson, progress| {
                lesson_core::mark_completed(lesson, progress, &SectionId::new("push"))
            })
            .unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn restart_wipes_progress() {
        let store = store();
        store
            .apply(|lesson, progress| {
                lesson_core::mark_completed(lesson, progress, &SectionId::new("push"))
            })
            .unwrap();
        store.restart();
        assert_eq!(store.section_progress(0), SectionProgress::default());
    }
}
