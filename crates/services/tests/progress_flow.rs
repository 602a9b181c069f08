use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use lesson_core::model::{
    ExercisePayload, Hint, Lesson, LessonId, LessonProgress, Section, SectionContent, SectionId,
    SectionStatus, Solution,
};
use lesson_core::time::fixed_now;
use lesson_core::TransitionRejected;
use services::{Clock, LessonProgressService, Outcome};
use storage::repository::{
    InMemoryRepository, ProgressRecord, ProgressRepository, Storage, StorageError,
};

fn reading(id: &str) -> Section {
    Section::new(
        SectionId::new(id),
        id,
        SectionContent::Reading {
            body: format!("Notes for {id}"),
        },
    )
}

fn exercise(id: &str) -> Section {
    Section::new(
        SectionId::new(id),
        id,
        SectionContent::Exercise(ExercisePayload {
            instructions: "Return the indices of two numbers adding up to target.".into(),
            starter_code: "fn two_sum(nums: &[i32], target: i32) -> (usize, usize)".into(),
            hints: vec![Hint {
                text: "Remember what you have already seen.".into(),
                after_attempt: 2,
            }],
            solution: Some(Solution {
                code: "let mut seen = HashMap::new();".into(),
                explanation: Some("One pass with a map from value to index.".into()),
                after_attempt: 3,
            }),
            test_cases: Vec::new(),
            quiz_placement: None,
        }),
    )
}

fn three_required() -> Arc<Lesson> {
    Arc::new(
        Lesson::new(
            LessonId::new("two-sum"),
            "Two Sum",
            vec![reading("intro"), exercise("solve"), reading("review")],
        )
        .unwrap(),
    )
}

fn service_over(repo: Arc<dyn ProgressRepository>) -> LessonProgressService {
    LessonProgressService::new(Clock::fixed(fixed_now()), repo)
}

#[tokio::test]
async fn fresh_lesson_unlocks_only_the_first_section() {
    let service = service_over(Storage::in_memory().progress);
    let store = service.open_lesson(three_required()).await.unwrap();

    assert!(store.is_unlocked(0));
    assert!(!store.is_unlocked(1));
    assert!(!store.is_unlocked(2));
    assert_eq!(store.summary().rounded_percent(), 0);

    service
        .mark_completed(&store, &SectionId::new("intro"))
        .await
        .unwrap();
    assert!(store.is_unlocked(1));
    assert!(!store.is_unlocked(2));
    assert_eq!(store.summary().rounded_percent(), 33);
}

#[tokio::test]
async fn practice_only_section_does_not_gate_the_next() {
    let lesson = Arc::new(
        Lesson::new(
            LessonId::new("warmups"),
            "Warm-ups",
            vec![
                reading("intro"),
                exercise("optional").practice_only(),
                reading("next"),
            ],
        )
        .unwrap(),
    );
    let service = service_over(Storage::in_memory().progress);
    let store = service.open_lesson(lesson).await.unwrap();

    assert_eq!(store.section_progress(1).status, SectionStatus::NotStarted);
    assert!(store.is_unlocked(2));
    let nav = service.navigate(&store, 2).await.unwrap();
    assert!(nav.is_applied());
    assert_eq!(store.current_section_index(), 2);
}

#[tokio::test]
async fn attempts_reveal_hint_then_solution_and_completion_keeps_count() {
    let service = service_over(Storage::in_memory().progress);
    let store = service.open_lesson(three_required()).await.unwrap();
    let solve = SectionId::new("solve");
    service
        .mark_completed(&store, &SectionId::new("intro"))
        .await
        .unwrap();

    let payload = store.lesson().section(1).and_then(Section::exercise).unwrap().clone();
    let mut revealed = Vec::new();
    for _ in 0..3 {
        let entry = service
            .record_attempt(&store, &solve)
            .await
            .unwrap()
            .applied()
            .unwrap();
        revealed.push((
            payload.revealed_hints(entry.attempt_count).count(),
            payload.solution_revealed(entry.attempt_count),
        ));
    }
    assert_eq!(revealed, vec![(0, false), (1, false), (1, true)]);

    let entry = service
        .mark_completed(&store, &solve)
        .await
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(entry.status, SectionStatus::Completed);
    assert_eq!(entry.attempt_count, 3);
}

#[tokio::test]
async fn locked_targets_are_rejected_without_side_effects() {
    let repo = Arc::new(InMemoryRepository::new());
    let service = service_over(repo.clone());
    let store = service.open_lesson(three_required()).await.unwrap();
    let before = store.snapshot();

    let nav = service.navigate(&store, 1).await.unwrap();
    assert_eq!(nav, Outcome::Rejected(TransitionRejected::Locked(1)));
    let attempt = service
        .record_attempt(&store, &SectionId::new("review"))
        .await
        .unwrap();
    assert_eq!(attempt.rejection(), Some(&TransitionRejected::Locked(2)));
    let unknown = service
        .mark_completed(&store, &SectionId::new("missing"))
        .await
        .unwrap();
    assert!(!unknown.is_applied());

    assert_eq!(store.snapshot(), before);
    assert!(repo.list_lessons().await.unwrap().is_empty());
}

#[tokio::test]
async fn every_surface_sees_the_latest_state() {
    let service = service_over(Storage::in_memory().progress);
    let store = service.open_lesson(three_required()).await.unwrap();
    let course_sidebar = store.clone();
    let lesson_sidebar = store.clone();
    let mut updates = store.subscribe();

    service
        .mark_completed(&course_sidebar, &SectionId::new("intro"))
        .await
        .unwrap();

    assert!(updates.has_changed().unwrap());
    let seen = updates.borrow_and_update().clone();
    assert_eq!(seen.status_of(&SectionId::new("intro")), SectionStatus::Completed);
    assert!(lesson_sidebar.is_unlocked(1));
    assert_eq!(lesson_sidebar.summary(), course_sidebar.summary());
}

#[tokio::test]
async fn progress_survives_reopening_the_lesson() {
    let storage = Storage::sqlite("sqlite:file:memdb_flow_reopen?mode=memory&cache=shared")
        .await
        .unwrap();
    let service = service_over(Arc::clone(&storage.progress));

    let store = service.open_lesson(three_required()).await.unwrap();
    service
        .mark_completed(&store, &SectionId::new("intro"))
        .await
        .unwrap();
    service
        .record_attempt(&store, &SectionId::new("solve"))
        .await
        .unwrap();
    service.navigate(&store, 1).await.unwrap();
    drop(store);

    let reopened = service.open_lesson(three_required()).await.unwrap();
    assert_eq!(reopened.current_section_index(), 1);
    assert_eq!(reopened.section_progress(1).attempt_count, 1);
    assert_eq!(reopened.section_progress(1).status, SectionStatus::InProgress);
    assert_eq!(reopened.summary().completed, 1);
}

/// Hands back the same record for every lesson key, like a store written by an
/// older catalog where keys and payloads drifted apart.
struct MislabeledRepository {
    record: ProgressRecord,
    saved: Mutex<Vec<LessonProgress>>,
}

#[async_trait]
impl ProgressRepository for MislabeledRepository {
    async fn load_progress(
        &self,
        _lesson_id: &LessonId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(Some(self.record.clone()))
    }

    async fn save_progress(
        &self,
        progress: &LessonProgress,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.saved.lock().unwrap().push(progress.clone());
        Ok(())
    }

    async fn delete_progress(&self, _lesson_id: &LessonId) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list_lessons(&self) -> Result<Vec<LessonId>, StorageError> {
        Ok(vec![self.record.lesson_id().clone()])
    }

    async fn reset_all(&self) -> Result<u64, StorageError> {
        Ok(0)
    }
}

#[tokio::test]
async fn progress_for_another_lesson_starts_fresh() {
    let other = Lesson::new(
        LessonId::new("three-sum"),
        "Three Sum",
        vec![reading("intro"), reading("sort")],
    )
    .unwrap();
    let mut foreign = LessonProgress::for_lesson(&other);
    lesson_core::mark_completed(&other, &mut foreign, &SectionId::new("intro")).unwrap();

    let repo = Arc::new(MislabeledRepository {
        record: ProgressRecord {
            progress: foreign,
            updated_at: fixed_now(),
        },
        saved: Mutex::new(Vec::new()),
    });
    let service = service_over(repo.clone());
    let store = service.open_lesson(three_required()).await.unwrap();

    assert_eq!(store.summary().completed, 0);
    assert!(!store.is_unlocked(1));
    let saved = repo.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].lesson_id(), &LessonId::new("two-sum"));
}

#[tokio::test]
async fn sqlite_row_holding_another_lessons_progress_starts_fresh() {
    let url = "sqlite:file:memdb_flow_mislabeled?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.unwrap();
    let other = Lesson::new(
        LessonId::new("three-sum"),
        "Three Sum",
        vec![reading("intro"), reading("sort")],
    )
    .unwrap();
    let mut foreign = LessonProgress::for_lesson(&other);
    lesson_core::mark_completed(&other, &mut foreign, &SectionId::new("intro")).unwrap();

    let pool = sqlx::SqlitePool::connect(url).await.unwrap();
    sqlx::query("INSERT INTO lesson_progress (lesson_id, payload, updated_at) VALUES (?1, ?2, ?3)")
        .bind("two-sum")
        .bind(ProgressRecord::encode(&foreign).unwrap())
        .bind(fixed_now())
        .execute(&pool)
        .await
        .unwrap();

    let service = service_over(Arc::clone(&storage.progress));
    let store = service.open_lesson(three_required()).await.unwrap();
    assert_eq!(store.summary().completed, 0);
    assert_eq!(store.current_section_index(), 0);

    let saved = storage
        .progress
        .load_progress(&LessonId::new("two-sum"))
        .await
        .unwrap()
        .expect("fresh progress saved");
    assert_eq!(saved.lesson_id(), &LessonId::new("two-sum"));
}

#[tokio::test]
async fn cursor_pointing_at_a_locked_section_is_pulled_back() {
    let repo = Arc::new(InMemoryRepository::new());
    let lesson = three_required();

    let raw = r#"{
        "lesson_id": "two-sum",
        "sections_progress": {
            "intro": {"status": "completed", "attempt_count": 0},
            "deleted-section": {"status": "completed", "attempt_count": 4}
        },
        "current_section_index": 2
    }"#;
    let persisted: LessonProgress = serde_json::from_str(raw).unwrap();
    repo.save_progress(&persisted, fixed_now()).await.unwrap();

    let service = service_over(repo.clone());
    let store = service.open_lesson(lesson).await.unwrap();
    assert_eq!(store.current_section_index(), 1);
    assert_eq!(store.summary().completed, 1);

    let saved = repo
        .load_progress(&LessonId::new("two-sum"))
        .await
        .unwrap()
        .expect("repaired progress saved");
    assert_eq!(saved.progress.current_section_index(), 1);
    assert_eq!(saved.progress.orphaned_entries(store.lesson()).count(), 1);
}

#[tokio::test]
async fn reset_wipes_storage_and_the_open_store() {
    let repo = Arc::new(InMemoryRepository::new());
    let service = service_over(repo.clone());
    let store = service.open_lesson(three_required()).await.unwrap();
    service
        .mark_completed(&store, &SectionId::new("intro"))
        .await
        .unwrap();

    let removed = service.reset_all(Some(&store)).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.summary().completed, 0);
    assert!(!store.is_unlocked(1));
    assert!(repo.list_lessons().await.unwrap().is_empty());
}
