use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use literacy_core::flow::{ActivityStep, QuizAnswer};
use literacy_core::model::{
    ActivityId, Avatar, Child, Letter, MasteryLevel, ProgressId, ProgressRecord, Track,
};
use literacy_core::time::fixed_now;
use services::{ActivityServiceError, AppServices, Clock, LiteracyConfig};
use storage::repository::{
    CompletionPersistence, InMemoryRepository, ProgressRepository, Storage, StorageError,
};

fn config() -> LiteracyConfig {
    LiteracyConfig {
        database_url: "sqlite::memory:".into(),
        advance_delay: Duration::from_millis(1500),
    }
}

async fn app() -> AppServices {
    AppServices::in_memory(&config(), Clock::fixed(fixed_now()))
        .await
        .expect("services")
}

#[tokio::test(start_paused = true)]
async fn letter_a_flow_credits_child_and_reports_progress() {
    let app = app().await;
    let emma = app
        .children()
        .create_child("Emma", 6, Avatar::Fox)
        .await
        .unwrap();
    let activity = ActivityId::new("letter_a").unwrap();

    let controller = app
        .activities()
        .start_activity(&emma, &activity)
        .await
        .unwrap();
    assert_eq!(controller.current_step(), ActivityStep::Introduction);
    assert_eq!(controller.score(), 0);

    for _ in 0..3 {
        controller.advance();
    }
    let options = controller.quiz_options();
    assert_eq!(options.len(), 4);
    assert!(options.iter().any(|o| o.word == "Apple" && o.is_correct));
    assert!(options.iter().any(|o| o.word == "Ant" && o.is_correct));

    assert_eq!(controller.submit_quiz_answer("Apple"), QuizAnswer::Correct);
    assert_eq!(controller.score(), 1);
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert_eq!(controller.step_index(), 4);

    let receipt = app
        .activities()
        .finish(&controller, emma.id(), &activity)
        .await
        .unwrap();
    assert_eq!(receipt.total_points, 25);
    assert_eq!(receipt.daily_streak, 1);

    let report = app.reports().child_report(emma.id(), 10).await.unwrap();
    assert_eq!(report.child.total_points(), 25);
    assert_eq!(report.total_activities, 1);
    assert_eq!(report.average_score, 100);
    assert_eq!(report.mastery.mastered, 1);
    assert_eq!(report.recent[0].record.mastery(), MasteryLevel::Mastered);
    assert_eq!(report.recent[0].record.activity_id(), &activity);

    let err = app
        .activities()
        .finish(&controller, emma.id(), &activity)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivityServiceError::AlreadyCompleted));
}

#[tokio::test(start_paused = true)]
async fn restart_before_auto_advance_keeps_new_session_in_place() {
    let app = app().await;
    let controller = app.activities().start(Letter::from('B'), "Alex");

    for _ in 0..3 {
        controller.advance();
    }
    controller.submit_quiz_answer("Ball");
    tokio::time::sleep(Duration::from_millis(500)).await;
    controller.restart();

    assert_eq!(controller.current_step(), ActivityStep::Introduction);
    assert_eq!(controller.score(), 0);
    assert_eq!(controller.letter(), Letter::from('B'));

    tokio::time::sleep(Duration::from_millis(3000)).await;
    assert_eq!(controller.current_step(), ActivityStep::Introduction);
    assert!(controller.complete().is_none());
}

#[tokio::test]
async fn unknown_letter_uses_default_words() {
    let app = app().await;
    let controller = app.activities().start(Letter::from('Z'), "Leo");
    assert_eq!(controller.letter(), Letter::from('Z'));
    assert_eq!(controller.example_words(), vec!["Apple", "Ant", "Airplane"]);
}

#[tokio::test]
async fn home_screen_follows_child_track() {
    let app = app().await;
    let alex = app
        .children()
        .create_child("Alex", 4, Avatar::Owl)
        .await
        .unwrap();
    assert_eq!(alex.track(), Track::EarlyAlphabetic);

    let activities = app
        .catalog()
        .activities_for_track(alex.track())
        .await
        .unwrap();
    let ids: Vec<&str> = activities.iter().map(|a| a.id().as_str()).collect();
    assert_eq!(ids, vec!["letter_a", "letter_b", "letter_c"]);

    let overview = app.reports().overview(fixed_now().date_naive()).await.unwrap();
    assert_eq!(overview.children, 1);
    assert_eq!(overview.active_learners, 0);
}

/// Rejects the first completion write, then behaves normally.
struct FirstWriteFails {
    inner: InMemoryRepository,
    failed: AtomicBool,
}

#[async_trait]
impl CompletionPersistence for FirstWriteFails {
    async fn record_completion(
        &self,
        child: &Child,
        record: &ProgressRecord,
    ) -> Result<ProgressId, StorageError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::Connection("database is locked".into()));
        }
        self.inner.record_completion(child, record).await
    }
}

#[tokio::test(start_paused = true)]
async fn retried_finish_credits_the_session_once() {
    let repo = InMemoryRepository::new();
    let storage = Storage {
        children: Arc::new(repo.clone()),
        activities: Arc::new(repo.clone()),
        progress: Arc::new(repo.clone()),
        completions: Arc::new(FirstWriteFails {
            inner: repo.clone(),
            failed: AtomicBool::new(false),
        }),
    };
    let app = AppServices::from_storage(storage, &config(), Clock::fixed(fixed_now()))
        .await
        .unwrap();
    let emma = app
        .children()
        .create_child("Emma", 6, Avatar::Fox)
        .await
        .unwrap();
    let activity = ActivityId::new("letter_a").unwrap();
    let controller = app
        .activities()
        .start_activity(&emma, &activity)
        .await
        .unwrap();
    for _ in 0..4 {
        controller.advance();
    }

    let err = app
        .activities()
        .finish(&controller, emma.id(), &activity)
        .await
        .unwrap_err();
    assert!(matches!(err, ActivityServiceError::Completion(_)));

    let receipt = app
        .activities()
        .finish(&controller, emma.id(), &activity)
        .await
        .unwrap();
    assert_eq!(receipt.total_points, 25);

    let stored = app.children().get_child(emma.id()).await.unwrap().unwrap();
    assert_eq!(stored.total_points(), 25);
    let history = repo.list_progress_for_child(emma.id(), 10).await.unwrap();
    assert_eq!(history.len(), 1);
}
