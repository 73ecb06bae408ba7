use std::sync::Arc;

use async_trait::async_trait;
use literacy_core::flow::ActivityCompletion;
use literacy_core::model::{ActivityId, ChildId, ProgressId, ProgressRecord};
use storage::repository::{ChildRepository, CompletionPersistence, StorageError};

use crate::Clock;
use crate::error::CompletionError;

/// What the sink reports back after crediting a finished activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReceipt {
    pub progress_id: ProgressId,
    pub total_points: u32,
    pub current_level: u32,
    pub daily_streak: u32,
    pub leveled_up: bool,
}

/// Receives finished activities.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    /// Credit `completion` to the child and record it.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` if the child is unknown or persistence fails.
    async fn notify_activity_complete(
        &self,
        child_id: ChildId,
        activity_id: &ActivityId,
        completion: &ActivityCompletion,
    ) -> Result<CompletionReceipt, CompletionError>;
}

/// Sink that updates the child's rewards and appends a progress record.
///
/// Both writes go through `CompletionPersistence` in one unit, so a failed
/// call leaves the child untouched and is safe to retry.
#[derive(Clone)]
pub struct ProgressCompletionSink {
    clock: Clock,
    children: Arc<dyn ChildRepository>,
    completions: Arc<dyn CompletionPersistence>,
}

impl ProgressCompletionSink {
    #[must_use]
    pub fn new(
        clock: Clock,
        children: Arc<dyn ChildRepository>,
        completions: Arc<dyn CompletionPersistence>,
    ) -> Self {
        Self {
            clock,
            children,
            completions,
        }
    }
}

#[async_trait]
impl CompletionSink for ProgressCompletionSink {
    async fn notify_activity_complete(
        &self,
        child_id: ChildId,
        activity_id: &ActivityId,
        completion: &ActivityCompletion,
    ) -> Result<CompletionReceipt, CompletionError> {
        let mut child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or(CompletionError::ChildNotFound(child_id))?;

        let record = ProgressRecord::new(
            child_id,
            activity_id.clone(),
            completion.completed_at,
            completion.score_percent(),
            completion.elapsed_secs(),
            completion.attempts,
            completion.mastery(),
        )?;

        let award = child.award_points(completion.points_awarded, self.clock.today());
        let progress_id = self
            .completions
            .record_completion(&child, &record)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => CompletionError::ChildNotFound(child_id),
                other => other.into(),
            })?;

        tracing::info!(
            child_id = child_id.value(),
            activity = %activity_id,
            points = award.points_awarded,
            total_points = award.total_points,
            level = award.current_level,
            streak = award.daily_streak,
            "activity completion recorded"
        );

        Ok(CompletionReceipt {
            progress_id,
            total_points: award.total_points,
            current_level: award.current_level,
            daily_streak: award.daily_streak,
            leveled_up: award.leveled_up,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeDelta};
    use literacy_core::flow::{COMPLETION_REWARD_POINTS, QUIZ_ROUNDS, SessionId};
    use literacy_core::model::{Avatar, Child, Letter, MasteryLevel};
    use literacy_core::time::fixed_now;
    use std::sync::atomic::{AtomicBool, Ordering};
    use storage::repository::{InMemoryRepository, NewChildRecord, ProgressRepository};

    /// Fails the next write once, then delegates.
    struct FailOnce {
        inner: InMemoryRepository,
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl CompletionPersistence for FailOnce {
        async fn record_completion(
            &self,
            child: &Child,
            record: &ProgressRecord,
        ) -> Result<ProgressId, StorageError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(StorageError::Connection("disk full".into()));
            }
            self.inner.record_completion(child, record).await
        }
    }

    fn completion(score: u32) -> ActivityCompletion {
        ActivityCompletion {
            session_id: SessionId::random(),
            letter: Letter::from('A'),
            points_awarded: COMPLETION_REWARD_POINTS,
            score,
            quiz_rounds: QUIZ_ROUNDS,
            attempts: 1,
            elapsed: TimeDelta::seconds(95),
            completed_at: fixed_now(),
        }
    }

    async fn setup() -> (InMemoryRepository, ChildId) {
        let repo = InMemoryRepository::new();
        let child = Child::new(ChildId::new(0), "Emma", 6, Avatar::Cat, fixed_now()).unwrap();
        let id = repo
            .insert_new_child(NewChildRecord::from_child(&child))
            .await
            .unwrap();
        (repo, id)
    }

    fn sink(repo: &InMemoryRepository, clock: Clock) -> ProgressCompletionSink {
        ProgressCompletionSink::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn credits_points_and_records_progress() {
        let (repo, child_id) = setup().await;
        let sink = sink(&repo, Clock::fixed(fixed_now()));
        let activity = ActivityId::new("letter_a").unwrap();

        let receipt = sink
            .notify_activity_complete(child_id, &activity, &completion(1))
            .await
            .unwrap();
        assert_eq!(receipt.total_points, 25);
        assert_eq!(receipt.current_level, 1);
        assert_eq!(receipt.daily_streak, 1);
        assert!(!receipt.leveled_up);

        let record = repo.get_progress(receipt.progress_id).await.unwrap();
        assert_eq!(record.score_percent(), 100);
        assert_eq!(record.mastery(), MasteryLevel::Mastered);
        assert_eq!(record.time_spent_secs(), 95);
        assert_eq!(record.activity_id(), &activity);
    }

    #[tokio::test]
    async fn missed_quiz_still_pays_the_fixed_reward() {
        let (repo, child_id) = setup().await;
        let sink = sink(&repo, Clock::fixed(fixed_now()));
        let activity = ActivityId::new("letter_a").unwrap();

        let receipt = sink
            .notify_activity_complete(child_id, &activity, &completion(0))
            .await
            .unwrap();
        assert_eq!(receipt.total_points, 25);
        let record = repo.get_progress(receipt.progress_id).await.unwrap();
        assert_eq!(record.score_percent(), 0);
        assert_eq!(record.mastery(), MasteryLevel::Developing);
    }

    #[tokio::test]
    async fn streak_and_level_grow_over_days() {
        let (repo, child_id) = setup().await;
        let activity = ActivityId::new("letter_b").unwrap();
        let mut clock = Clock::fixed(fixed_now());

        let mut last = None;
        for _ in 0..4 {
            let receipt = sink(&repo, clock)
                .notify_activity_complete(child_id, &activity, &completion(1))
                .await
                .unwrap();
            last = Some(receipt);
            clock.advance(Duration::days(1));
        }
        let last = last.unwrap();
        assert_eq!(last.total_points, 100);
        assert_eq!(last.current_level, 2);
        assert!(last.leveled_up);
        assert_eq!(last.daily_streak, 4);

        // Skipping a day resets the streak.
        clock.advance(Duration::days(1));
        let receipt = sink(&repo, clock)
            .notify_activity_complete(child_id, &activity, &completion(1))
            .await
            .unwrap();
        assert_eq!(receipt.daily_streak, 1);
    }

    #[tokio::test]
    async fn unknown_child_is_reported() {
        let repo = InMemoryRepository::new();
        let sink = sink(&repo, Clock::fixed(fixed_now()));
        let err = sink
            .notify_activity_complete(
                ChildId::new(42),
                &ActivityId::new("letter_a").unwrap(),
                &completion(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ChildNotFound(id) if id == ChildId::new(42)));
    }

    #[tokio::test]
    async fn failed_write_leaves_child_uncredited_for_retry() {
        let (repo, child_id) = setup().await;
        let flaky = Arc::new(FailOnce {
            inner: repo.clone(),
            fail_next: AtomicBool::new(true),
        });
        let sink =
            ProgressCompletionSink::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()), flaky);
        let activity = ActivityId::new("letter_a").unwrap();
        let done = completion(1);

        let err = sink
            .notify_activity_complete(child_id, &activity, &done)
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Storage(_)));
        let child = repo.get_child(child_id).await.unwrap().unwrap();
        assert_eq!(child.total_points(), 0);
        assert!(child.last_activity_date().is_none());

        let receipt = sink
            .notify_activity_complete(child_id, &activity, &done)
            .await
            .unwrap();
        assert_eq!(receipt.total_points, 25);
        let child = repo.get_child(child_id).await.unwrap().unwrap();
        assert_eq!(child.total_points(), 25);
        let history = repo.list_progress_for_child(child_id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn deleted_child_is_not_recreated() {
        let (repo, child_id) = setup().await;
        let sink = sink(&repo, Clock::fixed(fixed_now()));
        let activity = ActivityId::new("letter_a").unwrap();
        repo.delete_child(child_id).await.unwrap();

        let err = sink
            .notify_activity_complete(child_id, &activity, &completion(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ChildNotFound(id) if id == child_id));
        assert!(repo.get_child(child_id).await.unwrap().is_none());
    }
}
