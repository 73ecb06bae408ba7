use std::sync::Arc;

use chrono::NaiveDate;
use literacy_core::model::{Child, ChildId, MasteryLevel};
use storage::repository::{ChildRepository, ProgressRepository, ProgressRow};

use crate::error::ReportError;

/// A child counts as an active learner if they finished something this many days back.
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Points per star on the parent dashboard.
pub const POINTS_PER_STAR: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasteryBreakdown {
    pub not_started: usize,
    pub developing: usize,
    pub proficient: usize,
    pub mastered: usize,
}

impl MasteryBreakdown {
    fn record(&mut self, level: MasteryLevel) {
        match level {
            MasteryLevel::NotStarted => self.not_started += 1,
            MasteryLevel::Developing => self.developing += 1,
            MasteryLevel::Proficient => self.proficient += 1,
            MasteryLevel::Mastered => self.mastered += 1,
        }
    }
}

/// Progress summary for one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildReport {
    pub child: Child,
    pub average_score: u32,
    pub total_minutes: u64,
    pub total_activities: usize,
    pub mastery: MasteryBreakdown,
    /// Newest first.
    pub recent: Vec<ProgressRow>,
}

/// Household-wide totals for the parent dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overview {
    pub children: usize,
    pub total_points: u64,
    pub average_streak: u32,
    pub active_learners: usize,
    pub stars: u64,
}

/// Aggregates stored progress into reports.
#[derive(Clone)]
pub struct ProgressReportService {
    children: Arc<dyn ChildRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressReportService {
    #[must_use]
    pub fn new(children: Arc<dyn ChildRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { children, progress }
    }

    /// Report for one child; `recent` holds at most `limit` records.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::ChildNotFound` if the child does not exist.
    /// Returns `ReportError::Storage` if repository access fails.
    pub async fn child_report(
        &self,
        child_id: ChildId,
        limit: u32,
    ) -> Result<ChildReport, ReportError> {
        let child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or(ReportError::ChildNotFound(child_id))?;
        let mut history = self
            .progress
            .list_progress_for_child(child_id, u32::MAX)
            .await?;

        let mut mastery = MasteryBreakdown::default();
        let mut score_sum = 0_u64;
        let mut seconds = 0_u64;
        for row in &history {
            mastery.record(row.record.mastery());
            score_sum += u64::from(row.record.score_percent());
            seconds = seconds.saturating_add(row.record.time_spent_secs());
        }

        let total_activities = history.len();
        let average_score = rounded_div(score_sum, total_activities as u64);
        history.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(ChildReport {
            child,
            average_score: u32::try_from(average_score).unwrap_or(100),
            total_minutes: rounded_div(seconds, 60),
            total_activities,
            mastery,
            recent: history,
        })
    }

    /// Totals across every child as of `today`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if repository access fails.
    pub async fn overview(&self, today: NaiveDate) -> Result<Overview, ReportError> {
        let children = self.children.list_children(u32::MAX).await?;

        let total_points: u64 = children.iter().map(|c| u64::from(c.total_points())).sum();
        let streak_sum: u64 = children.iter().map(|c| u64::from(c.daily_streak())).sum();
        let active_learners = children
            .iter()
            .filter(|c| c.active_within(today, ACTIVE_WINDOW_DAYS))
            .count();
        let average_streak = rounded_div(streak_sum, children.len() as u64);

        Ok(Overview {
            children: children.len(),
            total_points,
            average_streak: u32::try_from(average_streak).unwrap_or(u32::MAX),
            active_learners,
            stars: total_points / u64::from(POINTS_PER_STAR),
        })
    }
}

/// Integer division rounded half up; zero for an empty denominator.
fn rounded_div(sum: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (sum + count / 2) / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use literacy_core::model::{ActivityId, Avatar, ProgressRecord};
    use literacy_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, NewChildRecord};

    async fn add_child(repo: &InMemoryRepository, name: &str) -> ChildId {
        let child = Child::new(ChildId::new(0), name, 6, Avatar::Dog, fixed_now()).unwrap();
        repo.insert_new_child(NewChildRecord::from_child(&child))
            .await
            .unwrap()
    }

    async fn add_progress(
        repo: &InMemoryRepository,
        child: ChildId,
        minutes: i64,
        score: u32,
        secs: u64,
    ) {
        let record = ProgressRecord::new(
            child,
            ActivityId::new("letter_a").unwrap(),
            fixed_now() + Duration::minutes(minutes),
            score,
            secs,
            1,
            MasteryLevel::from_score_percent(score),
        )
        .unwrap();
        repo.append_progress(&record).await.unwrap();
    }

    fn service(repo: &InMemoryRepository) -> ProgressReportService {
        ProgressReportService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rounded_div(0, 0), 0);
        assert_eq!(rounded_div(185, 2), 93);
        assert_eq!(rounded_div(89, 60), 1);
        assert_eq!(rounded_div(29, 60), 0);
    }

    #[tokio::test]
    async fn child_report_aggregates_history() {
        let repo = InMemoryRepository::new();
        let emma = add_child(&repo, "Emma").await;
        add_progress(&repo, emma, 0, 100, 300).await;
        add_progress(&repo, emma, 10, 85, 240).await;
        add_progress(&repo, emma, 20, 60, 90).await;

        let report = service(&repo).child_report(emma, 2).await.unwrap();
        assert_eq!(report.child.name(), "Emma");
        assert_eq!(report.total_activities, 3);
        assert_eq!(report.average_score, 82);
        // 630 seconds
        assert_eq!(report.total_minutes, 11);
        assert_eq!(
            report.mastery,
            MasteryBreakdown {
                not_started: 0,
                developing: 1,
                proficient: 1,
                mastered: 1,
            }
        );
        assert_eq!(report.recent.len(), 2);
        assert_eq!(report.recent[0].record.score_percent(), 60);
    }

    #[tokio::test]
    async fn empty_history_reports_zeros() {
        let repo = InMemoryRepository::new();
        let alex = add_child(&repo, "Alex").await;
        let report = service(&repo).child_report(alex, 5).await.unwrap();
        assert_eq!(report.total_activities, 0);
        assert_eq!(report.average_score, 0);
        assert_eq!(report.total_minutes, 0);
        assert!(report.recent.is_empty());

        let err = service(&repo)
            .child_report(ChildId::new(9), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::ChildNotFound(_)));
    }

    #[tokio::test]
    async fn overview_counts_points_streaks_and_activity() {
        let repo = InMemoryRepository::new();
        let today = fixed_now().date_naive();

        let mut emma = Child::new(ChildId::new(1), "Emma", 6, Avatar::Fox, fixed_now()).unwrap();
        emma.award_points(120, today - Duration::days(1));
        emma.award_points(25, today);
        let mut alex = Child::new(ChildId::new(2), "Alex", 5, Avatar::Owl, fixed_now()).unwrap();
        alex.award_points(30, today - Duration::days(10));
        repo.upsert_child(&emma).await.unwrap();
        repo.upsert_child(&alex).await.unwrap();

        let overview = service(&repo).overview(today).await.unwrap();
        assert_eq!(overview.children, 2);
        assert_eq!(overview.total_points, 175);
        assert_eq!(overview.stars, 17);
        // streaks 2 and 1
        assert_eq!(overview.average_streak, 2);
        assert_eq!(overview.active_learners, 1);

        let empty = service(&InMemoryRepository::new())
            .overview(today)
            .await
            .unwrap();
        assert_eq!(empty, Overview::default());
    }
}
