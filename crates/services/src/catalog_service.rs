use std::sync::Arc;

use literacy_core::catalog::{default_activities, home_screen_ids};
use literacy_core::model::{Activity, ActivityError, ActivityId, ActivityType, Letter, Track};
use storage::repository::ActivityRepository;

use crate::error::CatalogError;

/// Narrows a catalog listing. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub track: Option<Track>,
    pub activity_type: Option<ActivityType>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
}

impl ActivityFilter {
    #[must_use]
    pub fn with_track(mut self, track: Track) -> Self {
        self.track = Some(track);
        self
    }

    #[must_use]
    pub fn with_type(mut self, activity_type: ActivityType) -> Self {
        self.activity_type = Some(activity_type);
        self
    }

    /// Keep activities whose minimum age lies in `min..=max`.
    #[must_use]
    pub fn with_age_band(mut self, min: u8, max: u8) -> Self {
        self.min_age = Some(min);
        self.max_age = Some(max);
        self
    }

    #[must_use]
    pub fn matches(&self, activity: &Activity) -> bool {
        self.track.is_none_or(|t| t == activity.track())
            && self
                .activity_type
                .is_none_or(|t| t == activity.activity_type())
            && self.min_age.is_none_or(|min| activity.minimum_age() >= min)
            && self.max_age.is_none_or(|max| activity.minimum_age() <= max)
    }
}

/// Read access to the activity catalog plus the built-in seed.
#[derive(Clone)]
pub struct ActivityCatalogService {
    activities: Arc<dyn ActivityRepository>,
}

impl ActivityCatalogService {
    #[must_use]
    pub fn new(activities: Arc<dyn ActivityRepository>) -> Self {
        Self { activities }
    }

    /// Activities matching `filter`, ordered by track, level and id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list(&self, filter: &ActivityFilter) -> Result<Vec<Activity>, CatalogError> {
        let mut activities: Vec<Activity> = self
            .activities
            .list_activities(u32::MAX)
            .await?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        activities.sort_by(|a, b| {
            a.track()
                .cmp(&b.track())
                .then(a.level().cmp(&b.level()))
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(activities)
    }

    /// The home-screen activities for `track`, in display order.
    ///
    /// Entries missing from storage are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn activities_for_track(&self, track: Track) -> Result<Vec<Activity>, CatalogError> {
        let mut activities = Vec::new();
        for slug in home_screen_ids(track) {
            let id = ActivityId::new(*slug).map_err(ActivityError::from)?;
            match self.activities.get_activity(&id).await? {
                Some(activity) => activities.push(activity),
                None => tracing::warn!(activity = %id, %track, "home-screen activity missing"),
            }
        }
        Ok(activities)
    }

    /// Fetch one activity.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub async fn get_activity(&self, id: &ActivityId) -> Result<Activity, CatalogError> {
        self.activities
            .get_activity(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    /// The letter a letter-learning activity teaches.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id and
    /// `CatalogError::NotLetterActivity` when the activity has no target letter.
    pub async fn resolve_letter(&self, id: &ActivityId) -> Result<Letter, CatalogError> {
        self.get_activity(id)
            .await?
            .target_letter()
            .ok_or_else(|| CatalogError::NotLetterActivity(id.clone()))
    }

    /// Upsert the built-in activities. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if an entry is invalid or storage fails.
    pub async fn seed_default_catalog(&self) -> Result<usize, CatalogError> {
        let activities = default_activities()?;
        for activity in &activities {
            self.activities.upsert_activity(activity).await?;
        }
        tracing::info!(count = activities.len(), "default catalog seeded");
        Ok(activities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    async fn seeded() -> ActivityCatalogService {
        let service = ActivityCatalogService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.seed_default_catalog().await.unwrap(), 9);
        service
    }

    fn ids(activities: &[Activity]) -> Vec<&str> {
        activities.iter().map(|a| a.id().as_str()).collect()
    }

    #[tokio::test]
    async fn list_orders_by_track_level_and_id() {
        let service = seeded().await;
        let all = service.list(&ActivityFilter::default()).await.unwrap();
        assert_eq!(
            ids(&all),
            vec![
                "colors",
                "shapes",
                "sounds",
                "letter_a",
                "letter_b",
                "letter_c",
                "blending",
                "phonics",
                "word_families",
            ]
        );
    }

    #[tokio::test]
    async fn filters_by_track_type_and_age() {
        let service = seeded().await;

        let early = service
            .list(&ActivityFilter::default().with_track(Track::EarlyAlphabetic))
            .await
            .unwrap();
        assert_eq!(ids(&early), vec!["letter_a", "letter_b", "letter_c"]);

        let building = service
            .list(&ActivityFilter::default().with_type(ActivityType::WordBuilding))
            .await
            .unwrap();
        assert_eq!(ids(&building), vec!["blending", "word_families"]);

        let toddlers = service
            .list(&ActivityFilter::default().with_age_band(2, 2))
            .await
            .unwrap();
        assert_eq!(toddlers.len(), 9);
        let older = service
            .list(&ActivityFilter::default().with_age_band(3, 10))
            .await
            .unwrap();
        assert!(older.is_empty());
    }

    #[tokio::test]
    async fn home_screen_sets_follow_track() {
        let service = seeded().await;
        let pre = service
            .activities_for_track(Track::PreAlphabetic)
            .await
            .unwrap();
        assert_eq!(ids(&pre), vec!["sounds", "shapes", "colors"]);

        let fluency = service
            .activities_for_track(Track::FluencyBuilding)
            .await
            .unwrap();
        assert_eq!(ids(&fluency), vec!["letter_a", "letter_b", "letter_c"]);
    }

    #[tokio::test]
    async fn resolve_letter_distinguishes_failures() {
        let service = seeded().await;
        let letter = service
            .resolve_letter(&ActivityId::new("letter_b").unwrap())
            .await
            .unwrap();
        assert_eq!(letter, Letter::from('B'));

        let err = service
            .resolve_letter(&ActivityId::new("phonics").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotLetterActivity(_)));

        let err = service
            .resolve_letter(&ActivityId::new("letter_q").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
