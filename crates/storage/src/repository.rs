use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use literacy_core::model::{
    Activity, ActivityId, Avatar, Child, ChildError, ChildId, ProgressId, ProgressRecord, Track,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a child whose id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewChildRecord {
    pub name: String,
    pub age: u8,
    pub avatar: Avatar,
    pub track: Track,
    pub current_level: u32,
    pub total_points: u32,
    pub daily_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl NewChildRecord {
    #[must_use]
    pub fn from_child(child: &Child) -> Self {
        Self {
            name: child.name().to_owned(),
            age: child.age(),
            avatar: child.avatar(),
            track: child.track(),
            current_level: child.current_level(),
            total_points: child.total_points(),
            daily_streak: child.daily_streak(),
            last_activity_date: child.last_activity_date(),
            created_at: child.created_at(),
        }
    }

    /// Materialise the record under the id storage assigned to it.
    ///
    /// # Errors
    ///
    /// Returns `ChildError` if the record fails profile validation.
    pub fn into_child(self, id: ChildId) -> Result<Child, ChildError> {
        Child::from_persisted(
            id,
            self.name,
            self.age,
            self.avatar,
            self.track,
            self.current_level,
            self.total_points,
            self.daily_streak,
            self.last_activity_date,
            self.created_at,
        )
    }
}

/// A progress record together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRow {
    pub id: ProgressId,
    pub record: ProgressRecord,
}

impl ProgressRow {
    #[must_use]
    pub fn new(id: ProgressId, record: ProgressRecord) -> Self {
        Self { id, record }
    }
}

/// Repository contract for child profiles.
#[async_trait]
pub trait ChildRepository: Send + Sync {
    /// Insert a new child and return the assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the child cannot be stored.
    async fn insert_new_child(&self, child: NewChildRecord) -> Result<ChildId, StorageError>;

    /// Persist or update a child.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the child cannot be stored.
    async fn upsert_child(&self, child: &Child) -> Result<(), StorageError>;

    /// Fetch a child by ID. `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_child(&self, id: ChildId) -> Result<Option<Child>, StorageError>;

    /// List children ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_children(&self, limit: u32) -> Result<Vec<Child>, StorageError>;

    /// Delete a child together with its progress history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the child does not exist.
    async fn delete_child(&self, id: ChildId) -> Result<(), StorageError>;
}

/// Repository contract for the activity catalog.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Persist or update an activity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the activity cannot be stored.
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError>;

    /// Fetch an activity by slug. `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_activity(&self, id: &ActivityId) -> Result<Option<Activity>, StorageError>;

    /// List activities ordered by slug.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_activities(&self, limit: u32) -> Result<Vec<Activity>, StorageError>;
}

/// Repository contract for the progress history.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Append a progress record and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the child does not exist, or other storage errors.
    async fn append_progress(&self, record: &ProgressRecord) -> Result<ProgressId, StorageError>;

    /// Fetch a single record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_progress(&self, id: ProgressId) -> Result<ProgressRecord, StorageError>;

    /// Records for one child, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_progress_for_child(
        &self,
        child_id: ChildId,
        limit: u32,
    ) -> Result<Vec<ProgressRow>, StorageError>;

    /// Records across all children, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_recent_progress(&self, limit: u32) -> Result<Vec<ProgressRow>, StorageError>;
}

/// Persist a credited child and its new progress record as one unit.
#[async_trait]
pub trait CompletionPersistence: Send + Sync {
    /// Update the stored child and append `record` atomically.
    ///
    /// The child must already exist; it is never re-created.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the child does not exist,
    /// `StorageError::Conflict` if `record` belongs to another child,
    /// or other storage errors. Nothing is written on error.
    async fn record_completion(
        &self,
        child: &Child,
        record: &ProgressRecord,
    ) -> Result<ProgressId, StorageError>;
}

fn lock_err<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn limit_usize(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

fn newest_first(rows: &mut [ProgressRow]) {
    rows.sort_by(|a, b| {
        b.record
            .completed_at()
            .cmp(&a.record.completed_at())
            .then(b.id.cmp(&a.id))
    });
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    children: Arc<Mutex<BTreeMap<ChildId, Child>>>,
    activities: Arc<Mutex<BTreeMap<ActivityId, Activity>>>,
    progress: Arc<Mutex<HashMap<ProgressId, ProgressRecord>>>,
    next_child_id: Arc<Mutex<u64>>,
    next_progress_id: Arc<Mutex<i64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChildRepository for InMemoryRepository {
    async fn insert_new_child(&self, child: NewChildRecord) -> Result<ChildId, StorageError> {
        let mut children = self.children.lock().map_err(lock_err)?;
        let mut next = self.next_child_id.lock().map_err(lock_err)?;
        let highest = children.keys().next_back().map_or(0, ChildId::value);
        *next = (*next).max(highest) + 1;
        let id = ChildId::new(*next);
        let child = child
            .into_child(id)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        children.insert(id, child);
        Ok(id)
    }

    async fn upsert_child(&self, child: &Child) -> Result<(), StorageError> {
        let mut guard = self.children.lock().map_err(lock_err)?;
        guard.insert(child.id(), child.clone());
        Ok(())
    }

    async fn get_child(&self, id: ChildId) -> Result<Option<Child>, StorageError> {
        let guard = self.children.lock().map_err(lock_err)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_children(&self, limit: u32) -> Result<Vec<Child>, StorageError> {
        let guard = self.children.lock().map_err(lock_err)?;
        Ok(guard.values().take(limit_usize(limit)).cloned().collect())
    }

    async fn delete_child(&self, id: ChildId) -> Result<(), StorageError> {
        let mut children = self.children.lock().map_err(lock_err)?;
        if children.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        let mut progress = self.progress.lock().map_err(lock_err)?;
        progress.retain(|_, record| record.child_id() != id);
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError> {
        let mut guard = self.activities.lock().map_err(lock_err)?;
        guard.insert(activity.id().clone(), activity.clone());
        Ok(())
    }

    async fn get_activity(&self, id: &ActivityId) -> Result<Option<Activity>, StorageError> {
        let guard = self.activities.lock().map_err(lock_err)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_activities(&self, limit: u32) -> Result<Vec<Activity>, StorageError> {
        let guard = self.activities.lock().map_err(lock_err)?;
        Ok(guard.values().take(limit_usize(limit)).cloned().collect())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_progress(&self, record: &ProgressRecord) -> Result<ProgressId, StorageError> {
        // Mirrors the foreign key on the SQLite table.
        if !self
            .children
            .lock()
            .map_err(lock_err)?
            .contains_key(&record.child_id())
        {
            return Err(StorageError::NotFound);
        }
        let mut guard = self.progress.lock().map_err(lock_err)?;
        let mut next = self.next_progress_id.lock().map_err(lock_err)?;
        *next += 1;
        let id = ProgressId::new(*next);
        guard.insert(id, record.clone());
        Ok(id)
    }

    async fn get_progress(&self, id: ProgressId) -> Result<ProgressRecord, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_progress_for_child(
        &self,
        child_id: ChildId,
        limit: u32,
    ) -> Result<Vec<ProgressRow>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        let mut rows: Vec<ProgressRow> = guard
            .iter()
            .filter(|(_, record)| record.child_id() == child_id)
            .map(|(id, record)| ProgressRow::new(*id, record.clone()))
            .collect();
        newest_first(&mut rows);
        rows.truncate(limit_usize(limit));
        Ok(rows)
    }

    async fn list_recent_progress(&self, limit: u32) -> Result<Vec<ProgressRow>, StorageError> {
        let guard = self.progress.lock().map_err(lock_err)?;
        let mut rows: Vec<ProgressRow> = guard
            .iter()
            .map(|(id, record)| ProgressRow::new(*id, record.clone()))
            .collect();
        newest_first(&mut rows);
        rows.truncate(limit_usize(limit));
        Ok(rows)
    }
}

#[async_trait]
impl CompletionPersistence for InMemoryRepository {
    async fn record_completion(
        &self,
        child: &Child,
        record: &ProgressRecord,
    ) -> Result<ProgressId, StorageError> {
        if record.child_id() != child.id() {
            return Err(StorageError::Conflict);
        }

        let mut children = self.children.lock().map_err(lock_err)?;
        let mut progress = self.progress.lock().map_err(lock_err)?;
        let mut next = self.next_progress_id.lock().map_err(lock_err)?;

        let stored = children.get_mut(&child.id()).ok_or(StorageError::NotFound)?;
        *stored = child.clone();
        *next += 1;
        let id = ProgressId::new(*next);
        progress.insert(id, record.clone());
        Ok(id)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub children: Arc<dyn ChildRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub completions: Arc<dyn CompletionPersistence>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let children: Arc<dyn ChildRepository> = Arc::new(repo.clone());
        let activities: Arc<dyn ActivityRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let completions: Arc<dyn CompletionPersistence> = Arc::new(repo);
        Self {
            children,
            activities,
            progress,
            completions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use literacy_core::model::{ActivityType, Letter, MasteryLevel};
    use literacy_core::time::fixed_now;

    fn build_child(name: &str, age: u8) -> Child {
        Child::new(ChildId::new(0), name, age, Avatar::Bear, fixed_now()).unwrap()
    }

    fn record(child_id: ChildId, minutes_after: i64, score: u32) -> ProgressRecord {
        ProgressRecord::new(
            child_id,
            ActivityId::new("letter_a").unwrap(),
            fixed_now() + Duration::minutes(minutes_after),
            score,
            300,
            1,
            MasteryLevel::from_score_percent(score),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let repo = InMemoryRepository::new();
        let a = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Emma", 6)))
            .await
            .unwrap();
        let b = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Alex", 5)))
            .await
            .unwrap();
        assert_eq!(a, ChildId::new(1));
        assert_eq!(b, ChildId::new(2));

        let emma = repo.get_child(a).await.unwrap().unwrap();
        assert_eq!(emma.id(), a);
        assert_eq!(emma.name(), "Emma");
        assert!(repo.get_child(ChildId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_child_distinguishes_not_found_and_cascades() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Emma", 6)))
            .await
            .unwrap();
        repo.append_progress(&record(id, 0, 85)).await.unwrap();

        repo.delete_child(id).await.unwrap();
        assert!(repo.list_recent_progress(10).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_child(id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn progress_requires_existing_child() {
        let repo = InMemoryRepository::new();
        let err = repo
            .append_progress(&record(ChildId::new(5), 0, 85))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn progress_lists_newest_first() {
        let repo = InMemoryRepository::new();
        let emma = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Emma", 6)))
            .await
            .unwrap();
        let alex = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Alex", 5)))
            .await
            .unwrap();
        repo.append_progress(&record(emma, 0, 85)).await.unwrap();
        repo.append_progress(&record(emma, 10, 92)).await.unwrap();
        repo.append_progress(&record(alex, 5, 70)).await.unwrap();

        let rows = repo.list_progress_for_child(emma, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].record.score_percent(), 92);

        let recent = repo.list_recent_progress(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].record.score_percent(), 92);
        assert_eq!(recent[1].record.child_id(), alex);

        assert!(matches!(
            repo.get_progress(ProgressId::new(404)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn record_completion_writes_child_and_record_together() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Emma", 6)))
            .await
            .unwrap();
        let mut emma = repo.get_child(id).await.unwrap().unwrap();
        emma.award_points(25, fixed_now().date_naive());

        let progress_id = repo
            .record_completion(&emma, &record(id, 0, 100))
            .await
            .unwrap();
        assert_eq!(repo.get_child(id).await.unwrap().unwrap().total_points(), 25);
        assert_eq!(
            repo.get_progress(progress_id).await.unwrap().score_percent(),
            100
        );
    }

    #[tokio::test]
    async fn record_completion_rejects_missing_or_mismatched_child() {
        let repo = InMemoryRepository::new();
        let id = repo
            .insert_new_child(NewChildRecord::from_child(&build_child("Emma", 6)))
            .await
            .unwrap();
        let mut emma = repo.get_child(id).await.unwrap().unwrap();
        emma.award_points(25, fixed_now().date_naive());

        let err = repo
            .record_completion(&emma, &record(ChildId::new(7), 0, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        repo.delete_child(id).await.unwrap();
        let err = repo
            .record_completion(&emma, &record(id, 0, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
        assert!(repo.get_child(id).await.unwrap().is_none());
        assert!(repo.list_recent_progress(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn activities_round_trip() {
        let repo = InMemoryRepository::new();
        let activity = Activity::new(
            ActivityId::new("letter_b").unwrap(),
            "Learn Letter B",
            ActivityType::LetterRecognition,
            Track::EarlyAlphabetic,
        )
        .unwrap()
        .with_target_letter(Letter::from('B'));
        repo.upsert_activity(&activity).await.unwrap();

        let fetched = repo.get_activity(activity.id()).await.unwrap().unwrap();
        assert_eq!(fetched, activity);
        assert_eq!(repo.list_activities(10).await.unwrap().len(), 1);
    }
}
