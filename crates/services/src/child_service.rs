use std::sync::Arc;

use literacy_core::model::{Avatar, Child, ChildId};
use storage::repository::{ChildRepository, NewChildRecord, StorageError};

use crate::Clock;
use crate::error::ChildServiceError;

/// Creates and maintains child profiles.
#[derive(Clone)]
pub struct ChildService {
    clock: Clock,
    children: Arc<dyn ChildRepository>,
}

impl ChildService {
    #[must_use]
    pub fn new(clock: Clock, children: Arc<dyn ChildRepository>) -> Self {
        Self { clock, children }
    }

    /// Create a profile; the track is chosen from the age.
    ///
    /// # Errors
    ///
    /// Returns `ChildServiceError::Child` for validation failures.
    /// Returns `ChildServiceError::Storage` if persistence fails.
    pub async fn create_child(
        &self,
        name: &str,
        age: u8,
        avatar: Avatar,
    ) -> Result<Child, ChildServiceError> {
        let draft = Child::new(ChildId::new(0), name, age, avatar, self.clock.now())?;
        let id = self
            .children
            .insert_new_child(NewChildRecord::from_child(&draft))
            .await?;
        tracing::info!(child_id = id.value(), track = %draft.track(), "child created");
        Ok(draft.with_id(id))
    }

    /// Edit name, age and avatar.
    ///
    /// # Errors
    ///
    /// Returns `ChildServiceError::NotFound` if the child does not exist.
    /// Returns `ChildServiceError::Child` for validation failures.
    pub async fn update_profile(
        &self,
        id: ChildId,
        name: &str,
        age: u8,
        avatar: Avatar,
    ) -> Result<Child, ChildServiceError> {
        let mut child = self
            .children
            .get_child(id)
            .await?
            .ok_or(ChildServiceError::NotFound(id))?;
        child.update_profile(name, age, avatar)?;
        self.children.upsert_child(&child).await?;
        Ok(child)
    }

    /// Fetch a child by ID.
    ///
    /// Returns `Ok(None)` when the child does not exist.
    ///
    /// # Errors
    ///
    /// Returns `ChildServiceError::Storage` if repository access fails.
    pub async fn get_child(&self, id: ChildId) -> Result<Option<Child>, ChildServiceError> {
        Ok(self.children.get_child(id).await?)
    }

    /// List children ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `ChildServiceError::Storage` if repository access fails.
    pub async fn list_children(&self, limit: u32) -> Result<Vec<Child>, ChildServiceError> {
        Ok(self.children.list_children(limit).await?)
    }

    /// Remove a child together with their progress history.
    ///
    /// # Errors
    ///
    /// Returns `ChildServiceError::NotFound` if the child does not exist.
    pub async fn delete_child(&self, id: ChildId) -> Result<(), ChildServiceError> {
        match self.children.delete_child(id).await {
            Ok(()) => {
                tracing::info!(child_id = id.value(), "child deleted");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(ChildServiceError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }
}
