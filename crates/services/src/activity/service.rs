use std::sync::Arc;
use std::time::Duration;

use literacy_core::lessons::ContentProvider;
use literacy_core::model::{ActivityId, Child, ChildId, Letter};

use super::controller::{ActivityController, Delivery, DeliveryClaim};
use crate::Clock;
use crate::catalog_service::ActivityCatalogService;
use crate::completion::{CompletionReceipt, CompletionSink};
use crate::error::ActivityServiceError;

/// Starts guided letter activities and hands finished ones to the completion sink.
#[derive(Clone)]
pub struct ActivityService {
    clock: Clock,
    content: Arc<dyn ContentProvider>,
    catalog: Arc<ActivityCatalogService>,
    sink: Arc<dyn CompletionSink>,
    advance_delay: Duration,
}

impl ActivityService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentProvider>,
        catalog: Arc<ActivityCatalogService>,
        sink: Arc<dyn CompletionSink>,
        advance_delay: Duration,
    ) -> Self {
        Self {
            clock,
            content,
            catalog,
            sink,
            advance_delay,
        }
    }

    /// Open a session for `letter` with the given display name.
    #[must_use]
    pub fn start(&self, letter: Letter, child_name: &str) -> ActivityController {
        ActivityController::start(
            letter,
            child_name,
            Arc::clone(&self.content),
            self.clock,
            self.advance_delay,
        )
    }

    /// Open a session for a catalog activity, greeting the child by name.
    ///
    /// # Errors
    ///
    /// Returns `ActivityServiceError::Catalog` if the activity is unknown or
    /// does not teach a letter.
    pub async fn start_activity(
        &self,
        child: &Child,
        activity_id: &ActivityId,
    ) -> Result<ActivityController, ActivityServiceError> {
        let letter = self.catalog.resolve_letter(activity_id).await?;
        Ok(self.start(letter, child.name()))
    }

    /// Deliver the finished session to the completion sink exactly once.
    ///
    /// On sink failure the session is left as it was so the call can be retried.
    ///
    /// # Errors
    ///
    /// Returns `ActivityServiceError::NotComplete` before the completion step,
    /// `ActivityServiceError::AlreadyCompleted` once delivered, or the sink's error.
    pub async fn finish(
        &self,
        controller: &ActivityController,
        child_id: ChildId,
        activity_id: &ActivityId,
    ) -> Result<CompletionReceipt, ActivityServiceError> {
        let DeliveryClaim {
            generation,
            completion,
        } = controller
            .begin_delivery()
            .map_err(|_: Delivery| ActivityServiceError::AlreadyCompleted)?
            .ok_or(ActivityServiceError::NotComplete)?;

        match self
            .sink
            .notify_activity_complete(child_id, activity_id, &completion)
            .await
        {
            Ok(receipt) => {
                controller.end_delivery(generation, true);
                tracing::info!(
                    session = %completion.session_id,
                    child_id = child_id.value(),
                    activity = %activity_id,
                    points = completion.points_awarded,
                    score = completion.score,
                    "activity finished"
                );
                Ok(receipt)
            }
            Err(e) => {
                controller.end_delivery(generation, false);
                tracing::warn!(error = %e, child_id = child_id.value(), "completion sink failed");
                Err(e.into())
            }
        }
    }
}
