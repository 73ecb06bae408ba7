use std::sync::Arc;

use literacy_core::lessons::{ContentProvider, StaticContentProvider};
use storage::repository::Storage;

use crate::Clock;
use crate::activity::ActivityService;
use crate::catalog_service::ActivityCatalogService;
use crate::child_service::ChildService;
use crate::completion::{CompletionSink, ProgressCompletionSink};
use crate::config::LiteracyConfig;
use crate::error::AppServicesError;
use crate::report_service::ProgressReportService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    children: Arc<ChildService>,
    catalog: Arc<ActivityCatalogService>,
    activities: Arc<ActivityService>,
    reports: Arc<ProgressReportService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, seeding the catalog if it is empty.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or catalog setup fails.
    pub async fn new_sqlite(
        config: &LiteracyConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Self::from_storage(storage, config, clock).await
    }

    /// Build services over an in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if catalog setup fails.
    pub async fn in_memory(
        config: &LiteracyConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), config, clock).await
    }

    /// Build services over an existing backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if catalog setup fails.
    pub async fn from_storage(
        storage: Storage,
        config: &LiteracyConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(ActivityCatalogService::new(Arc::clone(&storage.activities)));
        if storage.activities.list_activities(1).await?.is_empty() {
            catalog.seed_default_catalog().await?;
        }

        let content: Arc<dyn ContentProvider> = Arc::new(StaticContentProvider::new());
        let sink: Arc<dyn CompletionSink> = Arc::new(ProgressCompletionSink::new(
            clock,
            Arc::clone(&storage.children),
            Arc::clone(&storage.completions),
        ));
        let activities = Arc::new(ActivityService::new(
            clock,
            content,
            Arc::clone(&catalog),
            sink,
            config.advance_delay,
        ));
        let children = Arc::new(ChildService::new(clock, Arc::clone(&storage.children)));
        let reports = Arc::new(ProgressReportService::new(
            Arc::clone(&storage.children),
            Arc::clone(&storage.progress),
        ));

        Ok(Self {
            children,
            catalog,
            activities,
            reports,
        })
    }

    #[must_use]
    pub fn children(&self) -> Arc<ChildService> {
        Arc::clone(&self.children)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<ActivityCatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn activities(&self) -> Arc<ActivityService> {
        Arc::clone(&self.activities)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<ProgressReportService> {
        Arc::clone(&self.reports)
    }
}
