//! Shared error types for the services crate.

use thiserror::Error;

use literacy_core::model::{ActivityError, ActivityId, ChildError, ChildId, ProgressError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ChildService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChildServiceError {
    #[error("child {0} not found")]
    NotFound(ChildId),
    #[error(transparent)]
    Child(#[from] ChildError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ActivityCatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("activity {0} not found")]
    NotFound(ActivityId),
    #[error("activity {0} does not teach a letter")]
    NotLetterActivity(ActivityId),
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by a `CompletionSink`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("child {0} not found")]
    ChildNotFound(ChildId),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ActivityService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActivityServiceError {
    #[error("activity has not reached the completion step")]
    NotComplete,
    #[error("activity completion was already delivered")]
    AlreadyCompleted,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Errors emitted by `ProgressReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("child {0} not found")]
    ChildNotFound(ChildId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while reading configuration from the environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("LITERACY_DB_URL must not be empty")]
    EmptyDatabaseUrl,
    #[error("invalid LITERACY_ADVANCE_DELAY_MS value: {raw}")]
    InvalidAdvanceDelay { raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
