#![forbid(unsafe_code)]

pub mod activity;
pub mod app_services;
pub mod catalog_service;
pub mod child_service;
pub mod completion;
pub mod config;
pub mod error;
pub mod report_service;

pub use literacy_core::Clock;

pub use activity::{ActivityController, ActivityService};
pub use app_services::AppServices;
pub use catalog_service::{ActivityCatalogService, ActivityFilter};
pub use child_service::ChildService;
pub use completion::{CompletionReceipt, CompletionSink, ProgressCompletionSink};
pub use config::LiteracyConfig;
pub use error::{
    ActivityServiceError, AppServicesError, CatalogError, ChildServiceError, CompletionError,
    ConfigError, ReportError,
};
pub use report_service::{ChildReport, MasteryBreakdown, Overview, ProgressReportService};
