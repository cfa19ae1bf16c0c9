pub mod draft_service;
pub mod feed_service;
pub mod import_export_service;
pub mod summary_service;

pub use draft_service::DraftExportService;
pub use feed_service::FeedService;
pub use import_export_service::{ImportExportService, ImportResult};
pub use summary_service::{DevSummaryProvider, SummaryJob, SummaryProvider};
