//! Bulk reconciliation of spreadsheet rows against the metadata provider.

pub mod matcher;
pub mod pipeline;
pub mod retry;
pub mod spreadsheet;

pub use matcher::Matcher;
pub use pipeline::{ImportReport, ReconciliationPipeline, RowOutcome};
pub use retry::RetryPolicy;
pub use spreadsheet::{read_workbook, ImportSheet, SheetRow};
