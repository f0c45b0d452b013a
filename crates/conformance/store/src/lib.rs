//! # conformance-store
//!
//! Storage contract for certification reports. The engine hands over
//! validated [`ConformanceReport`]s; a store files them by
//! [`ReportAddress`] and returns each implementation's history oldest first.

pub mod address;
pub mod error;
pub mod memory;
pub mod render;

use async_trait::async_trait;
use conformance_types::ConformanceReport;

pub use address::ReportAddress;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryReportStore;

/// Persistence for conformance reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Store a report. Its date must be strictly later than every report
    /// already stored for the same organization and project.
    async fn append(&self, report: ConformanceReport) -> StoreResult<()>;

    /// All reports for one implementation, ascending by date.
    async fn list_for(&self, organization: &str, project: &str)
        -> StoreResult<Vec<ConformanceReport>>;
}
