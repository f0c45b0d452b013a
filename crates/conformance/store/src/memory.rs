//! In-memory report store
//!
//! Suitable for development and testing. Persistent backends implement
//! [`ReportStore`] against their own medium.

use async_trait::async_trait;
use conformance_types::ConformanceReport;
use dashmap::DashMap;

use crate::address::ReportAddress;
use crate::error::{StoreError, StoreResult};
use crate::ReportStore;

type ImplementationKey = (String, String);

/// In-memory report store keyed by (organization, project).
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: DashMap<ImplementationKey, Vec<ConformanceReport>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports across all implementations.
    pub fn len(&self) -> usize {
        self.reports.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn append(&self, report: ConformanceReport) -> StoreResult<()> {
        report.validate()?;
        let address = ReportAddress::of(&report)?;
        let key = (address.organization.clone(), address.project.clone());

        // The entry guard holds the shard lock, so check and push are atomic.
        let mut history = self.reports.entry(key).or_default();
        if let Some(last) = history.last() {
            if report.date <= last.date {
                return Err(StoreError::OutOfOrder {
                    organization: address.organization,
                    project: address.project,
                    last: last.date,
                    attempted: report.date,
                });
            }
        }
        tracing::info!(%address, date = %report.date, "conformance report stored");
        history.push(report);
        Ok(())
    }

    async fn list_for(
        &self,
        organization: &str,
        project: &str,
    ) -> StoreResult<Vec<ConformanceReport>> {
        let key = (organization.to_string(), project.to_string());
        Ok(self
            .reports
            .get(&key)
            .map(|history| history.value().clone())
            .unwrap_or_default())
    }
}
