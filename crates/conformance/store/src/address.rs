//! Report addressing.
//!
//! Reports are filed as `<gatewayAPIVersion>/<organization>-<project>.yaml`;
//! every report for one implementation at one API version lands in the same
//! file as an ordered history.

use std::fmt;
use std::path::PathBuf;

use conformance_types::ConformanceReport;

use crate::error::{StoreError, StoreResult};

/// Where a report is filed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportAddress {
    pub gateway_api_version: String,
    pub organization: String,
    pub project: String,
}

impl ReportAddress {
    pub fn new(
        gateway_api_version: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
    ) -> StoreResult<Self> {
        let address = Self {
            gateway_api_version: gateway_api_version.into(),
            organization: organization.into(),
            project: project.into(),
        };
        for (field, value) in [
            ("gatewayAPIVersion", &address.gateway_api_version),
            ("organization", &address.organization),
            ("project", &address.project),
        ] {
            if value.is_empty() {
                return Err(StoreError::InvalidAddress(format!("{} is empty", field)));
            }
            if value.contains(['/', '\\']) || value == "." || value == ".." {
                return Err(StoreError::InvalidAddress(format!(
                    "{} {:?} is not a valid path segment",
                    field, value
                )));
            }
        }
        Ok(address)
    }

    /// Address of `report`.
    pub fn of(report: &ConformanceReport) -> StoreResult<Self> {
        Self::new(
            report.gateway_api_version.clone(),
            report.implementation.organization.clone(),
            report.implementation.project.clone(),
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.yaml", self.organization, self.project)
    }

    /// Path relative to the report root.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.gateway_api_version).join(self.file_name())
    }
}

impl fmt::Display for ReportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gateway_api_version, self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_follows_convention() {
        let address = ReportAddress::new("v1.1.0", "acme", "edge").unwrap();
        assert_eq!(address.to_string(), "v1.1.0/acme-edge.yaml");
        assert_eq!(address.path(), PathBuf::from("v1.1.0").join("acme-edge.yaml"));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(ReportAddress::new("v1.1.0", "acme/evil", "edge").is_err());
        assert!(ReportAddress::new("..", "acme", "edge").is_err());
        assert!(ReportAddress::new("v1.1.0", "", "edge").is_err());
    }
}
