//! Canonical YAML and JSON rendering.
//!
//! Rendering refuses reports that fail validation, and parsing validates
//! what it reads, so nothing inconsistent crosses the store boundary.

use conformance_types::ConformanceReport;

use crate::address::ReportAddress;
use crate::error::{StoreError, StoreResult};

pub fn to_yaml(report: &ConformanceReport) -> StoreResult<String> {
    report.validate()?;
    serde_yaml::to_string(report).map_err(|e| StoreError::Render(e.to_string()))
}

pub fn from_yaml(input: &str) -> StoreResult<ConformanceReport> {
    let report: ConformanceReport =
        serde_yaml::from_str(input).map_err(|e| StoreError::Parse(e.to_string()))?;
    report.validate()?;
    Ok(report)
}

pub fn to_json(report: &ConformanceReport) -> StoreResult<String> {
    report.validate()?;
    serde_json::to_string_pretty(report).map_err(|e| StoreError::Render(e.to_string()))
}

pub fn from_json(input: &str) -> StoreResult<ConformanceReport> {
    let report: ConformanceReport =
        serde_json::from_str(input).map_err(|e| StoreError::Parse(e.to_string()))?;
    report.validate()?;
    Ok(report)
}

/// Render the history filed at one address, oldest first.
pub fn history_to_yaml(reports: &[ConformanceReport]) -> StoreResult<String> {
    check_history(reports)?;
    serde_yaml::to_string(reports).map_err(|e| StoreError::Render(e.to_string()))
}

pub fn history_from_yaml(input: &str) -> StoreResult<Vec<ConformanceReport>> {
    let reports: Vec<ConformanceReport> =
        serde_yaml::from_str(input).map_err(|e| StoreError::Parse(e.to_string()))?;
    check_history(&reports)?;
    Ok(reports)
}

/// A history holds valid reports for a single address, with strictly
/// increasing dates.
fn check_history(reports: &[ConformanceReport]) -> StoreResult<()> {
    let mut previous: Option<(&ConformanceReport, ReportAddress)> = None;
    for report in reports {
        report.validate()?;
        let address = ReportAddress::of(report)?;
        if let Some((last, expected)) = &previous {
            if address != *expected {
                return Err(StoreError::MixedHistory {
                    expected: expected.to_string(),
                    found: address.to_string(),
                });
            }
            if report.date <= last.date {
                return Err(StoreError::OutOfOrder {
                    organization: address.organization,
                    project: address.project,
                    last: last.date,
                    attempted: report.date,
                });
            }
        }
        previous = Some((report, address));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use conformance_types::{
        Implementation, LevelReport, LevelResult, Profile, ProfileReport, Statistics,
        REPORT_API_VERSION, REPORT_KIND,
    };

    fn report(project: &str, day: u32, version: &str) -> ConformanceReport {
        ConformanceReport {
            api_version: REPORT_API_VERSION.to_string(),
            kind: REPORT_KIND.to_string(),
            implementation: Implementation {
                organization: "acme".into(),
                project: project.into(),
                url: "https://acme.example".into(),
                version: "v1.0.0".into(),
                contact: vec![],
            },
            date: Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap(),
            gateway_api_version: version.into(),
            gateway_api_channel: "standard".into(),
            mode: "default".into(),
            profiles: vec![ProfileReport {
                name: Profile::Grpc,
                core: LevelReport {
                    result: LevelResult::Success,
                    summary: "Core tests succeeded.".into(),
                    statistics: Statistics {
                        passed: 3,
                        skipped: 0,
                        failed: 0,
                    },
                    skipped_tests: vec![],
                    failed_tests: vec![],
                    supported_features: vec![],
                    unsupported_features: vec![],
                },
                extended: None,
            }],
        }
    }

    #[test]
    fn history_round_trips_in_date_order() {
        let history = vec![report("edge", 1, "v1.1.0"), report("edge", 9, "v1.1.0")];
        let yaml = history_to_yaml(&history).unwrap();
        assert_eq!(history_from_yaml(&yaml).unwrap(), history);
        assert_eq!(history_to_yaml(&[]).unwrap().trim(), "[]");
    }

    #[test]
    fn history_rejects_non_increasing_dates() {
        let backwards = vec![report("edge", 5, "v1.1.0"), report("edge", 1, "v1.1.0")];
        assert!(matches!(
            history_to_yaml(&backwards),
            Err(StoreError::OutOfOrder { .. })
        ));

        let same_day = vec![report("edge", 5, "v1.1.0"), report("edge", 5, "v1.1.0")];
        assert!(matches!(
            history_to_yaml(&same_day),
            Err(StoreError::OutOfOrder { .. })
        ));

        // Hand-edited files are held to the same rule.
        let filed = serde_yaml::to_string(&backwards).unwrap();
        assert!(matches!(
            history_from_yaml(&filed),
            Err(StoreError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn history_rejects_mixed_addresses() {
        let other_project = vec![report("edge", 1, "v1.1.0"), report("mesh", 2, "v1.1.0")];
        match history_to_yaml(&other_project) {
            Err(StoreError::MixedHistory { expected, found }) => {
                assert_eq!(expected, "v1.1.0/acme-edge.yaml");
                assert_eq!(found, "v1.1.0/acme-mesh.yaml");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let other_version = vec![report("edge", 1, "v1.0.0"), report("edge", 2, "v1.1.0")];
        let filed = serde_yaml::to_string(&other_version).unwrap();
        assert!(matches!(
            history_from_yaml(&filed),
            Err(StoreError::MixedHistory { .. })
        ));
    }
}
