//! Conformance report schema.
//!
//! Field names follow the published report format (`apiVersion`,
//! `gatewayAPIVersion`, `skippedTests`, ...). Optional lists are omitted from
//! the serialized form when empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TypesError;
use crate::feature::FeatureName;
use crate::outcome::LevelResult;
use crate::profile::Profile;

/// `apiVersion` stamped on every report.
pub const REPORT_API_VERSION: &str = "gateway.networking.k8s.io/v1";

/// `kind` stamped on every report.
pub const REPORT_KIND: &str = "ConformanceReport";

/// Identity of the implementation under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub organization: String,
    pub project: String,
    pub url: String,
    pub version: String,
    #[serde(default)]
    pub contact: Vec<String>,
}

/// Test counts for one (profile, level).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub passed: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl Statistics {
    pub fn total(&self) -> u32 {
        self.passed + self.skipped + self.failed
    }

    /// Result implied by these counts for a level whose tests were
    /// attempted. Only an empty level classifies as `Skipped`.
    pub fn classify(&self) -> LevelResult {
        if self.failed > 0 {
            LevelResult::Failed
        } else if self.skipped > 0 {
            LevelResult::Partial
        } else if self.passed > 0 {
            LevelResult::Success
        } else {
            LevelResult::Skipped
        }
    }

    /// Whether `result` can describe these counts.
    ///
    /// A level that was never attempted is `Skipped` however many of its
    /// tests were counted as skipped, so `Skipped` admits any counts without
    /// passes or failures.
    pub fn admits(&self, result: LevelResult) -> bool {
        match result {
            LevelResult::Skipped => self.passed == 0 && self.failed == 0,
            other => other == self.classify(),
        }
    }
}

/// Report for one support level of one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReport {
    pub result: LevelResult,
    pub summary: String,
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_tests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_tests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_features: Vec<FeatureName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsupported_features: Vec<FeatureName>,
}

/// Report for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub name: Profile,
    pub core: LevelReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<LevelReport>,
}

/// The canonical conformance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    pub api_version: String,
    pub kind: String,
    pub implementation: Implementation,
    pub date: DateTime<Utc>,
    #[serde(rename = "gatewayAPIVersion")]
    pub gateway_api_version: String,
    #[serde(rename = "gatewayAPIChannel")]
    pub gateway_api_channel: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub profiles: Vec<ProfileReport>,
}

fn default_mode() -> String {
    "default".to_string()
}

impl ConformanceReport {
    /// Look up a profile entry.
    pub fn profile(&self, profile: Profile) -> Option<&ProfileReport> {
        self.profiles.iter().find(|p| p.name == profile)
    }

    /// Check the structural invariants of a report.
    ///
    /// Profiles must be unique and in canonical order, every list sorted,
    /// counts consistent with the lists and the result consistent with the
    /// counts.
    pub fn validate(&self) -> Result<(), TypesError> {
        for pair in self.profiles.windows(2) {
            let (before, after) = (pair[0].name, pair[1].name);
            if before == after {
                return Err(TypesError::DuplicateProfile(after));
            }
            if before > after {
                return Err(TypesError::ProfileOrder { before, after });
            }
        }

        for entry in &self.profiles {
            if !entry.core.supported_features.is_empty()
                || !entry.core.unsupported_features.is_empty()
            {
                return Err(TypesError::CoreFeatureList {
                    profile: entry.name,
                });
            }
            validate_level(entry.name, &entry.core)?;
            if let Some(extended) = &entry.extended {
                validate_level(entry.name, extended)?;
            }
        }
        Ok(())
    }
}

fn validate_level(profile: Profile, level: &LevelReport) -> Result<(), TypesError> {
    check_sorted(profile, "skippedTests", &level.skipped_tests)?;
    check_sorted(profile, "failedTests", &level.failed_tests)?;
    check_sorted(profile, "supportedFeatures", &level.supported_features)?;
    check_sorted(profile, "unsupportedFeatures", &level.unsupported_features)?;

    if !level.supported_features.is_empty() && !level.unsupported_features.is_empty() {
        return Err(TypesError::ConflictingFeatureLists { profile });
    }

    let stats = level.statistics;
    if level.failed_tests.len() != stats.failed as usize {
        return Err(TypesError::StatisticsMismatch {
            profile,
            detail: format!(
                "{} failed tests listed, statistics report {}",
                level.failed_tests.len(),
                stats.failed
            ),
        });
    }

    // Skipped tests are only itemised for levels that were attempted.
    let listed_skips = if level.result == LevelResult::Skipped {
        0
    } else {
        stats.skipped as usize
    };
    if level.skipped_tests.len() != listed_skips {
        return Err(TypesError::StatisticsMismatch {
            profile,
            detail: format!(
                "{} skipped tests listed, expected {}",
                level.skipped_tests.len(),
                listed_skips
            ),
        });
    }

    if !stats.admits(level.result) {
        return Err(TypesError::StatisticsMismatch {
            profile,
            detail: format!(
                "result {} does not follow from statistics (expected {})",
                level.result,
                stats.classify()
            ),
        });
    }
    Ok(())
}

fn check_sorted<T: Ord>(
    profile: Profile,
    field: &'static str,
    items: &[T],
) -> Result<(), TypesError> {
    if items.windows(2).all(|w| w[0] < w[1]) {
        Ok(())
    } else {
        Err(TypesError::UnsortedList { profile, field })
    }
}

impl fmt::Display for LevelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.result {
            LevelResult::Success => "✓",
            LevelResult::Partial => "◐",
            LevelResult::Failed => "✗",
            LevelResult::Skipped => "○",
        };
        writeln!(
            f,
            "║    {} {:<8} passed {:<4} skipped {:<4} failed {:<4}",
            icon,
            self.result,
            self.statistics.passed,
            self.statistics.skipped,
            self.statistics.failed
        )?;
        writeln!(f, "║      {}", self.summary)?;
        for test in &self.failed_tests {
            writeln!(f, "║      Failed: {}", test)?;
        }
        for test in &self.skipped_tests {
            writeln!(f, "║      Skipped: {}", test)?;
        }
        if !self.supported_features.is_empty() {
            writeln!(f, "║      Supported: {}", join(&self.supported_features))?;
        }
        if !self.unsupported_features.is_empty() {
            writeln!(f, "║      Unsupported: {}", join(&self.unsupported_features))?;
        }
        Ok(())
    }
}

fn join(features: &[FeatureName]) -> String {
    features
        .iter()
        .map(FeatureName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "╔════════════════════════════════════════════════════════════╗")?;
        writeln!(f, "║  Gateway API Conformance Report                            ║")?;
        writeln!(f, "╠════════════════════════════════════════════════════════════╣")?;
        writeln!(
            f,
            "║  Implementation: {:<41} ║",
            format!(
                "{}/{} {}",
                self.implementation.organization,
                self.implementation.project,
                self.implementation.version
            )
        )?;
        writeln!(
            f,
            "║  Gateway API: {:<44} ║",
            format!("{} ({})", self.gateway_api_version, self.gateway_api_channel)
        )?;
        writeln!(
            f,
            "║  Date: {:<51} ║",
            self.date.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "╠════════════════════════════════════════════════════════════╣")?;

        for entry in &self.profiles {
            writeln!(f, "║  Profile {}", entry.name)?;
            writeln!(f, "╟────────────────────────────────────────────────────────────╢")?;
            writeln!(f, "║    Core:")?;
            write!(f, "{}", entry.core)?;
            if let Some(extended) = &entry.extended {
                writeln!(f, "║    Extended:")?;
                write!(f, "{}", extended)?;
            }
            writeln!(f, "╟────────────────────────────────────────────────────────────╢")?;
        }

        writeln!(f, "╚════════════════════════════════════════════════════════════╝")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn level(result: LevelResult, passed: u32, skipped: u32, failed: u32) -> LevelReport {
        LevelReport {
            result,
            summary: String::new(),
            statistics: Statistics {
                passed,
                skipped,
                failed,
            },
            skipped_tests: Vec::new(),
            failed_tests: Vec::new(),
            supported_features: Vec::new(),
            unsupported_features: Vec::new(),
        }
    }

    fn report(profiles: Vec<ProfileReport>) -> ConformanceReport {
        ConformanceReport {
            api_version: REPORT_API_VERSION.to_string(),
            kind: REPORT_KIND.to_string(),
            implementation: Implementation {
                organization: "acme".into(),
                project: "edge".into(),
                url: "https://acme.example/edge".into(),
                version: "v2.1.0".into(),
                contact: vec!["@acme/gateway".into()],
            },
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            gateway_api_version: "v1.1.0".into(),
            gateway_api_channel: "standard".into(),
            mode: "default".into(),
            profiles,
        }
    }

    #[test]
    fn classify_follows_counts() {
        let s = |passed, skipped, failed| Statistics {
            passed,
            skipped,
            failed,
        };
        assert_eq!(s(0, 0, 0).classify(), LevelResult::Skipped);
        assert_eq!(s(0, 4, 0).classify(), LevelResult::Partial);
        assert_eq!(s(3, 1, 2).classify(), LevelResult::Failed);
        assert_eq!(s(0, 0, 1).classify(), LevelResult::Failed);
        assert_eq!(s(3, 1, 0).classify(), LevelResult::Partial);
        assert_eq!(s(3, 0, 0).classify(), LevelResult::Success);
    }

    #[test]
    fn skipped_result_needs_no_executions() {
        let s = |passed, skipped, failed| Statistics {
            passed,
            skipped,
            failed,
        };
        assert!(s(0, 4, 0).admits(LevelResult::Skipped));
        assert!(s(0, 4, 0).admits(LevelResult::Partial));
        assert!(!s(1, 4, 0).admits(LevelResult::Skipped));
        assert!(!s(0, 0, 1).admits(LevelResult::Skipped));
        assert!(!s(2, 0, 0).admits(LevelResult::Partial));
    }

    #[test]
    fn empty_lists_are_omitted() {
        let r = report(vec![ProfileReport {
            name: Profile::Http,
            core: level(LevelResult::Success, 2, 0, 0),
            extended: None,
        }]);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"gatewayAPIVersion\":\"v1.1.0\""));
        assert!(!json.contains("skippedTests"));
        assert!(!json.contains("extended"));
    }

    #[test]
    fn validate_rejects_duplicates_and_order() {
        let dup = report(vec![
            ProfileReport {
                name: Profile::Tcp,
                core: level(LevelResult::Success, 1, 0, 0),
                extended: None,
            },
            ProfileReport {
                name: Profile::Tcp,
                core: level(LevelResult::Success, 1, 0, 0),
                extended: None,
            },
        ]);
        assert_eq!(
            dup.validate().unwrap_err(),
            TypesError::DuplicateProfile(Profile::Tcp)
        );

        let unordered = report(vec![
            ProfileReport {
                name: Profile::Tcp,
                core: level(LevelResult::Success, 1, 0, 0),
                extended: None,
            },
            ProfileReport {
                name: Profile::Http,
                core: level(LevelResult::Success, 1, 0, 0),
                extended: None,
            },
        ]);
        assert!(matches!(
            unordered.validate(),
            Err(TypesError::ProfileOrder { .. })
        ));
    }

    #[test]
    fn validate_checks_lists_against_statistics() {
        let mut core = level(LevelResult::Failed, 1, 0, 1);
        let r = report(vec![ProfileReport {
            name: Profile::Http,
            core: core.clone(),
            extended: None,
        }]);
        assert!(matches!(
            r.validate(),
            Err(TypesError::StatisticsMismatch { .. })
        ));

        core.failed_tests = vec!["HTTPRouteSimpleSameNamespace".into()];
        let r = report(vec![ProfileReport {
            name: Profile::Http,
            core,
            extended: None,
        }]);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unsorted_features() {
        let mut extended = level(LevelResult::Skipped, 0, 0, 0);
        extended.unsupported_features = vec!["B".into(), "A".into()];
        let r = report(vec![ProfileReport {
            name: Profile::Http,
            core: level(LevelResult::Success, 1, 0, 0),
            extended: Some(extended),
        }]);
        assert_eq!(
            r.validate().unwrap_err(),
            TypesError::UnsortedList {
                profile: Profile::Http,
                field: "unsupportedFeatures"
            }
        );
    }

    #[test]
    fn yaml_round_trip_keeps_order() {
        let mut extended = level(LevelResult::Partial, 2, 1, 0);
        extended.skipped_tests = vec!["HTTPRouteRequestMirror".into()];
        extended.supported_features = vec!["HTTPRouteMethodMatching".into(), "HTTPRouteQueryParamMatching".into()];
        let r = report(vec![ProfileReport {
            name: Profile::Http,
            core: level(LevelResult::Success, 5, 0, 0),
            extended: Some(extended),
        }]);
        r.validate().unwrap();

        let yaml = serde_yaml::to_string(&r).unwrap();
        let parsed: ConformanceReport = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, r);
        assert!(yaml.find("apiVersion").unwrap() < yaml.find("profiles").unwrap());
    }

    #[test]
    fn display_lists_profiles() {
        let r = report(vec![ProfileReport {
            name: Profile::Grpc,
            core: level(LevelResult::Success, 3, 0, 0),
            extended: None,
        }]);
        let text = r.to_string();
        assert!(text.contains("Profile GRPC"));
        assert!(text.contains("acme/edge"));
    }
}
