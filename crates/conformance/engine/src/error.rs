//! Error taxonomy for a conformance run.
//!
//! Configuration and environment errors are raised during setup, before any
//! test executes, and no report is produced. Serialization errors are
//! internal consistency violations found while compiling a report. Individual
//! test failures are not errors; they are recorded as outcomes.

use conformance_types::{FeatureName, Profile, SupportLevel, TypesError};
use thiserror::Error;

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "conflicting override policy: opt-in {supported:?} and opt-out {unsupported:?} supplied together"
    )]
    ConflictingOverridePolicy {
        supported: Vec<FeatureName>,
        unsupported: Vec<FeatureName>,
    },

    #[error("unknown feature {feature}: not an extended feature of any requested profile")]
    UnknownFeature { feature: FeatureName },

    #[error("cannot disable core feature {feature} of profile {profile}")]
    CannotDisableCoreFeature {
        profile: Profile,
        feature: FeatureName,
    },

    #[error("no conformance profiles requested")]
    NoProfilesRequested,

    #[error("feature {feature} is registered as both core and extended in profile {profile}")]
    CatalogLevelOverlap {
        profile: Profile,
        feature: FeatureName,
    },

    #[error("test {test} is defined more than once for profile {profile}")]
    DuplicateTest { profile: Profile, test: String },

    #[error("test {test} requires feature {feature} unknown to profile {profile}")]
    UnknownTestFeature {
        profile: Profile,
        test: String,
        feature: FeatureName,
    },

    #[error("unknown profile {0:?}")]
    InvalidProfile(String),

    #[error("implementation {0} must be set")]
    MissingImplementationField(&'static str),

    #[error("suite version must be set")]
    MissingSuiteVersion,
}

/// The environment under test is not internally consistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("conflicting bundle versions installed: {}", versions.join(", "))]
    VersionMismatch { versions: Vec<String> },

    #[error("conflicting channels installed: {}", channels.join(", "))]
    ChannelMismatch { channels: Vec<String> },

    #[error("installed bundle version {installed} does not match suite version {suite}")]
    SuiteVersionMismatch { installed: String, suite: String },

    #[error("resource {resource} is missing the {annotation} annotation")]
    MissingAnnotation { resource: String, annotation: String },

    #[error("no custom resources of the gateway API group were discovered")]
    NoResourcesDiscovered,
}

/// Internal inconsistency detected while aggregating or compiling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportSerializationError {
    #[error("no aggregated results for profile {0}")]
    MissingProfileData(Profile),

    #[error("{profile} {level}: {pending} tests have not reported an outcome")]
    PendingOutcomes {
        profile: Profile,
        level: SupportLevel,
        pending: usize,
    },

    #[error("{profile} {level}: {counted} outcomes counted for {registered} registered tests")]
    CountMismatch {
        profile: Profile,
        level: SupportLevel,
        counted: u32,
        registered: usize,
    },

    #[error("{profile} {level}: outcome for unregistered test {test}")]
    UnregisteredTest {
        profile: Profile,
        level: SupportLevel,
        test: String,
    },

    #[error("{profile} {level}: test {test} reported more than once")]
    DuplicateOutcome {
        profile: Profile,
        level: SupportLevel,
        test: String,
    },

    #[error("compiled report is invalid: {0}")]
    InvalidReport(#[from] TypesError),
}

/// Errors from the conformance engine.
#[derive(Error, Debug)]
pub enum ConformanceError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("environment consistency error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("report serialization error: {0}")]
    Serialization(#[from] ReportSerializationError),

    #[error("unknown profile: {0}")]
    UnknownProfile(Profile),

    #[error("failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("profile task failed: {0}")]
    Task(String),
}

impl From<TypesError> for ConformanceError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::ConflictingOverridePolicy {
                supported,
                unsupported,
            } => ConfigurationError::ConflictingOverridePolicy {
                supported,
                unsupported,
            }
            .into(),
            TypesError::UnknownProfile(name) => ConfigurationError::InvalidProfile(name).into(),
            other => ReportSerializationError::InvalidReport(other).into(),
        }
    }
}

impl From<config::ConfigError> for ConformanceError {
    fn from(err: config::ConfigError) -> Self {
        ConformanceError::ConfigLoad(err.to_string())
    }
}

impl ConformanceError {
    /// Whether the error was raised during setup, before any test could run.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            ConformanceError::Configuration(_)
                | ConformanceError::Environment(_)
                | ConformanceError::UnknownProfile(_)
                | ConformanceError::ConfigLoad(_)
        )
    }
}

/// Convenience result type for conformance operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_lists_versions() {
        let err = EnvironmentError::VersionMismatch {
            versions: vec!["v0.7.0".into(), "v0.7.1".into()],
        };
        assert_eq!(
            err.to_string(),
            "conflicting bundle versions installed: v0.7.0, v0.7.1"
        );
    }

    #[test]
    fn conflicting_policy_maps_to_configuration() {
        let err: ConformanceError = TypesError::ConflictingOverridePolicy {
            supported: vec!["X".into()],
            unsupported: vec!["Y".into()],
        }
        .into();
        assert!(matches!(
            err,
            ConformanceError::Configuration(ConfigurationError::ConflictingOverridePolicy { .. })
        ));
        assert!(err.is_setup_error());
    }

    #[test]
    fn report_errors_are_not_setup_errors() {
        let err: ConformanceError = ReportSerializationError::MissingProfileData(Profile::Udp).into();
        assert!(!err.is_setup_error());
        assert!(err.to_string().contains("UDP"));
    }
}
