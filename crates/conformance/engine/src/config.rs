//! Run configuration.

use std::collections::BTreeSet;

use conformance_types::{FeatureName, FeatureOverridePolicy, Implementation, Profile};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, ConformanceError, ConformanceResult};
use crate::runner::RunRequest;

/// Configuration of one conformance run.
///
/// `supported_features` and `unsupported_features` mirror the two flags
/// operators set; they are folded into a single [`FeatureOverridePolicy`] and
/// may not both be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Profiles to certify, by wire name
    #[serde(default)]
    pub profiles: Vec<String>,

    /// Extended features to claim
    #[serde(default)]
    pub supported_features: Option<BTreeSet<FeatureName>>,

    /// Extended features to disclaim
    #[serde(default)]
    pub unsupported_features: Option<BTreeSet<FeatureName>>,

    /// Implementation under test
    #[serde(default)]
    pub implementation: Implementation,

    /// Version the suite was built for
    #[serde(default)]
    pub suite_version: String,

    /// Report mode
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_mode() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RunConfig {
    /// Load configuration from defaults, an optional file (YAML, TOML or
    /// JSON by extension) and `CONFORMANCE__`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> ConformanceResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&RunConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CONFORMANCE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: RunConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(profiles = ?config.profiles, "run configuration loaded");
        Ok(config)
    }

    /// Fold the two feature lists into one policy.
    pub fn override_policy(&self) -> ConformanceResult<FeatureOverridePolicy> {
        Ok(FeatureOverridePolicy::from_claims(
            self.supported_features.clone(),
            self.unsupported_features.clone(),
        )?)
    }

    /// Parse the profile names, case-insensitively.
    pub fn profiles(&self) -> ConformanceResult<BTreeSet<Profile>> {
        self.profiles
            .iter()
            .map(|name| name.trim().parse::<Profile>().map_err(ConformanceError::from))
            .collect()
    }

    /// Build the run request, checking the profile names and the
    /// implementation identity.
    pub fn request(&self) -> ConformanceResult<RunRequest> {
        let profiles = self.profiles()?;
        let policy = self.override_policy()?;
        let identity = &self.implementation;
        for (field, value) in [
            ("organization", &identity.organization),
            ("project", &identity.project),
            ("version", &identity.version),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::MissingImplementationField(field).into());
            }
        }

        let mut request = RunRequest::new(profiles, policy, self.implementation.clone());
        request.mode = self.mode.clone();
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn identity() -> Implementation {
        Implementation {
            organization: "acme".into(),
            project: "edge".into(),
            url: "https://acme.example".into(),
            version: "v1.0.0".into(),
            contact: vec![],
        }
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.profiles.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn both_feature_lists_conflict() {
        let config = RunConfig {
            profiles: vec!["HTTP".into()],
            supported_features: Some(["X"].into_iter().map(FeatureName::from).collect()),
            unsupported_features: Some(["Y"].into_iter().map(FeatureName::from).collect()),
            implementation: identity(),
            ..Default::default()
        };
        let err = config.request().unwrap_err();
        assert!(matches!(
            err,
            ConformanceError::Configuration(ConfigurationError::ConflictingOverridePolicy { .. })
        ));
    }

    #[test]
    fn identity_is_required() {
        let config = RunConfig {
            profiles: vec!["HTTP".into()],
            ..Default::default()
        };
        assert!(matches!(
            config.request().unwrap_err(),
            ConformanceError::Configuration(ConfigurationError::MissingImplementationField(
                "organization"
            ))
        ));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let config = RunConfig {
            profiles: vec!["http".into(), "SCTP".into()],
            implementation: identity(),
            ..Default::default()
        };
        match config.request().unwrap_err() {
            ConformanceError::Configuration(ConfigurationError::InvalidProfile(name)) => {
                assert_eq!(name, "SCTP");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r#"
profiles: [HTTP, TCP]
unsupported_features: [HTTPRouteRequestMirror]
suite_version: v1.1.0
implementation:
  organization: acme
  project: edge
  url: https://acme.example
  version: v2.0.0
  contact: ["@acme/gateway"]
"#
        )
        .unwrap();

        let config = RunConfig::load(file.path().to_str()).unwrap();
        assert_eq!(
            config.profiles().unwrap(),
            [Profile::Http, Profile::Tcp].into_iter().collect()
        );
        assert_eq!(config.suite_version, "v1.1.0");
        assert_eq!(config.mode, "default");

        let request = config.request().unwrap();
        assert!(matches!(request.policy, FeatureOverridePolicy::OptOut(ref s) if s.len() == 1));
        assert_eq!(request.implementation.contact, vec!["@acme/gateway".to_string()]);
    }
}
