//! Environment gate: the installed API bundle must be a single version on a
//! single channel, matching the version the suite was built for.

use std::collections::{BTreeMap, BTreeSet};

use semver::Version;

use crate::error::EnvironmentError;

/// Annotation carrying the bundle version on every gateway API CRD.
pub const BUNDLE_VERSION_ANNOTATION: &str = "gateway.networking.k8s.io/bundle-version";

/// Annotation carrying the release channel on every gateway API CRD.
pub const CHANNEL_ANNOTATION: &str = "gateway.networking.k8s.io/channel";

/// Channel whose installation enables experimental-tagged tests.
pub const EXPERIMENTAL_CHANNEL: &str = "experimental";

/// A custom resource definition discovered in the environment under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub name: String,
    pub bundle_version: String,
    pub channel: String,
}

impl DiscoveredResource {
    pub fn new(
        name: impl Into<String>,
        bundle_version: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            bundle_version: bundle_version.into(),
            channel: channel.into(),
        }
    }

    /// Read the bundle version and channel from a resource's annotations.
    pub fn from_annotations(
        name: impl Into<String>,
        annotations: &BTreeMap<String, String>,
    ) -> Result<Self, EnvironmentError> {
        let name = name.into();
        let lookup = |key: &str| {
            annotations
                .get(key)
                .cloned()
                .ok_or_else(|| EnvironmentError::MissingAnnotation {
                    resource: name.clone(),
                    annotation: key.to_string(),
                })
        };
        let bundle_version = lookup(BUNDLE_VERSION_ANNOTATION)?;
        let channel = lookup(CHANNEL_ANNOTATION)?;
        Ok(Self {
            name,
            bundle_version,
            channel,
        })
    }
}

/// Successful gate verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentVerdict {
    /// Installed bundle version, as annotated.
    pub version: String,
    /// Installed channel.
    pub channel: String,
    /// Experimental-tagged tests run for every requested profile.
    pub experimental_enabled: bool,
}

/// Checks discovered resources against the suite's compiled version.
#[derive(Clone, Debug)]
pub struct VersionValidator {
    suite_version: String,
}

impl VersionValidator {
    pub fn new(suite_version: impl Into<String>) -> Self {
        Self {
            suite_version: suite_version.into(),
        }
    }

    pub fn suite_version(&self) -> &str {
        &self.suite_version
    }

    /// Run the gate.
    ///
    /// Bundle versions must agree exactly as annotated, so the verdict never
    /// depends on discovery order. The checks run in a fixed order: version
    /// agreement, channel agreement, then agreement with the suite.
    pub fn validate(
        &self,
        resources: &[DiscoveredResource],
    ) -> Result<EnvironmentVerdict, EnvironmentError> {
        if resources.is_empty() {
            return Err(EnvironmentError::NoResourcesDiscovered);
        }

        let versions: BTreeSet<&str> = resources
            .iter()
            .map(|r| r.bundle_version.as_str())
            .collect();
        if versions.len() > 1 {
            tracing::error!(?versions, "bundle version mismatch");
            return Err(EnvironmentError::VersionMismatch {
                versions: versions.into_iter().map(str::to_string).collect(),
            });
        }

        let channels: BTreeSet<&str> = resources.iter().map(|r| r.channel.as_str()).collect();
        if channels.len() > 1 {
            tracing::error!(?channels, "channel mismatch");
            return Err(EnvironmentError::ChannelMismatch {
                channels: channels.into_iter().map(str::to_string).collect(),
            });
        }

        let installed = &resources[0].bundle_version;
        if !same_release(installed, &self.suite_version) {
            tracing::error!(
                installed = %installed,
                suite = %self.suite_version,
                "suite version mismatch"
            );
            return Err(EnvironmentError::SuiteVersionMismatch {
                installed: installed.clone(),
                suite: self.suite_version.clone(),
            });
        }

        let channel = resources[0].channel.clone();
        let experimental_enabled = channel == EXPERIMENTAL_CHANNEL;
        tracing::info!(
            version = %installed,
            channel = %channel,
            experimental_enabled,
            resources = resources.len(),
            "environment consistency check passed"
        );

        Ok(EnvironmentVerdict {
            version: installed.clone(),
            channel,
            experimental_enabled,
        })
    }
}

/// Whether an installed bundle version names the suite's release.
///
/// Semantic versions match with or without a leading `v`; anything else must
/// match as a string.
fn same_release(installed: &str, suite: &str) -> bool {
    if installed.trim() == suite.trim() {
        return true;
    }
    match (parse_semver(installed), parse_semver(suite)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn parse_semver(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(stripped).ok()
}
