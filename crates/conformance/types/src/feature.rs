//! Feature names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of one testable capability, e.g. `HTTPRouteMethodMatching`.
///
/// Ordering is plain byte-wise string ordering, which is the lexicographic
/// order used for every feature list in a report.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureName(String);

impl FeatureName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FeatureName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for FeatureName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
