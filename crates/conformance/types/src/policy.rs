//! Extended-feature override policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::TypesError;
use crate::feature::FeatureName;

/// How a run claims extended features.
///
/// A single choice: a request can never carry both an opt-in and an opt-out
/// set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "features", rename_all = "camelCase")]
pub enum FeatureOverridePolicy {
    /// Extended support is not claimed.
    #[default]
    None,
    /// Claim exactly these extended features.
    OptIn(BTreeSet<FeatureName>),
    /// Claim every extended feature except these.
    OptOut(BTreeSet<FeatureName>),
}

/// Discriminant of a [`FeatureOverridePolicy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyKind {
    None,
    OptIn,
    OptOut,
}

impl FeatureOverridePolicy {
    /// Build a policy from the two independent fields used by run
    /// configuration files.
    ///
    /// An empty set counts as absent.
    pub fn from_claims(
        supported: Option<BTreeSet<FeatureName>>,
        unsupported: Option<BTreeSet<FeatureName>>,
    ) -> Result<Self, TypesError> {
        let supported = supported.filter(|s| !s.is_empty());
        let unsupported = unsupported.filter(|s| !s.is_empty());
        match (supported, unsupported) {
            (Some(s), Some(u)) => Err(TypesError::ConflictingOverridePolicy {
                supported: s.into_iter().collect(),
                unsupported: u.into_iter().collect(),
            }),
            (Some(s), None) => Ok(Self::OptIn(s)),
            (None, Some(u)) => Ok(Self::OptOut(u)),
            (None, None) => Ok(Self::None),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::None => PolicyKind::None,
            Self::OptIn(_) => PolicyKind::OptIn,
            Self::OptOut(_) => PolicyKind::OptOut,
        }
    }

    /// Feature names referenced by the policy.
    pub fn features(&self) -> Option<&BTreeSet<FeatureName>> {
        match self {
            Self::None => None,
            Self::OptIn(s) | Self::OptOut(s) => Some(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<FeatureName> {
        names.iter().map(|n| FeatureName::from(*n)).collect()
    }

    #[test]
    fn both_sets_conflict() {
        let err = FeatureOverridePolicy::from_claims(Some(set(&["X"])), Some(set(&["Y"])))
            .unwrap_err();
        assert!(matches!(err, TypesError::ConflictingOverridePolicy { .. }));
    }

    #[test]
    fn empty_sets_are_absent() {
        let policy = FeatureOverridePolicy::from_claims(Some(set(&[])), Some(set(&["Y"]))).unwrap();
        assert_eq!(policy, FeatureOverridePolicy::OptOut(set(&["Y"])));

        let policy = FeatureOverridePolicy::from_claims(None, None).unwrap();
        assert_eq!(policy.kind(), PolicyKind::None);
        assert!(policy.features().is_none());
    }

    #[test]
    fn serde_tagged_form() {
        let policy = FeatureOverridePolicy::OptIn(set(&["B", "A"]));
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, r#"{"mode":"optIn","features":["A","B"]}"#);
        let parsed: FeatureOverridePolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);
    }
}
