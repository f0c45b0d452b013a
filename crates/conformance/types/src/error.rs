use thiserror::Error;

use crate::feature::FeatureName;
use crate::profile::Profile;

/// Errors raised while parsing or checking conformance vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    #[error("unknown support level: {0}")]
    UnknownSupportLevel(String),

    #[error("unknown outcome: {0}")]
    UnknownOutcome(String),

    #[error(
        "conflicting override policy: opt-in {supported:?} and opt-out {unsupported:?} supplied together"
    )]
    ConflictingOverridePolicy {
        supported: Vec<FeatureName>,
        unsupported: Vec<FeatureName>,
    },

    #[error("duplicate profile in report: {0}")]
    DuplicateProfile(Profile),

    #[error("profiles out of canonical order: {after} listed after {before}")]
    ProfileOrder { before: Profile, after: Profile },

    #[error("{profile} {field} is not sorted")]
    UnsortedList {
        profile: Profile,
        field: &'static str,
    },

    #[error("{profile} lists both supportedFeatures and unsupportedFeatures")]
    ConflictingFeatureLists { profile: Profile },

    #[error("{profile} core level carries a feature list")]
    CoreFeatureList { profile: Profile },

    #[error("{profile} statistics disagree with test lists: {detail}")]
    StatisticsMismatch { profile: Profile, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicting_policy_display_lists_both_sides() {
        let err = TypesError::ConflictingOverridePolicy {
            supported: vec!["X".into()],
            unsupported: vec!["Y".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"X\""));
        assert!(msg.contains("\"Y\""));
    }

    #[test]
    fn order_display_names_profiles() {
        let err = TypesError::ProfileOrder {
            before: Profile::Tcp,
            after: Profile::Http,
        };
        assert_eq!(
            err.to_string(),
            "profiles out of canonical order: HTTP listed after TCP"
        );
    }
}
