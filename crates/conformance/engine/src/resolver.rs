//! Profile resolution: requested profiles plus an override policy become the
//! concrete feature set each profile claims for this run.

use std::collections::{BTreeMap, BTreeSet};

use conformance_types::{FeatureName, FeatureOverridePolicy, Profile, SupportLevel};

use crate::catalog::FeatureCatalog;
use crate::error::{ConfigurationError, ConformanceResult};

/// Features claimed by one profile for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveFeatureSet {
    pub profile: Profile,
    /// Always the full catalog core set.
    pub core: BTreeSet<FeatureName>,
    /// Catalog extended set filtered by the override policy.
    pub extended: BTreeSet<FeatureName>,
}

impl ActiveFeatureSet {
    pub fn is_active(&self, feature: &FeatureName) -> bool {
        self.core.contains(feature) || self.extended.contains(feature)
    }

    /// Whether every feature in `features` is active.
    pub fn supports_all<'a>(&self, features: impl IntoIterator<Item = &'a FeatureName>) -> bool {
        features.into_iter().all(|f| self.is_active(f))
    }

    /// Whether any extended support is claimed.
    pub fn claims_extended(&self) -> bool {
        !self.extended.is_empty()
    }

    pub fn level(&self, level: SupportLevel) -> &BTreeSet<FeatureName> {
        match level {
            SupportLevel::Core => &self.core,
            SupportLevel::Extended => &self.extended,
        }
    }
}

/// Resolver output: one active set per requested profile, plus the policy
/// that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedProfiles {
    pub policy: FeatureOverridePolicy,
    pub sets: BTreeMap<Profile, ActiveFeatureSet>,
}

impl ResolvedProfiles {
    pub fn get(&self, profile: Profile) -> Option<&ActiveFeatureSet> {
        self.sets.get(&profile)
    }

    /// Requested profiles in canonical order.
    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        self.sets.keys().copied()
    }
}

/// Turns a profile request into active feature sets.
pub struct ProfileResolver<'a> {
    catalog: &'a FeatureCatalog,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(catalog: &'a FeatureCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve `profiles` under `policy`.
    ///
    /// Every feature named by the policy must be an extended feature of at
    /// least one requested profile. Naming a core feature in an opt-out set
    /// is rejected, since core features cannot be disabled. Validation
    /// completes before any set is computed, so an invalid request yields no
    /// partial result.
    pub fn resolve(
        &self,
        profiles: &BTreeSet<Profile>,
        policy: &FeatureOverridePolicy,
    ) -> ConformanceResult<ResolvedProfiles> {
        if profiles.is_empty() {
            return Err(ConfigurationError::NoProfilesRequested.into());
        }
        for profile in profiles {
            // Unregistered profiles fail here, before validation.
            self.catalog.features_for(*profile, SupportLevel::Core)?;
        }
        if let Some(named) = policy.features() {
            self.check_policy_features(profiles, policy, named)?;
        }

        let mut sets = BTreeMap::new();
        for &profile in profiles {
            let core = self.catalog.features_for(profile, SupportLevel::Core)?.clone();
            let catalog_extended = self.catalog.features_for(profile, SupportLevel::Extended)?;
            let extended: BTreeSet<FeatureName> = match policy {
                FeatureOverridePolicy::None => BTreeSet::new(),
                FeatureOverridePolicy::OptIn(claimed) => {
                    catalog_extended.intersection(claimed).cloned().collect()
                }
                FeatureOverridePolicy::OptOut(disclaimed) => {
                    catalog_extended.difference(disclaimed).cloned().collect()
                }
            };
            tracing::debug!(
                %profile,
                core = core.len(),
                extended = extended.len(),
                policy = ?policy.kind(),
                "resolved active feature set"
            );
            sets.insert(
                profile,
                ActiveFeatureSet {
                    profile,
                    core,
                    extended,
                },
            );
        }

        Ok(ResolvedProfiles {
            policy: policy.clone(),
            sets,
        })
    }

    fn check_policy_features(
        &self,
        profiles: &BTreeSet<Profile>,
        policy: &FeatureOverridePolicy,
        named: &BTreeSet<FeatureName>,
    ) -> ConformanceResult<()> {
        for feature in named {
            let mut is_extended = false;
            let mut core_of = None;
            for &profile in profiles {
                match self.catalog.level_of(profile, feature) {
                    Some(SupportLevel::Extended) => is_extended = true,
                    Some(SupportLevel::Core) => core_of = core_of.or(Some(profile)),
                    None => {}
                }
            }
            if is_extended {
                continue;
            }
            return Err(match (policy, core_of) {
                (FeatureOverridePolicy::OptOut(_), Some(profile)) => {
                    ConfigurationError::CannotDisableCoreFeature {
                        profile,
                        feature: feature.clone(),
                    }
                }
                _ => ConfigurationError::UnknownFeature {
                    feature: feature.clone(),
                },
            }
            .into());
        }
        Ok(())
    }
}
