//! Test plan: which registered tests execute, and which are counted as
//! skipped without executing.

use std::collections::{BTreeMap, BTreeSet};

use conformance_types::{FeatureName, Profile, SupportLevel};

use crate::aggregator::TestRunAggregator;
use crate::catalog::FeatureCatalog;
use crate::error::{ConfigurationError, ConformanceResult};
use crate::resolver::{ActiveFeatureSet, ResolvedProfiles};
use crate::validator::EnvironmentVerdict;

/// Release channel a test is tagged with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TestChannel {
    #[default]
    Standard,
    Experimental,
}

/// A conformance test as supplied by the test suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestDefinition {
    pub name: String,
    pub profile: Profile,
    pub level: SupportLevel,
    /// Features the test exercises; all must be active for it to execute.
    pub features: BTreeSet<FeatureName>,
    pub channel: TestChannel,
}

impl TestDefinition {
    pub fn new(name: impl Into<String>, profile: Profile, level: SupportLevel) -> Self {
        Self {
            name: name.into(),
            profile,
            level,
            features: BTreeSet::new(),
            channel: TestChannel::Standard,
        }
    }

    pub fn with_features<I>(mut self, features: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FeatureName>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    pub fn experimental(mut self) -> Self {
        self.channel = TestChannel::Experimental;
        self
    }
}

/// What the runner does with a planned test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Disposition {
    Run,
    /// Counted as skipped without executing.
    Skip(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTest {
    pub definition: TestDefinition,
    pub disposition: Disposition,
}

impl PlannedTest {
    pub fn runnable(&self) -> bool {
        self.disposition == Disposition::Run
    }
}

/// Planned tests of every requested profile.
#[derive(Clone, Debug, Default)]
pub struct TestPlan {
    profiles: BTreeMap<Profile, Vec<PlannedTest>>,
}

impl TestPlan {
    /// Select and classify tests for a run.
    ///
    /// Definitions for profiles that were not requested are ignored.
    /// Experimental-tagged definitions are left out entirely unless the
    /// environment enables them. Extended tests only execute when the profile
    /// claims extended support.
    pub fn build(
        catalog: &FeatureCatalog,
        definitions: &[TestDefinition],
        resolved: &ResolvedProfiles,
        verdict: &EnvironmentVerdict,
    ) -> ConformanceResult<Self> {
        let mut profiles: BTreeMap<Profile, Vec<PlannedTest>> =
            resolved.profiles().map(|p| (p, Vec::new())).collect();
        let mut seen: BTreeSet<(Profile, &str)> = BTreeSet::new();

        for definition in definitions {
            let Some(active) = resolved.get(definition.profile) else {
                continue;
            };
            if !seen.insert((definition.profile, definition.name.as_str())) {
                return Err(ConfigurationError::DuplicateTest {
                    profile: definition.profile,
                    test: definition.name.clone(),
                }
                .into());
            }
            if let Some(unknown) = definition
                .features
                .iter()
                .find(|f| !catalog.is_known_feature(definition.profile, f))
            {
                return Err(ConfigurationError::UnknownTestFeature {
                    profile: definition.profile,
                    test: definition.name.clone(),
                    feature: unknown.clone(),
                }
                .into());
            }
            if definition.channel == TestChannel::Experimental && !verdict.experimental_enabled {
                continue;
            }

            let disposition = disposition_for(definition, active);
            profiles
                .entry(definition.profile)
                .or_default()
                .push(PlannedTest {
                    definition: definition.clone(),
                    disposition,
                });
        }

        for (profile, tests) in &profiles {
            tracing::debug!(
                %profile,
                planned = tests.len(),
                runnable = tests.iter().filter(|t| t.runnable()).count(),
                "test plan built"
            );
        }
        Ok(Self { profiles })
    }

    /// Planned tests of `profile`, in definition order.
    pub fn tests_for(&self, profile: Profile) -> &[PlannedTest] {
        self.profiles.get(&profile).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        self.profiles.keys().copied()
    }

    /// Number of planned tests for one (profile, level).
    pub fn count(&self, profile: Profile, level: SupportLevel) -> usize {
        self.tests_for(profile)
            .iter()
            .filter(|t| t.definition.level == level)
            .count()
    }

    /// Register every planned test with the aggregator and record the
    /// outcome of tests planned as skipped.
    pub fn register(&self, aggregator: &mut TestRunAggregator) -> ConformanceResult<()> {
        for (profile, tests) in &self.profiles {
            aggregator.ensure_profile(*profile);
            for test in tests {
                aggregator.register(*profile, test.definition.level, &test.definition.name);
            }
            for test in tests.iter().filter(|t| !t.runnable()) {
                aggregator.record_skip(*profile, test.definition.level, &test.definition.name)?;
            }
        }
        Ok(())
    }
}

fn disposition_for(definition: &TestDefinition, active: &ActiveFeatureSet) -> Disposition {
    if definition.level == SupportLevel::Extended && !active.claims_extended() {
        return Disposition::Skip("no extended features claimed".to_string());
    }
    match definition.features.iter().find(|f| !active.is_active(f)) {
        Some(missing) => Disposition::Skip(format!("feature {} not supported", missing)),
        None => Disposition::Run,
    }
}
