//! Test run aggregation.
//!
//! Outcomes are tallied per (profile, level). Each profile owns an
//! independent [`ProfileTally`], so profiles can be driven from separate tasks
//! and merged back before compilation.

use std::collections::{BTreeMap, BTreeSet};

use conformance_types::{LevelResult, Profile, Statistics, SupportLevel, TestOutcome};

use crate::error::{ConformanceResult, ReportSerializationError};

/// Lifecycle of one (profile, level).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelState {
    /// No tests registered.
    NotRun,
    /// Some registered tests have not reported.
    Running,
    Success,
    Partial,
    Failed,
    Skipped,
}

impl LevelState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LevelState::NotRun | LevelState::Running)
    }
}

impl From<LevelResult> for LevelState {
    fn from(result: LevelResult) -> Self {
        match result {
            LevelResult::Success => LevelState::Success,
            LevelResult::Partial => LevelState::Partial,
            LevelResult::Failed => LevelState::Failed,
            LevelResult::Skipped => LevelState::Skipped,
        }
    }
}

/// Registered tests and reported outcomes of one (profile, level).
#[derive(Clone, Debug, Default)]
pub struct LevelTally {
    registered: BTreeSet<String>,
    outcomes: BTreeMap<String, TestOutcome>,
    statistics: Statistics,
    /// Outcomes reported by an executed test, as opposed to skips recorded
    /// for tests that never ran.
    executed: usize,
}

impl LevelTally {
    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn registered(&self) -> usize {
        self.registered.len()
    }

    /// Number of tests that actually executed.
    pub fn executed(&self) -> usize {
        self.executed
    }

    pub fn pending(&self) -> usize {
        self.registered.len() - self.outcomes.len()
    }

    /// Names of tests that reported `outcome`, sorted.
    pub fn tests_with(&self, outcome: TestOutcome) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, o)| **o == outcome)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn state(&self) -> LevelState {
        if self.registered.is_empty() {
            LevelState::NotRun
        } else if self.pending() > 0 {
            LevelState::Running
        } else if self.executed == 0 {
            LevelState::Skipped
        } else {
            self.statistics.classify().into()
        }
    }

    /// Final result, once every registered test has reported. A level where
    /// no test executed was never attempted and is `Skipped`; otherwise the
    /// result follows from the counts.
    pub fn result(&self) -> Option<LevelResult> {
        match self.state() {
            LevelState::NotRun | LevelState::Skipped => Some(LevelResult::Skipped),
            LevelState::Running => None,
            _ => Some(self.statistics.classify()),
        }
    }

    fn skip_pending(&mut self) -> usize {
        let pending: Vec<String> = self
            .registered
            .iter()
            .filter(|name| !self.outcomes.contains_key(*name))
            .cloned()
            .collect();
        for name in &pending {
            self.outcomes.insert(name.clone(), TestOutcome::Skipped);
            self.statistics.skipped += 1;
        }
        pending.len()
    }
}

/// All tallies of one profile.
#[derive(Clone, Debug)]
pub struct ProfileTally {
    profile: Profile,
    core: LevelTally,
    extended: LevelTally,
}

impl ProfileTally {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            core: LevelTally::default(),
            extended: LevelTally::default(),
        }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn level(&self, level: SupportLevel) -> &LevelTally {
        match level {
            SupportLevel::Core => &self.core,
            SupportLevel::Extended => &self.extended,
        }
    }

    fn level_mut(&mut self, level: SupportLevel) -> &mut LevelTally {
        match level {
            SupportLevel::Core => &mut self.core,
            SupportLevel::Extended => &mut self.extended,
        }
    }

    /// Register a test. Registering the same test twice is a no-op.
    pub fn register(&mut self, level: SupportLevel, test: &str) {
        self.level_mut(level).registered.insert(test.to_string());
    }

    /// Record the outcome reported by an executed test.
    pub fn record(
        &mut self,
        level: SupportLevel,
        test: &str,
        outcome: TestOutcome,
    ) -> ConformanceResult<()> {
        self.record_outcome(level, test, outcome, true)
    }

    /// Record a registered test as skipped without executing it.
    pub fn record_skip(&mut self, level: SupportLevel, test: &str) -> ConformanceResult<()> {
        self.record_outcome(level, test, TestOutcome::Skipped, false)
    }

    fn record_outcome(
        &mut self,
        level: SupportLevel,
        test: &str,
        outcome: TestOutcome,
        executed: bool,
    ) -> ConformanceResult<()> {
        let profile = self.profile;
        let tally = self.level_mut(level);
        if !tally.registered.contains(test) {
            return Err(ReportSerializationError::UnregisteredTest {
                profile,
                level,
                test: test.to_string(),
            }
            .into());
        }
        if tally.outcomes.contains_key(test) {
            return Err(ReportSerializationError::DuplicateOutcome {
                profile,
                level,
                test: test.to_string(),
            }
            .into());
        }

        tally.outcomes.insert(test.to_string(), outcome);
        if executed {
            tally.executed += 1;
        }
        match outcome {
            TestOutcome::Passed => tally.statistics.passed += 1,
            TestOutcome::Failed => {
                tally.statistics.failed += 1;
                tracing::warn!(%profile, %level, test, "test failed");
            }
            TestOutcome::Skipped => tally.statistics.skipped += 1,
        }

        let state = tally.state();
        if state.is_terminal() {
            tracing::debug!(%profile, %level, ?state, "level complete");
        }
        Ok(())
    }

    /// Record every test that has not reported as skipped. Returns how many
    /// were skipped.
    pub fn skip_pending(&mut self) -> usize {
        let skipped = self.core.skip_pending() + self.extended.skip_pending();
        if skipped > 0 {
            tracing::info!(profile = %self.profile, skipped, "unreported tests recorded as skipped");
        }
        skipped
    }
}

/// Aggregated outcomes for a whole run.
#[derive(Clone, Debug, Default)]
pub struct TestRunAggregator {
    profiles: BTreeMap<Profile, ProfileTally>,
}

impl TestRunAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `profile` known even if no tests are registered for it.
    pub fn ensure_profile(&mut self, profile: Profile) -> &mut ProfileTally {
        self.profiles
            .entry(profile)
            .or_insert_with(|| ProfileTally::new(profile))
    }

    pub fn register(&mut self, profile: Profile, level: SupportLevel, test: &str) {
        self.ensure_profile(profile).register(level, test);
    }

    pub fn record(
        &mut self,
        profile: Profile,
        level: SupportLevel,
        test: &str,
        outcome: TestOutcome,
    ) -> ConformanceResult<()> {
        match self.profiles.get_mut(&profile) {
            Some(tally) => tally.record(level, test, outcome),
            None => Err(ReportSerializationError::UnregisteredTest {
                profile,
                level,
                test: test.to_string(),
            }
            .into()),
        }
    }

    pub fn record_skip(
        &mut self,
        profile: Profile,
        level: SupportLevel,
        test: &str,
    ) -> ConformanceResult<()> {
        match self.profiles.get_mut(&profile) {
            Some(tally) => tally.record_skip(level, test),
            None => Err(ReportSerializationError::UnregisteredTest {
                profile,
                level,
                test: test.to_string(),
            }
            .into()),
        }
    }

    /// Cancel the run: every unreported test becomes skipped.
    pub fn skip_pending(&mut self) -> usize {
        self.profiles.values_mut().map(ProfileTally::skip_pending).sum()
    }

    pub fn tally(&self, profile: Profile) -> Option<&ProfileTally> {
        self.profiles.get(&profile)
    }

    pub fn contains(&self, profile: Profile) -> bool {
        self.profiles.contains_key(&profile)
    }

    pub fn profiles(&self) -> impl Iterator<Item = Profile> + '_ {
        self.profiles.keys().copied()
    }

    /// Hand out every profile tally for independent processing.
    pub fn split(&mut self) -> Vec<ProfileTally> {
        std::mem::take(&mut self.profiles).into_values().collect()
    }

    /// Take back a tally produced by [`split`](Self::split).
    pub fn merge(&mut self, tally: ProfileTally) {
        self.profiles.insert(tally.profile, tally);
    }
}
