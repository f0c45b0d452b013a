//! Report compilation.
//!
//! Combines the environment verdict, the resolved feature sets and the
//! aggregated outcomes into one [`ConformanceReport`]. Compilation is a pure
//! function of its inputs: the date is supplied by the caller and every list
//! is emitted in canonical order.

use chrono::{DateTime, Utc};
use conformance_types::{
    ConformanceReport, FeatureName, FeatureOverridePolicy, Implementation, LevelReport,
    LevelResult, Profile, ProfileReport, Statistics, SupportLevel, TestOutcome,
    REPORT_API_VERSION, REPORT_KIND,
};

use crate::aggregator::{LevelTally, ProfileTally, TestRunAggregator};
use crate::catalog::FeatureCatalog;
use crate::error::{ConformanceResult, ReportSerializationError};
use crate::resolver::{ActiveFeatureSet, ResolvedProfiles};
use crate::validator::EnvironmentVerdict;

/// Summary used for an extended level that claims no features.
pub const NO_EXTENDED_SUMMARY: &str = "no extended features supported";

/// Everything the compiler consumes.
pub struct CompileInput<'a> {
    pub verdict: &'a EnvironmentVerdict,
    pub resolved: &'a ResolvedProfiles,
    pub aggregator: &'a TestRunAggregator,
    pub implementation: &'a Implementation,
    pub date: DateTime<Utc>,
    pub mode: &'a str,
}

/// Builds canonical reports.
pub struct ReportCompiler<'a> {
    catalog: &'a FeatureCatalog,
}

impl<'a> ReportCompiler<'a> {
    pub fn new(catalog: &'a FeatureCatalog) -> Self {
        Self { catalog }
    }

    pub fn compile(&self, input: CompileInput<'_>) -> ConformanceResult<ConformanceReport> {
        let mut profiles = Vec::new();
        // ResolvedProfiles is keyed by Profile, so iteration is canonical.
        for (profile, active) in &input.resolved.sets {
            let tally = input
                .aggregator
                .tally(*profile)
                .ok_or(ReportSerializationError::MissingProfileData(*profile))?;
            profiles.push(self.profile_report(&input.resolved.policy, active, tally)?);
        }

        let report = ConformanceReport {
            api_version: REPORT_API_VERSION.to_string(),
            kind: REPORT_KIND.to_string(),
            implementation: input.implementation.clone(),
            date: input.date,
            gateway_api_version: input.verdict.version.clone(),
            gateway_api_channel: input.verdict.channel.clone(),
            mode: input.mode.to_string(),
            profiles,
        };
        report
            .validate()
            .map_err(ReportSerializationError::InvalidReport)?;

        tracing::info!(
            organization = %report.implementation.organization,
            project = %report.implementation.project,
            profiles = report.profiles.len(),
            "conformance report compiled"
        );
        Ok(report)
    }

    fn profile_report(
        &self,
        policy: &FeatureOverridePolicy,
        active: &ActiveFeatureSet,
        tally: &ProfileTally,
    ) -> ConformanceResult<ProfileReport> {
        let profile = active.profile;
        let core = level_report(profile, SupportLevel::Core, tally.level(SupportLevel::Core), active)?;

        let extended_tally = tally.level(SupportLevel::Extended);
        let catalog_extended = self.catalog.features_for(profile, SupportLevel::Extended)?;
        let extended = if catalog_extended.is_empty() && extended_tally.registered() == 0 {
            None
        } else {
            let mut report = level_report(profile, SupportLevel::Extended, extended_tally, active)?;
            match policy {
                FeatureOverridePolicy::OptIn(_) => {
                    report.supported_features = sorted(active.extended.iter());
                }
                FeatureOverridePolicy::OptOut(disclaimed) => {
                    report.unsupported_features =
                        sorted(catalog_extended.intersection(disclaimed));
                }
                FeatureOverridePolicy::None => {}
            }
            Some(report)
        };

        Ok(ProfileReport {
            name: profile,
            core,
            extended,
        })
    }
}

fn level_report(
    profile: Profile,
    level: SupportLevel,
    tally: &LevelTally,
    active: &ActiveFeatureSet,
) -> ConformanceResult<LevelReport> {
    if tally.pending() > 0 {
        return Err(ReportSerializationError::PendingOutcomes {
            profile,
            level,
            pending: tally.pending(),
        }
        .into());
    }
    let statistics = tally.statistics();
    if statistics.total() as usize != tally.registered() {
        return Err(ReportSerializationError::CountMismatch {
            profile,
            level,
            counted: statistics.total(),
            registered: tally.registered(),
        }
        .into());
    }

    let result = tally.result().unwrap_or(LevelResult::Skipped);
    let skipped_tests = if result == LevelResult::Skipped {
        Vec::new()
    } else {
        tally.tests_with(TestOutcome::Skipped)
    };

    Ok(LevelReport {
        result,
        summary: summary(level, result, statistics, active),
        statistics,
        skipped_tests,
        failed_tests: tally.tests_with(TestOutcome::Failed),
        supported_features: Vec::new(),
        unsupported_features: Vec::new(),
    })
}

fn summary(
    level: SupportLevel,
    result: LevelResult,
    statistics: Statistics,
    active: &ActiveFeatureSet,
) -> String {
    match result {
        LevelResult::Success => format!("{} tests succeeded.", level.label()),
        LevelResult::Partial => format!(
            "{} tests partially succeeded with {} test skips.",
            level.label(),
            statistics.skipped
        ),
        LevelResult::Failed => format!(
            "{} tests failed with {} test failures.",
            level.label(),
            statistics.failed
        ),
        LevelResult::Skipped => {
            if level == SupportLevel::Extended && !active.claims_extended() {
                NO_EXTENDED_SUMMARY.to_string()
            } else {
                format!("{} tests were not run.", level.label())
            }
        }
    }
}

fn sorted<'f>(features: impl Iterator<Item = &'f FeatureName>) -> Vec<FeatureName> {
    let mut out: Vec<FeatureName> = features.cloned().collect();
    out.sort();
    out.dedup();
    out
}
