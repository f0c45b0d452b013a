//! Conformance run driver.
//!
//! A run has two phases. Setup resolves the requested profiles, gates on the
//! environment and plans the tests; any error here aborts before a single
//! test executes. Execution then drives every profile in its own task, each
//! owning a disjoint [`ProfileTally`], and the merged tallies are compiled into
//! the report.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conformance_types::{
    ConformanceReport, FeatureOverridePolicy, Implementation, Profile, TestOutcome,
};

use crate::aggregator::{ProfileTally, TestRunAggregator};
use crate::catalog::FeatureCatalog;
use crate::compiler::{CompileInput, ReportCompiler};
use crate::config::RunConfig;
use crate::error::{ConfigurationError, ConformanceError, ConformanceResult};
use crate::plan::{TestDefinition, TestPlan};
use crate::resolver::{ProfileResolver, ResolvedProfiles};
use crate::validator::{DiscoveredResource, EnvironmentVerdict, VersionValidator};

/// Executes individual conformance tests against the implementation.
///
/// Retries and flake handling are the executor's business; the engine
/// records whatever outcome is returned.
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn execute(&self, test: &TestDefinition) -> TestOutcome;
}

/// Cooperative cancellation flag shared by every profile task.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What to certify and for whom.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub profiles: BTreeSet<Profile>,
    pub policy: FeatureOverridePolicy,
    pub implementation: Implementation,
    pub mode: String,
    /// Report date; the current time when absent.
    pub date: Option<DateTime<Utc>>,
}

impl RunRequest {
    pub fn new(
        profiles: impl IntoIterator<Item = Profile>,
        policy: FeatureOverridePolicy,
        implementation: Implementation,
    ) -> Self {
        Self {
            profiles: profiles.into_iter().collect(),
            policy,
            implementation,
            mode: "default".to_string(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}

/// Output of the setup phase.
#[derive(Clone, Debug)]
pub struct PreparedRun {
    pub verdict: EnvironmentVerdict,
    pub resolved: ResolvedProfiles,
    pub plan: TestPlan,
}

/// Drives a conformance run end to end.
pub struct ConformanceRunner {
    catalog: Arc<FeatureCatalog>,
    validator: VersionValidator,
}

impl ConformanceRunner {
    pub fn new(catalog: Arc<FeatureCatalog>, suite_version: impl Into<String>) -> Self {
        Self {
            catalog,
            validator: VersionValidator::new(suite_version),
        }
    }

    /// Build a runner gated on the configured suite version.
    pub fn from_config(
        catalog: Arc<FeatureCatalog>,
        config: &RunConfig,
    ) -> ConformanceResult<Self> {
        let suite_version = config.suite_version.trim();
        if suite_version.is_empty() {
            return Err(ConfigurationError::MissingSuiteVersion.into());
        }
        Ok(Self::new(catalog, suite_version))
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// Setup phase: resolve, gate, plan.
    pub fn prepare(
        &self,
        request: &RunRequest,
        resources: &[DiscoveredResource],
        definitions: &[TestDefinition],
    ) -> ConformanceResult<PreparedRun> {
        let resolved = ProfileResolver::new(&self.catalog).resolve(&request.profiles, &request.policy)?;
        let verdict = self.validator.validate(resources)?;
        let plan = TestPlan::build(&self.catalog, definitions, &resolved, &verdict)?;
        Ok(PreparedRun {
            verdict,
            resolved,
            plan,
        })
    }

    /// Run every planned test and compile the report.
    pub async fn run(
        &self,
        request: &RunRequest,
        resources: &[DiscoveredResource],
        definitions: &[TestDefinition],
        executor: Arc<dyn TestExecutor>,
        cancel: CancelHandle,
    ) -> ConformanceResult<ConformanceReport> {
        tracing::info!(
            organization = %request.implementation.organization,
            project = %request.implementation.project,
            profiles = ?request.profiles,
            "starting conformance run"
        );
        let prepared = self.prepare(request, resources, definitions)?;

        let mut aggregator = TestRunAggregator::new();
        prepared.plan.register(&mut aggregator)?;

        let mut handles = Vec::new();
        for tally in aggregator.split() {
            let tests: Vec<TestDefinition> = prepared
                .plan
                .tests_for(tally.profile())
                .iter()
                .filter(|t| t.runnable())
                .map(|t| t.definition.clone())
                .collect();
            handles.push(tokio::spawn(run_profile(
                tally,
                tests,
                Arc::clone(&executor),
                cancel.clone(),
            )));
        }

        for joined in futures::future::join_all(handles).await {
            let tally = joined.map_err(|e| ConformanceError::Task(e.to_string()))??;
            aggregator.merge(tally);
        }

        let date = request.date.unwrap_or_else(Utc::now);
        let report = ReportCompiler::new(&self.catalog).compile(CompileInput {
            verdict: &prepared.verdict,
            resolved: &prepared.resolved,
            aggregator: &aggregator,
            implementation: &request.implementation,
            date,
            mode: &request.mode,
        })?;

        tracing::info!(cancelled = cancel.is_cancelled(), "conformance run complete");
        Ok(report)
    }
}

async fn run_profile(
    mut tally: ProfileTally,
    tests: Vec<TestDefinition>,
    executor: Arc<dyn TestExecutor>,
    cancel: CancelHandle,
) -> ConformanceResult<ProfileTally> {
    let profile = tally.profile();
    tracing::debug!(%profile, tests = tests.len(), "profile started");
    for test in &tests {
        if cancel.is_cancelled() {
            break;
        }
        let outcome = executor.execute(test).await;
        tracing::debug!(%profile, test = %test.name, %outcome, "test reported");
        tally.record(test.level, &test.name, outcome)?;
    }
    if cancel.is_cancelled() {
        tally.skip_pending();
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProfileFeatures;
    use conformance_types::SupportLevel;

    struct AlwaysPass;

    #[async_trait]
    impl TestExecutor for AlwaysPass {
        async fn execute(&self, _test: &TestDefinition) -> TestOutcome {
            TestOutcome::Passed
        }
    }

    fn runner() -> ConformanceRunner {
        let catalog = FeatureCatalog::new([(
            Profile::Http,
            ProfileFeatures::new(["HTTPRoute"], ["A"]),
        )])
        .unwrap();
        ConformanceRunner::new(Arc::new(catalog), "v1.1.0")
    }

    #[test]
    fn suite_version_comes_from_config() {
        let catalog = Arc::new(FeatureCatalog::standard());
        let config = RunConfig {
            suite_version: " v1.1.0 ".into(),
            ..Default::default()
        };
        let runner = ConformanceRunner::from_config(catalog.clone(), &config).unwrap();
        assert_eq!(runner.validator.suite_version(), "v1.1.0");

        let unset = ConformanceRunner::from_config(catalog, &RunConfig::default());
        assert!(matches!(
            unset,
            Err(ConformanceError::Configuration(
                ConfigurationError::MissingSuiteVersion
            ))
        ));
    }

    #[test]
    fn cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn run_produces_report() {
        let request = RunRequest::new([Profile::Http], FeatureOverridePolicy::None, Implementation::default());
        let definitions = vec![TestDefinition::new("HTTPRouteSimple", Profile::Http, SupportLevel::Core)];
        let resources = vec![DiscoveredResource::new("httproutes", "v1.1.0", "standard")];

        let report = runner()
            .run(&request, &resources, &definitions, Arc::new(AlwaysPass), CancelHandle::new())
            .await
            .unwrap();
        assert_eq!(report.profiles.len(), 1);
        assert_eq!(report.profiles[0].core.statistics.passed, 1);
    }

    #[test]
    fn prepare_fails_before_planning() {
        let request = RunRequest::new([Profile::Http], FeatureOverridePolicy::None, Implementation::default());
        let resources = vec![DiscoveredResource::new("httproutes", "v1.0.0", "standard")];
        let err = runner().prepare(&request, &resources, &[]).unwrap_err();
        assert!(err.is_setup_error());
    }
}
