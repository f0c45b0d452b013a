//! # conformance-engine
//!
//! Decides what an implementation claims, gates the environment it is tested
//! in, tallies test outcomes and compiles the certification report.
//!
//! ## Pipeline
//!
//! ```text
//! RunConfig ──► ProfileResolver ──► ResolvedProfiles ─┐
//!                                                     ├─► TestPlan ──► ConformanceRunner
//! DiscoveredResource ──► VersionValidator ──► Verdict ┘                     │
//!                                                                           ▼
//!                      ConformanceReport ◄── ReportCompiler ◄── TestRunAggregator
//! ```
//!
//! Setup (resolution, gating, planning) either succeeds completely or
//! aborts the run before any test executes. During execution each profile
//! is driven by its own task that owns a disjoint [`ProfileTally`]; the
//! tallies are merged before compilation, so no locking is involved.

pub mod aggregator;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod error;
pub mod plan;
pub mod resolver;
pub mod runner;
pub mod telemetry;
pub mod validator;

pub use aggregator::{LevelState, LevelTally, ProfileTally, TestRunAggregator};
pub use catalog::{implicit_core_features, FeatureCatalog, ProfileFeatures};
pub use compiler::{CompileInput, ReportCompiler, NO_EXTENDED_SUMMARY};
pub use config::{LoggingConfig, RunConfig};
pub use error::{
    ConfigurationError, ConformanceError, ConformanceResult, EnvironmentError,
    ReportSerializationError,
};
pub use plan::{Disposition, PlannedTest, TestChannel, TestDefinition, TestPlan};
pub use resolver::{ActiveFeatureSet, ProfileResolver, ResolvedProfiles};
pub use runner::{CancelHandle, ConformanceRunner, PreparedRun, RunRequest, TestExecutor};
pub use telemetry::init_tracing;
pub use validator::{
    DiscoveredResource, EnvironmentVerdict, VersionValidator, BUNDLE_VERSION_ANNOTATION,
    CHANNEL_ANNOTATION, EXPERIMENTAL_CHANNEL,
};

/// Re-exported vocabulary crate.
pub use conformance_types as types;
