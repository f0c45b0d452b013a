//! # conformance-types
//!
//! Shared vocabulary for Gateway API conformance certification.
//!
//! ## Profiles and support levels
//!
//! A [`Profile`] is a closed category of tests for one API surface (HTTP,
//! GRPC, TLSPassthrough, TCP, UDP). Every profile owns two disjoint feature
//! sets:
//!
//! - **Core**: mandatory, always claimed, never reducible
//! - **Extended**: optional, claimed through a [`FeatureOverridePolicy`]
//!
//! ## Reports
//!
//! [`ConformanceReport`] is the portable record an implementation submits.
//! Its serialized form is canonical: profiles appear in [`Profile::ALL`]
//! order and every feature/test list is sorted, so two reports built from the
//! same inputs serialize byte-for-byte identically.

pub mod error;
pub mod feature;
pub mod outcome;
pub mod policy;
pub mod profile;
pub mod report;

pub use error::TypesError;
pub use feature::FeatureName;
pub use outcome::{LevelResult, TestOutcome};
pub use policy::{FeatureOverridePolicy, PolicyKind};
pub use profile::{Profile, SupportLevel};
pub use report::{
    ConformanceReport, Implementation, LevelReport, ProfileReport, Statistics,
    REPORT_API_VERSION, REPORT_KIND,
};
