//! Per-test outcomes and per-level results.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// Outcome of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => write!(f, "passed"),
            TestOutcome::Failed => write!(f, "failed"),
            TestOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

impl FromStr for TestOutcome {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(TestOutcome::Passed),
            "failed" => Ok(TestOutcome::Failed),
            "skipped" => Ok(TestOutcome::Skipped),
            other => Err(TypesError::UnknownOutcome(other.to_string())),
        }
    }
}

/// Qualitative result of one (profile, level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelResult {
    Success,
    Partial,
    Failed,
    Skipped,
}

impl LevelResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelResult::Success => "success",
            LevelResult::Partial => "partial",
            LevelResult::Failed => "failed",
            LevelResult::Skipped => "skipped",
        }
    }
}

impl fmt::Display for LevelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
