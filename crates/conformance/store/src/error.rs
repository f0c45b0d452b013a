//! Store error types

use chrono::{DateTime, Utc};
use conformance_types::TypesError;
use thiserror::Error;

/// Report store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report for {organization}/{project} dated {attempted} is not later than the last stored report ({last})")]
    OutOfOrder {
        organization: String,
        project: String,
        last: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },

    #[error("history filed at {expected} contains a report for {found}")]
    MixedHistory { expected: String, found: String },

    #[error("invalid report: {0}")]
    InvalidReport(#[from] TypesError),

    #[error("invalid report address: {0}")]
    InvalidAddress(String),

    #[error("failed to render report: {0}")]
    Render(String),

    #[error("failed to parse report: {0}")]
    Parse(String),
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
