//! Error types for Meterline
//!
//! A reporting run surfaces exactly one terminal [`MeterlineError`]. The wrapped
//! domain errors say which phase failed and for which dimension.

use thiserror::Error;

/// Result type alias using MeterlineError
pub type Result<T> = std::result::Result<T, MeterlineError>;

/// Unified error type for Meterline operations
#[derive(Debug, Error)]
pub enum MeterlineError {
    // Collection phase
    #[error("Dimension query error: {0}")]
    DimensionQuery(#[from] DimensionQueryError),

    // Metering client construction
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    // Submission phase
    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    // Model invariants
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`MeterlineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DimensionQuery,
    Setup,
    Submission,
    Validation,
    Config,
    Serialization,
    Internal,
}

impl MeterlineError {
    /// Classify this error without matching on nested variants
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeterlineError::DimensionQuery(_) => ErrorKind::DimensionQuery,
            MeterlineError::Setup(_) => ErrorKind::Setup,
            MeterlineError::Submission(_) => ErrorKind::Submission,
            MeterlineError::Validation(_) => ErrorKind::Validation,
            MeterlineError::Config(_) => ErrorKind::Config,
            MeterlineError::Serialization(_) => ErrorKind::Serialization,
            MeterlineError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// The analytics store failed while computing a dimension
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to query dimension {dimension} for [{start_ms}, {end_ms}): {reason}")]
pub struct DimensionQueryError {
    pub dimension: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub reason: String,
}

/// The metering client could not be constructed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Provider region not set: environment variable {var} is missing or empty")]
    MissingRegion { var: String },

    #[error("Cannot obtain credentials: {0}")]
    Credentials(String),

    #[error("Metering client construction failed: {0}")]
    Client(String),
}

/// The metering provider rejected or did not acknowledge a report
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Metering provider rejected {dimension}: {reason}")]
    Provider { dimension: String, reason: String },

    #[error("Invalid metering record for {dimension}: provider returned no record id")]
    InvalidRecord { dimension: String },

    #[error("Metering call for {dimension} timed out after {elapsed_ms}ms")]
    Timeout { dimension: String, elapsed_ms: u64 },
}

impl SubmissionError {
    /// Dimension of the report that failed
    pub fn dimension(&self) -> &str {
        match self {
            SubmissionError::Provider { dimension, .. }
            | SubmissionError::InvalidRecord { dimension }
            | SubmissionError::Timeout { dimension, .. } => dimension,
        }
    }
}

/// Invariant violations on the data model
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dimension is required")]
    EmptyDimension,

    #[error("usage value cannot be negative: {0}")]
    NegativeValue(i64),

    #[error("window start {start_ms} is after end {end_ms}")]
    InvertedWindow { start_ms: i64, end_ms: i64 },

    #[error("product code is required")]
    EmptyProductCode,
}

// Implement From for common external error types
impl From<serde_json::Error> for MeterlineError {
    fn from(err: serde_json::Error) -> Self {
        MeterlineError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MeterlineError {
    fn from(err: anyhow::Error) -> Self {
        MeterlineError::Internal(err.to_string())
    }
}
