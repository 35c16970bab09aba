//! # Meterline Common
//!
//! Shared data model and error taxonomy for the Meterline usage reporting pipeline.
//!
//! ## Core Types
//!
//! - [`UsageReport`]: a single dimension's count for a period, ready for submission
//! - [`UsageWindow`]: half-open `[start, end)` interval a report covers
//! - [`MeteringServiceConfig`]: dry-run flag and product code for a metering provider
//!
//! ## Errors
//!
//! - [`MeterlineError`]: terminal error of a reporting run
//! - [`DimensionQueryError`], [`SetupError`], [`SubmissionError`], [`ValidationError`]

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    DimensionQueryError, ErrorKind, MeterlineError, Result, SetupError, SubmissionError,
    ValidationError,
};
pub use types::{
    metering_config::MeteringServiceConfig, usage_report::UsageReport, usage_window::UsageWindow,
};

/// Meterline version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dimension billed for hours of active users
pub const ACTIVE_USER_HOURS: &str = "active-user-hours";

/// One hour in milliseconds
pub const HOUR_MS: i64 = 3_600_000;
