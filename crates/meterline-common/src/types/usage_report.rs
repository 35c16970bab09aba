//! Usage report - one dimension's count for a reporting period
//!
//! The canonical text form is compact JSON with fields in the order
//! `dimension`, `value`, `timestamp`. Timestamps are RFC 3339 in UTC and keep
//! sub-second digits, so a report decodes back to an identical value.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MeterlineError, Result, ValidationError};

/// Count of a usage dimension for the period starting at `timestamp`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUsageReport")]
pub struct UsageReport {
    dimension: String,
    value: i64,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawUsageReport {
    dimension: String,
    value: i64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<RawUsageReport> for UsageReport {
    type Error = ValidationError;

    fn try_from(raw: RawUsageReport) -> std::result::Result<Self, Self::Error> {
        Self::new(raw.dimension, raw.value, raw.timestamp)
    }
}

impl UsageReport {
    /// Create a report, rejecting an empty dimension or a negative value
    pub fn new(
        dimension: impl Into<String>,
        value: i64,
        timestamp: DateTime<Utc>,
    ) -> std::result::Result<Self, ValidationError> {
        let dimension = dimension.into();
        if dimension.is_empty() {
            return Err(ValidationError::EmptyDimension);
        }
        if value < 0 {
            return Err(ValidationError::NegativeValue(value));
        }
        Ok(Self {
            dimension,
            value,
            timestamp,
        })
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Start of the period this value represents
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encode to the canonical JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the canonical JSON form, re-checking invariants
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MeterlineError::Serialization(e.to_string()))
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
