//! Reporting window - half-open `[start, end)` interval

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Time interval a usage dimension is aggregated over
///
/// `start` is inclusive and `end` is exclusive. A zero-length window is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct UsageWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawWindow> for UsageWindow {
    type Error = ValidationError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl UsageWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedWindow {
                start_ms: start.timestamp_millis(),
                end_ms: end.timestamp_millis(),
            });
        }
        Ok(Self { start, end })
    }

    /// The most recently completed whole hour before `now`
    pub fn hour_ending_at(now: DateTime<Utc>) -> Self {
        let hour = Duration::hours(1);
        let end = now.duration_trunc(hour).unwrap_or(now);
        Self {
            start: end - hour,
            end,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Start as milliseconds since the Unix epoch
    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// End as milliseconds since the Unix epoch
    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whether `instant` falls inside `[start, end)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}
