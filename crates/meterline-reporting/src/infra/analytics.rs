//! Analytics source
//!
//! The count store that backs every dimension. Periods are passed as
//! milliseconds since the Unix epoch, `[start_ms, end_ms)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Filters applied when counting entities for a period
///
/// The default value is the empty filter: every regular, non-deleted user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Count bot accounts too
    pub include_bots: bool,
    /// Count deactivated accounts too
    pub include_deleted: bool,
    /// Restrict to members of a single team
    pub team_id: Option<String>,
    /// Restrict to users holding any of these roles
    pub roles: Vec<String>,
}

impl FilterOptions {
    pub fn with_bots(mut self) -> Self {
        self.include_bots = true;
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn for_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }
}

/// Errors from the analytics store
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Analytics store unavailable: {0}")]
    Unavailable(String),

    #[error("Analytics query failed: {0}")]
    Query(String),
}

/// Count store the dimension handlers query
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Number of entities active during `[start_ms, end_ms)`
    async fn count_active_entities_for_period(
        &self,
        start_ms: i64,
        end_ms: i64,
        options: &FilterOptions,
    ) -> Result<i64, AnalyticsError>;
}
