//! Provider bootstrap
//!
//! Resolves the provider environment (region) and hands it to a
//! [`MeteringClientFactory`], which owns credential and session acquisition.

use std::sync::Arc;

use async_trait::async_trait;
use meterline_common::SetupError;
use tracing::{debug, warn};

use super::metering::MeteringClient;

/// Default environment variable naming the provider region
pub const DEFAULT_REGION_VAR: &str = "AWS_REGION";

/// Ambient settings needed to reach the metering provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEnvironment {
    pub region: String,
}

impl ProviderEnvironment {
    pub fn new(region: impl Into<String>) -> Result<Self, SetupError> {
        let region = region.into();
        if region.trim().is_empty() {
            return Err(SetupError::MissingRegion {
                var: DEFAULT_REGION_VAR.to_string(),
            });
        }
        Ok(Self { region })
    }

    /// Read the region from the environment variable `var`
    pub fn from_env(var: &str) -> Result<Self, SetupError> {
        match std::env::var(var) {
            Ok(region) if !region.trim().is_empty() => {
                debug!(var, region = %region, "Resolved provider region");
                Ok(Self { region })
            }
            _ => {
                warn!(var, "Provider region is not configured");
                Err(SetupError::MissingRegion {
                    var: var.to_string(),
                })
            }
        }
    }
}

/// Builds an authenticated metering client
#[async_trait]
pub trait MeteringClientFactory: Send + Sync {
    async fn connect(
        &self,
        env: &ProviderEnvironment,
    ) -> Result<Arc<dyn MeteringClient>, SetupError>;
}

/// Factory handing out a client that was constructed elsewhere
pub struct PreparedClientFactory {
    client: Arc<dyn MeteringClient>,
}

impl PreparedClientFactory {
    pub fn new(client: Arc<dyn MeteringClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MeteringClientFactory for PreparedClientFactory {
    async fn connect(
        &self,
        env: &ProviderEnvironment,
    ) -> Result<Arc<dyn MeteringClient>, SetupError> {
        debug!(region = %env.region, "Using prepared metering client");
        Ok(self.client.clone())
    }
}
