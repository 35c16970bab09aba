//! Metering provider client and service
//!
//! [`MeteringClient`] is the raw "meter usage" call of a billing provider.
//! [`MeteringService`] pairs a client with its [`MeteringServiceConfig`] and turns
//! provider responses into receipts, treating a missing record id as a failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meterline_common::{MeteringServiceConfig, SetupError, SubmissionError, UsageReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::bootstrap::{MeteringClientFactory, ProviderEnvironment};

/// Request sent to the metering provider for one report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringSubmission {
    pub dry_run: bool,
    pub product_code: String,
    pub dimension: String,
    pub value: i64,
    pub timestamp: DateTime<Utc>,
}

impl MeteringSubmission {
    pub fn from_report(report: &UsageReport, config: &MeteringServiceConfig) -> Self {
        Self {
            dry_run: config.dry_run(),
            product_code: config.product_code().to_string(),
            dimension: report.dimension().to_string(),
            value: report.value(),
            timestamp: report.timestamp(),
        }
    }
}

/// Raw provider response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringResponse {
    /// Provider-assigned metering record id
    pub record_id: Option<String>,
}

impl MeteringResponse {
    pub fn accepted(record_id: impl Into<String>) -> Self {
        Self {
            record_id: Some(record_id.into()),
        }
    }
}

/// Errors returned by a metering provider call
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Billing provider's meter-usage operation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeteringClient: Send + Sync {
    async fn meter_usage(
        &self,
        submission: &MeteringSubmission,
    ) -> Result<MeteringResponse, ProviderError>;
}

/// Provider acknowledgement of one submitted report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeteringReceipt {
    pub dimension: String,
    pub value: i64,
    pub timestamp: DateTime<Utc>,
    pub record_id: String,
}

/// Metering client bound to its product configuration
#[derive(Clone)]
pub struct MeteringService {
    client: Arc<dyn MeteringClient>,
    config: MeteringServiceConfig,
    call_timeout: Option<Duration>,
}

impl MeteringService {
    /// Wrap an already constructed client
    pub fn new(client: Arc<dyn MeteringClient>, config: MeteringServiceConfig) -> Self {
        Self {
            client,
            config,
            call_timeout: None,
        }
    }

    /// Resolve a client through `factory`, bounding each call by `call_timeout`
    ///
    /// Fails with [`SetupError`] when no authenticated client can be built; no
    /// service exists in that case.
    #[instrument(skip(factory, config), fields(region = %env.region))]
    pub async fn connect(
        factory: &dyn MeteringClientFactory,
        env: &ProviderEnvironment,
        config: MeteringServiceConfig,
        call_timeout: Option<Duration>,
    ) -> Result<Self, SetupError> {
        let client = factory.connect(env).await.map_err(|e| {
            error!(error = %e, "Failed to construct metering client");
            e
        })?;
        debug!(
            product_code = config.product_code(),
            dry_run = config.dry_run(),
            ?call_timeout,
            "Metering service ready"
        );
        Ok(Self {
            client,
            config,
            call_timeout,
        })
    }

    /// Bound each provider call by `timeout`
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn config(&self) -> &MeteringServiceConfig {
        &self.config
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    /// Send one report to the provider
    #[instrument(skip(self, report), fields(dimension = report.dimension()))]
    pub async fn submit(&self, report: &UsageReport) -> Result<MeteringReceipt, SubmissionError> {
        let submission = MeteringSubmission::from_report(report, &self.config);
        debug!(?submission, "Sending usage record to metering service");

        let call = self.client.meter_usage(&submission);
        let result = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                error!(timeout_ms = limit.as_millis() as u64, "Metering call timed out");
                SubmissionError::Timeout {
                    dimension: submission.dimension.clone(),
                    elapsed_ms: limit.as_millis() as u64,
                }
            })?,
            None => call.await,
        };

        let response = result.map_err(|e| {
            error!(error = %e, "Metering provider rejected usage record");
            SubmissionError::Provider {
                dimension: submission.dimension.clone(),
                reason: e.to_string(),
            }
        })?;

        let record_id = match response.record_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                error!("Metering record id is invalid");
                return Err(SubmissionError::InvalidRecord {
                    dimension: submission.dimension,
                });
            }
        };

        debug!(
            value = submission.value,
            timestamp = %submission.timestamp,
            record_id = %record_id,
            "Sent record to metering service"
        );

        Ok(MeteringReceipt {
            dimension: submission.dimension,
            value: submission.value,
            timestamp: submission.timestamp,
            record_id,
        })
    }
}
