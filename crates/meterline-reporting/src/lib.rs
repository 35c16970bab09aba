//! # Meterline Reporting
//!
//! Computes usage dimensions over a time window and submits them to a metered
//! billing provider.
//!
//! ## Pipeline
//!
//! ```text
//! dimensions ──► UsageCollector ──► [UsageReport] ──► UsageReporter ──► MeteringService
//!                     │                                                    │
//!               DimensionCatalog                                     MeteringClient
//!                     │
//!               AnalyticsSource
//! ```
//!
//! Both phases are sequential and fail fast: the first dimension query error
//! ends collection, and the first rejected submission ends reporting. An
//! unregistered dimension name is not an error; it is reported as zero.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meterline_reporting::{
//!     config::ReportingConfig, DimensionCatalog, InMemoryMeteringClient, MeteringService,
//!     PreparedClientFactory, ReportingRun, UsageCollector, UsageReporter,
//! };
//! # use meterline_reporting::{AnalyticsError, AnalyticsSource, FilterOptions};
//! # struct Store;
//! # #[async_trait::async_trait]
//! # impl AnalyticsSource for Store {
//! #     async fn count_active_entities_for_period(&self, _: i64, _: i64, _: &FilterOptions)
//! #         -> Result<i64, AnalyticsError> { Ok(0) }
//! # }
//! # async fn run() -> meterline_common::Result<()> {
//! let config = ReportingConfig::load()?;
//! let factory = PreparedClientFactory::new(Arc::new(InMemoryMeteringClient::new()));
//! let service = MeteringService::connect(
//!     &factory,
//!     &config.provider_environment()?,
//!     config.metering()?,
//!     config.call_timeout(),
//! )
//! .await?;
//!
//! let collector = UsageCollector::new(Arc::new(DimensionCatalog::standard(Arc::new(Store))));
//! let reporter = UsageReporter::new(service);
//! let window = meterline_common::UsageWindow::hour_ending_at(chrono::Utc::now());
//!
//! let summary = ReportingRun::new(&collector, &reporter)
//!     .execute(config.dimensions.as_slice(), window)
//!     .await?;
//! println!("sent {} reports", summary.receipts.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod infra;

// Re-export core types
pub use domain::catalog::{ActiveEntityCount, DimensionCatalog, DimensionHandler, DimensionValue};
pub use domain::collector::{CollectionOutcome, CollectorStats, UsageCollector};
pub use domain::pipeline::{ReportingRun, RunState, RunSummary};
pub use domain::reporter::{ReporterMetrics, UsageReporter};

// Re-export infrastructure
pub use infra::analytics::{AnalyticsError, AnalyticsSource, FilterOptions};
pub use infra::bootstrap::{MeteringClientFactory, PreparedClientFactory, ProviderEnvironment};
pub use infra::memory_client::InMemoryMeteringClient;
pub use infra::metering::{
    MeteringClient, MeteringReceipt, MeteringResponse, MeteringService, MeteringSubmission,
    ProviderError,
};
