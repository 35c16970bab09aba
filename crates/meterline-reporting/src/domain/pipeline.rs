//! Reporting run
//!
//! One pass of the pipeline for one window:
//!
//! ```text
//! Idle -> Collecting -> Submitting -> Done
//!            |              |
//!            +--------------+-----> Aborted
//! ```
//!
//! A collection failure aborts before anything is submitted. A submission
//! failure aborts the remaining submissions. A run executes at most once.

use std::fmt;

use meterline_common::{MeterlineError, Result, UsageReport, UsageWindow};
use serde::Serialize;
use tracing::{error, info, instrument};

use super::collector::{CollectorStats, UsageCollector};
use super::reporter::UsageReporter;
use crate::infra::metering::MeteringReceipt;

/// Lifecycle of a reporting run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Collecting,
    Submitting,
    Done,
    Aborted,
}

impl RunState {
    /// Done or Aborted
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Collecting => "collecting",
            RunState::Submitting => "submitting",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub window: UsageWindow,
    pub reports: Vec<UsageReport>,
    pub receipts: Vec<MeteringReceipt>,
    #[serde(skip)]
    pub stats: CollectorStats,
}

/// A single collect-then-report pass
pub struct ReportingRun<'a> {
    collector: &'a UsageCollector,
    reporter: &'a UsageReporter,
    state: RunState,
    reports: Vec<UsageReport>,
    receipts: Vec<MeteringReceipt>,
}

impl<'a> ReportingRun<'a> {
    pub fn new(collector: &'a UsageCollector, reporter: &'a UsageReporter) -> Self {
        Self {
            collector,
            reporter,
            state: RunState::Idle,
            reports: Vec::new(),
            receipts: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Reports collected so far, including a partial batch after an abort
    pub fn reports(&self) -> &[UsageReport] {
        &self.reports
    }

    /// Receipts for reports the provider accepted
    pub fn receipts(&self) -> &[MeteringReceipt] {
        &self.receipts
    }

    fn transition(&mut self, next: RunState) {
        info!(from = %self.state, to = %next, "Reporting run state change");
        self.state = next;
    }

    fn abort(&mut self, err: MeterlineError) -> MeterlineError {
        error!(state = %self.state, kind = ?err.kind(), error = %err, "Reporting run aborted");
        self.transition(RunState::Aborted);
        err
    }

    /// Collect `dimensions` over `window` and submit the reports
    #[instrument(
        skip(self, dimensions),
        fields(start_ms = window.start_millis(), end_ms = window.end_millis())
    )]
    pub async fn execute<S: AsRef<str>>(
        &mut self,
        dimensions: &[S],
        window: UsageWindow,
    ) -> Result<RunSummary> {
        if self.state != RunState::Idle {
            return Err(MeterlineError::Internal(format!(
                "reporting run already {}",
                self.state
            )));
        }

        self.transition(RunState::Collecting);
        let outcome = self.collector.collect(dimensions, &window).await;
        let stats = outcome.stats;
        self.reports = outcome.reports;
        if let Some(err) = outcome.error {
            return Err(self.abort(err.into()));
        }

        self.transition(RunState::Submitting);
        if let Err(err) = self
            .reporter
            .report_into(&self.reports, &mut self.receipts)
            .await
        {
            return Err(self.abort(err.into()));
        }

        self.transition(RunState::Done);
        Ok(RunSummary {
            window,
            reports: self.reports.clone(),
            receipts: self.receipts.clone(),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::DimensionCatalog;
    use crate::infra::analytics::{AnalyticsError, AnalyticsSource, FilterOptions};
    use crate::infra::memory_client::InMemoryMeteringClient;
    use crate::infra::metering::MeteringService;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use meterline_common::{ErrorKind, MeteringServiceConfig, ACTIVE_USER_HOURS};
    use std::sync::Arc;

    struct Source(std::result::Result<i64, AnalyticsError>);

    #[async_trait]
    impl AnalyticsSource for Source {
        async fn count_active_entities_for_period(
            &self,
            _start_ms: i64,
            _end_ms: i64,
            _options: &FilterOptions,
        ) -> std::result::Result<i64, AnalyticsError> {
            self.0.clone()
        }
    }

    fn window() -> UsageWindow {
        UsageWindow::hour_ending_at(Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap())
    }

    fn fixture(
        count: std::result::Result<i64, AnalyticsError>,
        client: Arc<InMemoryMeteringClient>,
    ) -> (UsageCollector, UsageReporter) {
        let catalog = DimensionCatalog::standard(Arc::new(Source(count)));
        let config = MeteringServiceConfig::new(true, "prod-8x2k").unwrap();
        (
            UsageCollector::new(Arc::new(catalog)),
            UsageReporter::new(MeteringService::new(client, config)),
        )
    }

    #[tokio::test]
    async fn test_run_completes() {
        let client = Arc::new(InMemoryMeteringClient::new());
        let (collector, reporter) = fixture(Ok(42), client.clone());
        let mut run = ReportingRun::new(&collector, &reporter);

        let summary = run.execute(&[ACTIVE_USER_HOURS], window()).await.unwrap();

        assert_eq!(run.state(), RunState::Done);
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.receipts.len(), 1);
        assert_eq!(client.submissions()[0].value, 42);
        assert_eq!(client.submissions()[0].timestamp, window().start());
    }

    #[tokio::test]
    async fn test_collection_error_submits_nothing() {
        let client = Arc::new(InMemoryMeteringClient::new());
        let (collector, reporter) =
            fixture(Err(AnalyticsError::Unavailable("down".into())), client.clone());
        let mut run = ReportingRun::new(&collector, &reporter);

        let err = run
            .execute(&["mystery", ACTIVE_USER_HOURS], window())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DimensionQuery);
        assert_eq!(run.state(), RunState::Aborted);
        assert_eq!(run.reports().len(), 1);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_submission_error_aborts_run() {
        let client = Arc::new(InMemoryMeteringClient::new().failing_at(2));
        let (collector, reporter) = fixture(Ok(3), client.clone());
        let mut run = ReportingRun::new(&collector, &reporter);

        let err = run
            .execute(&[ACTIVE_USER_HOURS, "mystery", "other"], window())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Submission);
        assert_eq!(run.state(), RunState::Aborted);
        assert_eq!(run.reports().len(), 3);
        assert_eq!(run.receipts().len(), 1);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_run_executes_once() {
        let client = Arc::new(InMemoryMeteringClient::new());
        let (collector, reporter) = fixture(Ok(1), client);
        let mut run = ReportingRun::new(&collector, &reporter);

        run.execute(&[ACTIVE_USER_HOURS], window()).await.unwrap();
        let err = run.execute(&[ACTIVE_USER_HOURS], window()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(run.state().is_terminal());
    }
}
