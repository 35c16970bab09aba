//! Usage reporter
//!
//! Submits reports to the metering provider strictly in order, one at a time.
//! The first failed submission ends the pass; later reports are never sent.

use std::sync::atomic::{AtomicU64, Ordering};

use meterline_common::{SubmissionError, UsageReport};
use tracing::{error, info, instrument};

use crate::infra::metering::{MeteringReceipt, MeteringService};

/// Reporter metrics
#[derive(Debug, Default)]
pub struct ReporterMetrics {
    pub submissions_attempted: AtomicU64,
    pub submissions_accepted: AtomicU64,
    pub submissions_failed: AtomicU64,
}

impl ReporterMetrics {
    pub fn attempted(&self) -> u64 {
        self.submissions_attempted.load(Ordering::Relaxed)
    }

    pub fn accepted(&self) -> u64 {
        self.submissions_accepted.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.submissions_failed.load(Ordering::Relaxed)
    }
}

/// Drives report submission through a [`MeteringService`]
pub struct UsageReporter {
    service: MeteringService,
    metrics: ReporterMetrics,
}

impl UsageReporter {
    pub fn new(service: MeteringService) -> Self {
        Self {
            service,
            metrics: ReporterMetrics::default(),
        }
    }

    pub fn service(&self) -> &MeteringService {
        &self.service
    }

    pub fn metrics(&self) -> &ReporterMetrics {
        &self.metrics
    }

    /// Submit `reports` in order, stopping at the first failure
    #[instrument(skip(self, reports), fields(count = reports.len()))]
    pub async fn report(
        &self,
        reports: &[UsageReport],
    ) -> Result<Vec<MeteringReceipt>, SubmissionError> {
        let mut receipts = Vec::with_capacity(reports.len());
        self.report_into(reports, &mut receipts).await?;
        Ok(receipts)
    }

    /// Like [`report`](Self::report), appending receipts to `receipts` as the
    /// provider accepts them so the accepted prefix survives a failure
    pub async fn report_into(
        &self,
        reports: &[UsageReport],
        receipts: &mut Vec<MeteringReceipt>,
    ) -> Result<(), SubmissionError> {
        for (sent, report) in reports.iter().enumerate() {
            info!(
                dimension = report.dimension(),
                value = report.value(),
                timestamp = %report.timestamp(),
                "Reporting usage"
            );
            self.metrics.submissions_attempted.fetch_add(1, Ordering::Relaxed);

            match self.service.submit(report).await {
                Ok(receipt) => {
                    self.metrics.submissions_accepted.fetch_add(1, Ordering::Relaxed);
                    receipts.push(receipt);
                }
                Err(err) => {
                    self.metrics.submissions_failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        dimension = report.dimension(),
                        value = report.value(),
                        timestamp = %report.timestamp(),
                        sent,
                        skipped = reports.len() - sent - 1,
                        error = %err,
                        "Usage submission failed, aborting"
                    );
                    return Err(err);
                }
            }
        }

        info!(sent = reports.len(), "All usage reports submitted");
        Ok(())
    }
}
