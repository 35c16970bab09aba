//! Usage collector
//!
//! Computes each requested dimension in order and packages the counts into
//! [`UsageReport`]s stamped with the window start. The first query failure
//! stops the batch; reports gathered before it are kept for diagnostics.

use std::sync::Arc;

use meterline_common::{DimensionQueryError, UsageReport, UsageWindow};
use tracing::{debug, error, info, instrument, warn};

use super::catalog::{DimensionCatalog, DimensionValue};

/// Counters for one collection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Dimensions handed to the catalog
    pub attempted: usize,
    /// Dimensions the catalog did not know, reported as zero
    pub unrecognized: usize,
    /// Blank names dropped without a report
    pub skipped: usize,
}

/// Reports collected for a window, plus the error that cut collection short
#[derive(Debug, Clone)]
pub struct CollectionOutcome {
    pub reports: Vec<UsageReport>,
    /// Number of dimensions requested
    pub requested: usize,
    pub stats: CollectorStats,
    pub error: Option<DimensionQueryError>,
}

impl CollectionOutcome {
    /// True when no query failed
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<UsageReport>, DimensionQueryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.reports),
        }
    }
}

/// Turns dimension names into usage reports
pub struct UsageCollector {
    catalog: Arc<DimensionCatalog>,
}

impl UsageCollector {
    pub fn new(catalog: Arc<DimensionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &DimensionCatalog {
        &self.catalog
    }

    /// Collect `dimensions` over `window`, preserving input order
    #[instrument(
        skip(self, dimensions),
        fields(start_ms = window.start_millis(), end_ms = window.end_millis())
    )]
    pub async fn collect<S: AsRef<str>>(
        &self,
        dimensions: &[S],
        window: &UsageWindow,
    ) -> CollectionOutcome {
        let mut outcome = CollectionOutcome {
            reports: Vec::with_capacity(dimensions.len()),
            requested: dimensions.len(),
            stats: CollectorStats::default(),
            error: None,
        };

        info!(start = %window.start(), dimensions = dimensions.len(), "Collecting usage");

        for dimension in dimensions {
            let dimension = dimension.as_ref();
            if dimension.trim().is_empty() {
                warn!("Skipping blank dimension name");
                outcome.stats.skipped += 1;
                continue;
            }

            outcome.stats.attempted += 1;
            let value = match self.catalog.compute_dimension(dimension, window).await {
                Ok(value) => value,
                Err(err) => {
                    error!(
                        dimension,
                        collected = outcome.reports.len(),
                        "Failed to obtain usage, aborting collection"
                    );
                    outcome.error = Some(err);
                    return outcome;
                }
            };
            if value == DimensionValue::Unrecognized {
                outcome.stats.unrecognized += 1;
            }

            match UsageReport::new(dimension, value.count(), window.start()) {
                Ok(report) => {
                    debug!(%report, "Collected usage report");
                    outcome.reports.push(report);
                }
                Err(err) => {
                    // Catalog counts are non-negative and blank names were skipped above.
                    error!(dimension, error = %err, "Dropping invalid usage report");
                    outcome.stats.skipped += 1;
                }
            }
        }

        info!(
            reports = outcome.reports.len(),
            unrecognized = outcome.stats.unrecognized,
            "Usage collection finished"
        );
        outcome
    }
}
