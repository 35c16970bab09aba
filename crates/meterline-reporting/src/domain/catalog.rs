//! Dimension catalog
//!
//! Registry from dimension name to the handler that computes its count over a
//! [`UsageWindow`]. An unregistered name is not an error: it is reported as
//! [`DimensionValue::Unrecognized`] and billed as zero so one stray name does not
//! block the rest of the batch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use meterline_common::{DimensionQueryError, UsageWindow, ACTIVE_USER_HOURS};
use tracing::{debug, error, warn};

use crate::infra::analytics::{AnalyticsError, AnalyticsSource, FilterOptions};

/// Computes one dimension's count for a window
#[async_trait]
pub trait DimensionHandler: Send + Sync {
    async fn compute(&self, window: &UsageWindow) -> Result<i64, AnalyticsError>;
}

/// Handler counting active entities through an [`AnalyticsSource`]
pub struct ActiveEntityCount {
    source: Arc<dyn AnalyticsSource>,
    options: FilterOptions,
}

impl ActiveEntityCount {
    pub fn new(source: Arc<dyn AnalyticsSource>) -> Self {
        Self::with_options(source, FilterOptions::default())
    }

    pub fn with_options(source: Arc<dyn AnalyticsSource>, options: FilterOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

#[async_trait]
impl DimensionHandler for ActiveEntityCount {
    async fn compute(&self, window: &UsageWindow) -> Result<i64, AnalyticsError> {
        self.source
            .count_active_entities_for_period(
                window.start_millis(),
                window.end_millis(),
                &self.options,
            )
            .await
    }
}

/// Outcome of computing a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionValue {
    Measured(i64),
    Unrecognized,
}

impl DimensionValue {
    /// Count to report; unrecognized dimensions report zero
    pub fn count(&self) -> i64 {
        match self {
            DimensionValue::Measured(count) => *count,
            DimensionValue::Unrecognized => 0,
        }
    }
}

/// Registry of dimension handlers
#[derive(Default, Clone)]
pub struct DimensionCatalog {
    handlers: HashMap<String, Arc<dyn DimensionHandler>>,
}

impl DimensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in dimensions backed by `source`
    pub fn standard(source: Arc<dyn AnalyticsSource>) -> Self {
        Self::new().with(ACTIVE_USER_HOURS, Arc::new(ActiveEntityCount::new(source)))
    }

    /// Register a handler, returning the one it replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn DimensionHandler>,
    ) -> Option<Arc<dyn DimensionHandler>> {
        self.handlers.insert(name.into(), handler)
    }

    pub fn with(mut self, name: impl Into<String>, handler: Arc<dyn DimensionHandler>) -> Self {
        self.register(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered dimension names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Compute `name` over `window`
    pub async fn compute_dimension(
        &self,
        name: &str,
        window: &UsageWindow,
    ) -> Result<DimensionValue, DimensionQueryError> {
        let Some(handler) = self.handlers.get(name) else {
            warn!(dimension = name, "Dimension does not exist, reporting zero");
            return Ok(DimensionValue::Unrecognized);
        };

        let query_error = |reason: String| DimensionQueryError {
            dimension: name.to_string(),
            start_ms: window.start_millis(),
            end_ms: window.end_millis(),
            reason,
        };

        let count = handler.compute(window).await.map_err(|e| {
            error!(
                dimension = name,
                start = %window.start(),
                error = %e,
                "Failed to obtain usage data"
            );
            query_error(e.to_string())
        })?;

        if count < 0 {
            error!(dimension = name, count, "Analytics store returned a negative count");
            return Err(query_error(format!("negative count {}", count)));
        }

        debug!(dimension = name, count, "Computed dimension");
        Ok(DimensionValue::Measured(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;

    struct RecordingSource {
        count: Result<i64, AnalyticsError>,
        calls: Mutex<Vec<(i64, i64, FilterOptions)>>,
    }

    impl RecordingSource {
        fn returning(count: Result<i64, AnalyticsError>) -> Arc<Self> {
            Arc::new(Self {
                count,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AnalyticsSource for RecordingSource {
        async fn count_active_entities_for_period(
            &self,
            start_ms: i64,
            end_ms: i64,
            options: &FilterOptions,
        ) -> Result<i64, AnalyticsError> {
            self.calls.lock().push((start_ms, end_ms, options.clone()));
            self.count.clone()
        }
    }

    fn window() -> UsageWindow {
        UsageWindow::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_active_user_hours_queries_window_millis() {
        let source = RecordingSource::returning(Ok(42));
        let catalog = DimensionCatalog::standard(source.clone());

        let value = catalog
            .compute_dimension(ACTIVE_USER_HOURS, &window())
            .await
            .unwrap();

        assert_eq!(value, DimensionValue::Measured(42));
        let calls = source.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, window().start_millis());
        assert_eq!(calls[0].1, window().end_millis());
        assert_eq!(calls[0].2, FilterOptions::default());
    }

    #[tokio::test]
    async fn test_unrecognized_dimension_is_zero() {
        let source = RecordingSource::returning(Ok(42));
        let catalog = DimensionCatalog::standard(source.clone());

        let value = catalog.compute_dimension("storage-gb", &window()).await.unwrap();

        assert_eq!(value, DimensionValue::Unrecognized);
        assert_eq!(value.count(), 0);
        assert!(source.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_names_dimension_and_period() {
        let source = RecordingSource::returning(Err(AnalyticsError::Unavailable("db down".into())));
        let catalog = DimensionCatalog::standard(source);

        let err = catalog
            .compute_dimension(ACTIVE_USER_HOURS, &window())
            .await
            .unwrap_err();

        assert_eq!(err.dimension, ACTIVE_USER_HOURS);
        assert_eq!(err.start_ms, window().start_millis());
        assert_eq!(err.end_ms, window().end_millis());
        assert!(err.reason.contains("db down"));
    }

    #[tokio::test]
    async fn test_negative_count_is_rejected() {
        let catalog = DimensionCatalog::standard(RecordingSource::returning(Ok(-1)));

        let err = catalog
            .compute_dimension(ACTIVE_USER_HOURS, &window())
            .await
            .unwrap_err();
        assert!(err.reason.contains("negative"));
    }

    #[tokio::test]
    async fn test_custom_dimension_filters() {
        let source = RecordingSource::returning(Ok(3));
        let options = FilterOptions::default().with_bots();
        let catalog = DimensionCatalog::standard(source.clone()).with(
            "bot-hours",
            Arc::new(ActiveEntityCount::with_options(source.clone(), options.clone())),
        );

        assert_eq!(catalog.names(), vec!["active-user-hours", "bot-hours"]);
        assert!(catalog.contains("bot-hours"));

        catalog.compute_dimension("bot-hours", &window()).await.unwrap();
        assert_eq!(source.calls.lock()[0].2, options);
    }

    #[test]
    fn test_register_replaces_handler() {
        let source = RecordingSource::returning(Ok(1));
        let mut catalog = DimensionCatalog::standard(source.clone());

        let previous =
            catalog.register(ACTIVE_USER_HOURS, Arc::new(ActiveEntityCount::new(source)));
        assert!(previous.is_some());
        assert_eq!(catalog.names().len(), 1);
    }
}
