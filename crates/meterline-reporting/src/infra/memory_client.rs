//! In-memory metering client
//!
//! Records submissions in arrival order and assigns UUIDv7 record ids. Failures
//! can be scripted per call number, which makes it usable for local dry runs and
//! for exercising abort paths.

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::metering::{MeteringClient, MeteringResponse, MeteringSubmission, ProviderError};

/// Metering client that keeps every submission in memory
#[derive(Debug, Default)]
pub struct InMemoryMeteringClient {
    /// Submissions received, including failed ones
    submissions: RwLock<Vec<MeteringSubmission>>,
    /// 1-based call number that fails with a provider error
    fail_at: Option<usize>,
    /// 1-based call number that succeeds without a record id
    omit_record_at: Option<usize>,
}

impl InMemoryMeteringClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `call`-th submission
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    /// Acknowledge the `call`-th submission without a record id
    pub fn omitting_record_at(mut self, call: usize) -> Self {
        self.omit_record_at = Some(call);
        self
    }

    /// Submissions received so far, in order
    pub fn submissions(&self) -> Vec<MeteringSubmission> {
        self.submissions.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.submissions.read().len()
    }
}

#[async_trait]
impl MeteringClient for InMemoryMeteringClient {
    async fn meter_usage(
        &self,
        submission: &MeteringSubmission,
    ) -> Result<MeteringResponse, ProviderError> {
        let call = {
            let mut submissions = self.submissions.write();
            submissions.push(submission.clone());
            submissions.len()
        };

        if self.fail_at == Some(call) {
            return Err(ProviderError::Rejected {
                code: "ThrottlingException".to_string(),
                message: format!("call {} rejected", call),
            });
        }
        if self.omit_record_at == Some(call) {
            return Ok(MeteringResponse::default());
        }

        Ok(MeteringResponse::accepted(Uuid::now_v7().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn submission(dimension: &str) -> MeteringSubmission {
        MeteringSubmission {
            dry_run: true,
            product_code: "prod-8x2k".into(),
            dimension: dimension.into(),
            value: 1,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_records_submissions_in_order() {
        let client = InMemoryMeteringClient::new();

        let first = client.meter_usage(&submission("a")).await.unwrap();
        let second = client.meter_usage(&submission("b")).await.unwrap();

        assert_ne!(first.record_id, second.record_id);
        let dims: Vec<_> = client.submissions().into_iter().map(|s| s.dimension).collect();
        assert_eq!(dims, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let client = InMemoryMeteringClient::new().failing_at(2).omitting_record_at(3);

        assert!(client.meter_usage(&submission("a")).await.is_ok());
        assert!(client.meter_usage(&submission("b")).await.is_err());
        let third = client.meter_usage(&submission("c")).await.unwrap();
        assert!(third.record_id.is_none());
        assert_eq!(client.call_count(), 3);
    }
}
