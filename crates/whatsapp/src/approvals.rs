use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use aurum_core::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
use aurum_core::store::{ApprovalStore, StoreError};

/// Error semantics differ per operation and are deliberate:
/// creation failures propagate (a silently lost quote awaiting approval is a
/// business loss), approval returns a plain bool (the operator just retries),
/// and listings degrade to empty (the dashboard shows "no pending items"
/// instead of crashing).
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("could not store approval request: {0}")]
    Create(#[from] StoreError),
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    store: Arc<dyn ApprovalStore>,
}

impl ApprovalWorkflow {
    pub fn new(store: Arc<dyn ApprovalStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: ApprovalRequest) -> Result<ApprovalRequest, ApprovalError> {
        self.store.insert(request.clone()).await?;
        Ok(request)
    }

    /// Approving an already-approved request succeeds again and overwrites
    /// the recorded final price.
    pub async fn approve(&self, id: &ApprovalId, final_price: Decimal, at: DateTime<Utc>) -> bool {
        match self.store.mark_approved(id, final_price, at).await {
            Ok(updated) => updated,
            Err(error) => {
                warn!(request = %id, error = %error, "approval update failed");
                false
            }
        }
    }

    pub async fn find(&self, id: &ApprovalId) -> Option<ApprovalRequest> {
        match self.store.find(id).await {
            Ok(found) => found,
            Err(error) => {
                warn!(request = %id, error = %error, "approval lookup failed");
                None
            }
        }
    }

    pub async fn list_pending(&self) -> Vec<ApprovalRequest> {
        self.list(ApprovalStatus::PendingApproval).await
    }

    pub async fn list_approved(&self) -> Vec<ApprovalRequest> {
        self.list(ApprovalStatus::Approved).await
    }

    async fn list(&self, status: ApprovalStatus) -> Vec<ApprovalRequest> {
        match self.store.list_by_status(status).await {
            Ok(requests) => requests,
            Err(error) => {
                warn!(error = %error, "approval listing failed; returning empty list");
                Vec::new()
            }
        }
    }

    pub async fn pending_count(&self) -> u64 {
        self.store.count_by_status(ApprovalStatus::PendingApproval).await.unwrap_or(0)
    }

    pub async fn total_count(&self) -> u64 {
        self.store.count_all().await.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;

    use aurum_core::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
    use aurum_core::domain::rates::Metal;
    use aurum_core::domain::session::CustomerId;
    use aurum_core::store::{ApprovalStore, StoreError};
    use aurum_db::repositories::InMemoryApprovalStore;

    use super::ApprovalWorkflow;

    struct FailingApprovalStore;

    #[async_trait::async_trait]
    impl ApprovalStore for FailingApprovalStore {
        async fn insert(&self, _request: ApprovalRequest) -> Result<(), StoreError> {
            Err(StoreError::Backend("write refused".to_string()))
        }

        async fn find(&self, _id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn mark_approved(
            &self,
            _id: &ApprovalId,
            _final_price: Decimal,
            _at: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Backend("write refused".to_string()))
        }

        async fn list_by_status(
            &self,
            _status: ApprovalStatus,
        ) -> Result<Vec<ApprovalRequest>, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn count_by_status(&self, _status: ApprovalStatus) -> Result<u64, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }

        async fn count_all(&self) -> Result<u64, StoreError> {
            Err(StoreError::Backend("read refused".to_string()))
        }
    }

    fn estimate(cost: i64) -> ApprovalRequest {
        ApprovalRequest::estimate(
            CustomerId("whatsapp:+919000000001".to_string()),
            Metal::Gold,
            Decimal::from(10),
            "20000".to_string(),
            Decimal::from(cost),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn create_failure_propagates() {
        let workflow = ApprovalWorkflow::new(Arc::new(FailingApprovalStore));
        assert!(workflow.create(estimate(30_000)).await.is_err());
    }

    #[tokio::test]
    async fn approve_is_retriable_not_fatal() {
        let workflow = ApprovalWorkflow::new(Arc::new(FailingApprovalStore));
        let approved =
            workflow.approve(&ApprovalId("any".to_string()), Decimal::from(100), Utc::now()).await;
        assert!(!approved);
    }

    #[tokio::test]
    async fn listing_failure_degrades_to_empty() {
        let workflow = ApprovalWorkflow::new(Arc::new(FailingApprovalStore));
        assert!(workflow.list_pending().await.is_empty());
        assert_eq!(workflow.pending_count().await, 0);
    }

    #[tokio::test]
    async fn reapproval_overwrites_final_price() {
        let workflow = ApprovalWorkflow::new(Arc::new(InMemoryApprovalStore::default()));
        let request = workflow.create(estimate(30_000)).await.expect("create");

        assert!(workflow.approve(&request.id, Decimal::from(28_000), Utc::now()).await);
        assert!(workflow.approve(&request.id, Decimal::from(27_000), Utc::now()).await);

        let stored = workflow.find(&request.id).await.expect("request exists");
        assert_eq!(stored.status, ApprovalStatus::Approved);
        assert_eq!(stored.final_price, Some(Decimal::from(27_000)));
    }
}
