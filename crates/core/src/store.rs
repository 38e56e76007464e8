//! Persistence ports. The SQL implementations live in `aurum-db`; in-memory
//! doubles back the orchestration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
use crate::domain::customer::{InboxPatch, InboxRecord};
use crate::domain::message::MessageRecord;
use crate::domain::session::{CustomerId, Session};
use crate::domain::settings::{OwnerContext, SettingsPatch, StoreSettings};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Per-customer conversation state. Read-then-merge-write semantics with no
/// built-in locking; callers serialize same-customer access.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find(&self, customer: &CustomerId) -> Result<Option<Session>, StoreError>;
    async fn save(&self, session: Session) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn find(&self, customer: &CustomerId) -> Result<Option<InboxRecord>, StoreError>;

    /// Upserts last-query/last-contact for the customer.
    async fn record_activity(
        &self,
        customer: &CustomerId,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Merges flow metadata onto the record, creating it if absent.
    async fn merge_metadata(
        &self,
        customer: &CustomerId,
        patch: InboxPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Flips the bot-enabled flag and records the handoff moment.
    async fn set_handoff(
        &self,
        customer: &CustomerId,
        bot_enabled: bool,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Most recently active customers first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<InboxRecord>, StoreError>;
}

#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn insert(&self, request: ApprovalRequest) -> Result<(), StoreError>;
    async fn find(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError>;

    /// Marks the request approved with the given final price. Returns false
    /// when no such request exists.
    async fn mark_approved(
        &self,
        id: &ApprovalId,
        final_price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ApprovalRequest>, StoreError>;

    async fn count_by_status(&self, status: ApprovalStatus) -> Result<u64, StoreError>;
    async fn count_all(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, message: MessageRecord) -> Result<(), StoreError>;

    /// Everything sent by or to the customer, ascending by time.
    async fn history_for(
        &self,
        customer: &CustomerId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, StoreError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<StoreSettings, StoreError>;
    async fn update(&self, patch: SettingsPatch) -> Result<StoreSettings, StoreError>;
    async fn owner_context(&self) -> Result<OwnerContext, StoreError>;
    async fn set_owner_context(&self, context: OwnerContext) -> Result<(), StoreError>;
}
