//! In-memory store implementations. They back the turn-router and service
//! tests, and double as the storage layer for ephemeral dev runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use aurum_core::domain::approval::{ApprovalId, ApprovalRequest, ApprovalStatus};
use aurum_core::domain::customer::{InboxPatch, InboxRecord};
use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::session::{CustomerId, Session};
use aurum_core::domain::settings::{OwnerContext, SettingsPatch, StoreSettings};
use aurum_core::store::{
    ApprovalStore, CustomerStore, MessageStore, SessionStore, SettingsStore, StoreError,
};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find(&self, customer: &CustomerId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&customer.0).cloned())
    }

    async fn save(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.customer.0.clone(), session);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCustomerStore {
    records: RwLock<HashMap<String, InboxRecord>>,
}

impl InMemoryCustomerStore {
    async fn upsert_with(
        &self,
        customer: &CustomerId,
        at: DateTime<Utc>,
        mutate: impl FnOnce(&mut InboxRecord),
    ) {
        let mut records = self.records.write().await;
        let record = records
            .entry(customer.0.clone())
            .or_insert_with(|| InboxRecord::new(customer.clone(), at));
        mutate(record);
        record.updated_at = at;
    }
}

#[async_trait::async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find(&self, customer: &CustomerId) -> Result<Option<InboxRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(&customer.0).cloned())
    }

    async fn record_activity(
        &self,
        customer: &CustomerId,
        query: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.upsert_with(customer, at, |record| {
            record.last_query = Some(query.to_string());
            record.last_contact = Some(at);
        })
        .await;
        Ok(())
    }

    async fn merge_metadata(
        &self,
        customer: &CustomerId,
        patch: InboxPatch,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.upsert_with(customer, at, |record| {
            if let Some(intent) = patch.intent {
                record.intent = Some(intent);
            }
            if let Some(metal) = patch.metal {
                record.metal = Some(metal);
            }
            if let Some(grams) = patch.grams {
                record.grams = Some(grams);
            }
            if let Some(budget) = patch.budget {
                record.budget = Some(budget);
            }
            if let Some(quoted_price) = patch.quoted_price {
                record.quoted_price = Some(quoted_price);
            }
            if let Some(price_source) = patch.price_source {
                record.price_source = Some(price_source);
            }
            if let Some(requires_owner_action) = patch.requires_owner_action {
                record.requires_owner_action = requires_owner_action;
            }
        })
        .await;
        Ok(())
    }

    async fn set_handoff(
        &self,
        customer: &CustomerId,
        bot_enabled: bool,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let reason = reason.map(str::to_string);
        self.upsert_with(customer, at, |record| {
            record.bot_enabled = bot_enabled;
            record.requires_owner_action = !bot_enabled;
            record.handoff_at = Some(at);
            record.handoff_reason = reason;
        })
        .await;
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<InboxRecord>, StoreError> {
        let records = self.records.read().await;
        let mut all: Vec<InboxRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| b.last_contact.cmp(&a.last_contact));
        all.truncate(limit as usize);
        Ok(all)
    }
}

#[derive(Default)]
pub struct InMemoryApprovalStore {
    requests: RwLock<Vec<ApprovalRequest>>,
}

#[async_trait::async_trait]
impl ApprovalStore for InMemoryApprovalStore {
    async fn insert(&self, request: ApprovalRequest) -> Result<(), StoreError> {
        let mut requests = self.requests.write().await;
        requests.push(request);
        Ok(())
    }

    async fn find(&self, id: &ApprovalId) -> Result<Option<ApprovalRequest>, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().find(|request| &request.id == id).cloned())
    }

    async fn mark_approved(
        &self,
        id: &ApprovalId,
        final_price: Decimal,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut requests = self.requests.write().await;
        match requests.iter_mut().find(|request| &request.id == id) {
            Some(request) => {
                request.status = ApprovalStatus::Approved;
                request.final_price = Some(final_price);
                request.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ApprovalRequest>, StoreError> {
        let requests = self.requests.read().await;
        let mut matching: Vec<ApprovalRequest> =
            requests.iter().filter(|request| request.status == status).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn count_by_status(&self, status: ApprovalStatus) -> Result<u64, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests.iter().filter(|request| request.status == status).count() as u64)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<MessageRecord>>,
}

impl InMemoryMessageStore {
    pub async fn all(&self) -> Vec<MessageRecord> {
        self.messages.read().await.clone()
    }
}

#[async_trait::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: MessageRecord) -> Result<(), StoreError> {
        let mut messages = self.messages.write().await;
        messages.push(message);
        Ok(())
    }

    async fn history_for(
        &self,
        customer: &CustomerId,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let messages = self.messages.read().await;
        let mut history: Vec<MessageRecord> = messages
            .iter()
            .filter(|message| message.sender == customer.0 || message.recipient == customer.0)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        history.truncate(limit as usize);
        Ok(history)
    }
}

pub struct InMemorySettingsStore {
    settings: RwLock<StoreSettings>,
    context: RwLock<OwnerContext>,
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::with_settings(StoreSettings::default())
    }
}

impl InMemorySettingsStore {
    pub fn with_settings(settings: StoreSettings) -> Self {
        Self { settings: RwLock::new(settings), context: RwLock::new(OwnerContext::default()) }
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> Result<StoreSettings, StoreError> {
        Ok(self.settings.read().await.clone())
    }

    async fn update(&self, patch: SettingsPatch) -> Result<StoreSettings, StoreError> {
        let mut settings = self.settings.write().await;
        patch.apply_to(&mut settings);
        Ok(settings.clone())
    }

    async fn owner_context(&self) -> Result<OwnerContext, StoreError> {
        Ok(self.context.read().await.clone())
    }

    async fn set_owner_context(&self, context: OwnerContext) -> Result<(), StoreError> {
        *self.context.write().await = context;
        Ok(())
    }
}
