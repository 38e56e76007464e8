use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use aurum_core::domain::customer::InboxPatch;
use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::session::CustomerId;
use aurum_core::store::{CustomerStore, MessageStore};

/// Fail-safe activity recording. A lost log entry degrades dashboard
/// observability, never the next turn, so every write here is logged and
/// swallowed.
#[derive(Clone)]
pub struct ActivityLedger {
    messages: Arc<dyn MessageStore>,
    customers: Arc<dyn CustomerStore>,
}

impl ActivityLedger {
    pub fn new(messages: Arc<dyn MessageStore>, customers: Arc<dyn CustomerStore>) -> Self {
        Self { messages, customers }
    }

    /// Appends the inbound text and refreshes last-query/last-contact.
    /// Runs before the handoff gate so handed-off conversations still show
    /// up as active.
    pub async fn record_inbound(&self, customer: &CustomerId, text: &str, at: DateTime<Utc>) {
        if let Err(error) =
            self.messages.append(MessageRecord::inbound(customer.as_str(), text, at)).await
        {
            warn!(customer = %customer, error = %error, "could not append inbound message");
        }
        if let Err(error) = self.customers.record_activity(customer, text, at).await {
            warn!(customer = %customer, error = %error, "could not update customer activity");
        }
    }

    pub async fn record_outbound(&self, message: MessageRecord) {
        if let Err(error) = self.messages.append(message).await {
            warn!(error = %error, "could not append outbound message");
        }
    }

    pub async fn merge_metadata(&self, customer: &CustomerId, patch: InboxPatch, at: DateTime<Utc>) {
        if let Err(error) = self.customers.merge_metadata(customer, patch, at).await {
            warn!(customer = %customer, error = %error, "could not merge inbox metadata");
        }
    }

    /// Dashboard chat history; read trouble degrades to an empty timeline.
    pub async fn history(&self, customer: &CustomerId, limit: u32) -> Vec<MessageRecord> {
        match self.messages.history_for(customer, limit).await {
            Ok(history) => history,
            Err(error) => {
                warn!(customer = %customer, error = %error, "could not load chat history");
                Vec::new()
            }
        }
    }
}
