use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known party names used in the message ledger alongside customer ids.
pub const BOT_PARTY: &str = "bot";
pub const OWNER_PARTY: &str = "owner";
pub const SYSTEM_PARTY: &str = "system";
pub const ADMIN_PARTY: &str = "admin";

/// One ledger entry. Append-only; never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub sender: String,
    pub recipient: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl MessageRecord {
    pub fn inbound(customer: &str, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: customer.to_string(),
            recipient: ADMIN_PARTY.to_string(),
            body: body.into(),
            sent_at: at,
        }
    }

    pub fn from_bot(customer: &str, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: BOT_PARTY.to_string(),
            recipient: customer.to_string(),
            body: body.into(),
            sent_at: at,
        }
    }

    pub fn from_owner(customer: &str, body: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sender: OWNER_PARTY.to_string(),
            recipient: customer.to_string(),
            body: body.into(),
            sent_at: at,
        }
    }
}
