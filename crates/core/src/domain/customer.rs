use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rates::{Metal, RateOrigin};
use crate::domain::session::CustomerId;

/// Latest-known state of one customer as shown in the operator inbox.
/// Mutated by the state machine and the handoff controller; read by the
/// dashboard and the handoff gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxRecord {
    pub customer: CustomerId,
    pub last_query: Option<String>,
    pub last_contact: Option<DateTime<Utc>>,
    pub intent: Option<String>,
    pub metal: Option<Metal>,
    pub grams: Option<Decimal>,
    pub budget: Option<String>,
    pub quoted_price: Option<Decimal>,
    pub price_source: Option<RateOrigin>,
    pub requires_owner_action: bool,
    pub bot_enabled: bool,
    pub handoff_at: Option<DateTime<Utc>>,
    pub handoff_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl InboxRecord {
    pub fn new(customer: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            customer,
            last_query: None,
            last_contact: None,
            intent: None,
            metal: None,
            grams: None,
            budget: None,
            quoted_price: None,
            price_source: None,
            requires_owner_action: false,
            bot_enabled: true,
            handoff_at: None,
            handoff_reason: None,
            updated_at: now,
        }
    }
}

/// Partial merge applied on top of an inbox record. `None` fields are left
/// untouched by the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboxPatch {
    pub intent: Option<String>,
    pub metal: Option<Metal>,
    pub grams: Option<Decimal>,
    pub budget: Option<String>,
    pub quoted_price: Option<Decimal>,
    pub price_source: Option<RateOrigin>,
    pub requires_owner_action: Option<bool>,
}
