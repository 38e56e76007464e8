use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rates::Metal;

/// Customer identity as delivered by the messaging provider (phone-shaped,
/// but treated as an opaque string).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Welcome,
    Menu,
    BuyMetal,
    BuyItem,
    BuyGrams,
    BuyBudget,
    ExchangeMetal,
    ExchangeGrams,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Menu => "menu",
            Self::BuyMetal => "buy_metal",
            Self::BuyItem => "buy_item",
            Self::BuyGrams => "buy_grams",
            Self::BuyBudget => "buy_budget",
            Self::ExchangeMetal => "exchange_metal",
            Self::ExchangeGrams => "exchange_grams",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "welcome" => Some(Self::Welcome),
            "menu" => Some(Self::Menu),
            "buy_metal" => Some(Self::BuyMetal),
            "buy_item" => Some(Self::BuyItem),
            "buy_grams" => Some(Self::BuyGrams),
            "buy_budget" => Some(Self::BuyBudget),
            "exchange_metal" => Some(Self::ExchangeMetal),
            "exchange_grams" => Some(Self::ExchangeGrams),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Bot,
    Agent,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Agent => "agent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bot" => Some(Self::Bot),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }
}

/// Fixed item taxonomy used by the buy flow. Unrecognized input maps to
/// `Other` rather than re-prompting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Ring,
    Necklace,
    Bangle,
    Earrings,
    Chain,
    Coin,
    Other,
}

impl ItemCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ring => "Ring",
            Self::Necklace => "Necklace",
            Self::Bangle => "Bangle",
            Self::Earrings => "Earrings",
            Self::Chain => "Chain",
            Self::Coin => "Coin",
            Self::Other => "Other",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ring => "ring",
            Self::Necklace => "necklace",
            Self::Bangle => "bangle",
            Self::Earrings => "earrings",
            Self::Chain => "chain",
            Self::Coin => "coin",
            Self::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ring" => Some(Self::Ring),
            "necklace" => Some(Self::Necklace),
            "bangle" => Some(Self::Bangle),
            "earrings" => Some(Self::Earrings),
            "chain" => Some(Self::Chain),
            "coin" => Some(Self::Coin),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Incrementally populated purchase-inquiry data. Cleared whenever a flow
/// restarts; retained after completion so the last quote context survives
/// the return to the menu.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyFlow {
    pub metal: Option<Metal>,
    pub item_type: Option<ItemCategory>,
    pub grams: Option<Decimal>,
    pub budget: Option<String>,
}

impl BuyFlow {
    pub fn is_empty(&self) -> bool {
        self.metal.is_none()
            && self.item_type.is_none()
            && self.grams.is_none()
            && self.budget.is_none()
    }
}

/// Durable per-customer conversation state. One row per customer, mutated on
/// every turn, never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub customer: CustomerId,
    pub step: FlowStep,
    pub mode: SessionMode,
    pub buy_flow: BuyFlow,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(customer: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            customer,
            step: FlowStep::Welcome,
            mode: SessionMode::Bot,
            buy_flow: BuyFlow::default(),
            updated_at: now,
        }
    }
}
