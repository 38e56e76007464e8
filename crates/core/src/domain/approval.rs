use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rates::Metal;
use crate::domain::session::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub String);

impl ApprovalId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    Estimate,
    SupportRequest,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::SupportRequest => "support_request",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "estimate" => Some(Self::Estimate),
            "support_request" => Some(Self::SupportRequest),
            _ => None,
        }
    }
}

/// Status is monotonic: `PendingApproval` → `Approved`, no other transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    PendingApproval,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }
}

/// A quote (or expert-chat request) awaiting operator sign-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    pub customer: CustomerId,
    pub kind: ApprovalKind,
    pub metal: Option<Metal>,
    pub grams: Option<Decimal>,
    pub budget: Option<String>,
    pub estimated_cost: Option<Decimal>,
    pub status: ApprovalStatus,
    pub final_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn estimate(
        customer: CustomerId,
        metal: Metal,
        grams: Decimal,
        budget: String,
        estimated_cost: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApprovalId::generate(),
            customer,
            kind: ApprovalKind::Estimate,
            metal: Some(metal),
            grams: Some(grams),
            budget: Some(budget),
            estimated_cost: Some(estimated_cost),
            status: ApprovalStatus::PendingApproval,
            final_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn support_request(customer: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApprovalId::generate(),
            customer,
            kind: ApprovalKind::SupportRequest,
            metal: None,
            grams: None,
            budget: None,
            estimated_cost: None,
            status: ApprovalStatus::PendingApproval,
            final_price: None,
            created_at: now,
            updated_at: now,
        }
    }
}
