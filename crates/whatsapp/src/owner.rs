//! Chat commands the store owner issues from their own number. These run
//! before any customer logic and never touch the target customer's session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use aurum_core::channel::{MessageChannel, OutboundMessage};
use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::session::CustomerId;
use aurum_core::domain::settings::SettingsPatch;
use aurum_core::flows::texts;
use aurum_core::pricing::format_inr;
use aurum_core::store::SettingsStore;

use crate::approvals::ApprovalWorkflow;
use crate::ledger::ActivityLedger;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerCommand {
    Reply { target: Option<CustomerId>, text: String },
    Approve { amount: Option<Decimal> },
    SetThreshold { value: Option<Decimal> },
    SetGold { value: Option<Decimal> },
    Status,
    Help,
    /// Anything unrecognized is forwarded to the owner-context customer.
    Forward { text: String },
}

pub fn parse_owner_command(raw: &str) -> OwnerCommand {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();

    if let Some(rest) = lower.strip_prefix("approve") {
        return OwnerCommand::Approve { amount: parse_amount(rest) };
    }
    if lower.starts_with("reply") || lower.starts_with("chat") {
        let remainder = trimmed.splitn(2, char::is_whitespace).nth(1).unwrap_or("").trim();
        let mut parts = remainder.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or("");
        if looks_like_customer(head) {
            return OwnerCommand::Reply {
                target: Some(CustomerId(head.to_string())),
                text: parts.next().unwrap_or("").trim().to_string(),
            };
        }
        return OwnerCommand::Reply { target: None, text: remainder.to_string() };
    }
    if lower == "status" {
        return OwnerCommand::Status;
    }
    if lower == "help" {
        return OwnerCommand::Help;
    }
    if let Some(rest) = lower.strip_prefix("set threshold") {
        return OwnerCommand::SetThreshold { value: parse_amount(rest) };
    }
    if let Some(rest) = lower.strip_prefix("set gold") {
        return OwnerCommand::SetGold { value: parse_amount(rest) };
    }

    OwnerCommand::Forward { text: trimmed.to_string() }
}

/// `15000`, `₹15,000`, and `15000.50` all parse; zero and below do not.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String =
        raw.trim().chars().filter(|ch| ch.is_ascii_digit() || *ch == '.').collect();
    let amount: Decimal = cleaned.parse().ok()?;
    (amount > Decimal::ZERO).then_some(amount)
}

fn looks_like_customer(token: &str) -> bool {
    if token.starts_with("whatsapp:") || token.starts_with('+') {
        return true;
    }
    token.len() >= 10 && token.chars().all(|ch| ch.is_ascii_digit())
}

/// Executes owner commands. All sends go back over the same channel; every
/// failure is logged and dropped so the owner can simply retry.
#[derive(Clone)]
pub struct OwnerDesk {
    approvals: ApprovalWorkflow,
    settings: Arc<dyn SettingsStore>,
    channel: Arc<dyn MessageChannel>,
    ledger: ActivityLedger,
}

impl OwnerDesk {
    pub fn new(
        approvals: ApprovalWorkflow,
        settings: Arc<dyn SettingsStore>,
        channel: Arc<dyn MessageChannel>,
        ledger: ActivityLedger,
    ) -> Self {
        Self { approvals, settings, channel, ledger }
    }

    pub async fn handle(&self, owner: &CustomerId, input: &str, now: DateTime<Utc>) {
        match parse_owner_command(input) {
            OwnerCommand::Reply { target, text } => self.reply(owner, target, text, now).await,
            OwnerCommand::Approve { amount } => self.approve(owner, amount, now).await,
            OwnerCommand::SetThreshold { value } => self.set_threshold(owner, value).await,
            OwnerCommand::SetGold { value } => self.set_gold(owner, value).await,
            OwnerCommand::Status => self.status(owner).await,
            OwnerCommand::Help => {
                self.tell(owner, help_text()).await;
            }
            OwnerCommand::Forward { text } => self.forward(owner, text, now).await,
        }
    }

    async fn reply(
        &self,
        owner: &CustomerId,
        target: Option<CustomerId>,
        text: String,
        now: DateTime<Utc>,
    ) {
        let Some(target) = (match target {
            Some(explicit) => Some(explicit),
            None => self.context_customer().await,
        }) else {
            self.tell(owner, "❌ No active customer context. Wait for a message.".to_string())
                .await;
            return;
        };

        if text.is_empty() {
            self.tell(owner, "❌ Usage: Reply <Customer> <Message>".to_string()).await;
            return;
        }

        self.ledger.record_outbound(MessageRecord::from_owner(target.as_str(), &text, now)).await;
        self.send(&target, text.clone()).await;
        self.tell(owner, format!("📤 Sent to {target}: \"{text}\"")).await;
    }

    async fn approve(&self, owner: &CustomerId, amount: Option<Decimal>, now: DateTime<Utc>) {
        let Some(amount) = amount else {
            self.tell(owner, "❌ Usage: 'Approve <Amount>' (for the last request)".to_string())
                .await;
            return;
        };

        let context = self.settings.owner_context().await.unwrap_or_default();
        let Some(request_id) = context.request_id else {
            self.tell(owner, "❌ No pending request in context.".to_string()).await;
            return;
        };

        let Some(request) = self.approvals.find(&request_id).await else {
            self.tell(owner, "❌ Request ID not found or expired.".to_string()).await;
            return;
        };

        if !self.approvals.approve(&request_id, amount, now).await {
            self.tell(owner, "❌ Request ID not found or expired.".to_string()).await;
            return;
        }

        let notice = texts::approved_price_notice(amount);
        self.ledger
            .record_outbound(MessageRecord::from_bot(request.customer.as_str(), &notice, now))
            .await;
        self.send(&request.customer, notice).await;
        self.tell(
            owner,
            format!("✅ Approved request for {} at {}", request.customer, format_inr(amount)),
        )
        .await;
    }

    async fn set_threshold(&self, owner: &CustomerId, value: Option<Decimal>) {
        let Some(value) = value else {
            self.tell(owner, "❌ Invalid value. Usage: Set threshold 20000".to_string()).await;
            return;
        };

        let patch = SettingsPatch { approval_threshold: Some(value), ..SettingsPatch::default() };
        match self.settings.update(patch).await {
            Ok(_) => {
                self.tell(owner, format!("✅ Approval Threshold set to {}", format_inr(value)))
                    .await;
            }
            Err(error) => {
                warn!(error = %error, "threshold update failed");
                self.tell(owner, "❌ Could not update settings. Try again.".to_string()).await;
            }
        }
    }

    async fn set_gold(&self, owner: &CustomerId, value: Option<Decimal>) {
        let Some(value) = value else {
            self.tell(owner, "❌ Invalid value. Usage: Set gold 7800".to_string()).await;
            return;
        };

        let patch = SettingsPatch { manual_gold: Some(value), ..SettingsPatch::default() };
        match self.settings.update(patch).await {
            Ok(_) => {
                self.tell(owner, format!("✅ Manual Gold Rate set to {}/g", format_inr(value)))
                    .await;
            }
            Err(error) => {
                warn!(error = %error, "manual rate update failed");
                self.tell(owner, "❌ Could not update settings. Try again.".to_string()).await;
            }
        }
    }

    async fn status(&self, owner: &CustomerId) {
        let pending = self.approvals.pending_count().await;
        let last_active = self
            .context_customer()
            .await
            .map(|customer| customer.to_string())
            .unwrap_or_else(|| "None".to_string());
        self.tell(
            owner,
            format!("📊 *System Status*\nPending Approvals: {pending}\nLast Active: {last_active}"),
        )
        .await;
    }

    async fn forward(&self, owner: &CustomerId, text: String, now: DateTime<Utc>) {
        let Some(target) = self.context_customer().await else {
            self.tell(owner, "🤖 Owner Mode. Type *Help* for commands.".to_string()).await;
            return;
        };

        self.ledger.record_outbound(MessageRecord::from_owner(target.as_str(), &text, now)).await;
        self.send(&target, text).await;
        self.tell(owner, format!("(Forwarded to {target})")).await;
    }

    async fn context_customer(&self) -> Option<CustomerId> {
        self.settings.owner_context().await.unwrap_or_default().customer
    }

    async fn send(&self, to: &CustomerId, body: String) {
        let message = OutboundMessage::text(to.clone(), body);
        if let Err(error) = self.channel.send(&message).await {
            warn!(to = %to, error = %error, "owner-directed send failed");
        }
    }

    /// Confirmation back to the owner; not ledgered as customer traffic.
    async fn tell(&self, owner: &CustomerId, body: String) {
        self.send(owner, body).await;
    }
}

fn help_text() -> String {
    "👨‍💻 *Owner Commands*\n\n\
     - *Approve [Amount]*: Approve last estimate\n\
     - *Reply [Customer] [Msg]*: Message a customer\n\
     - *Set Threshold [Val]*: Set approval limit\n\
     - *Set Gold [Val]*: Set manual rate\n\
     - *Status*: View stats"
        .to_string()
}
