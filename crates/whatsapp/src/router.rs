//! One webhook turn, end to end.
//!
//! Control flow per delivery: idempotency filter → per-customer serializer →
//! owner commands → activity ledger → session load → `"0"` override →
//! handoff gate → flow engine → effect execution → persist → send.
//!
//! Global overrides run in a fixed priority order: owner commands first,
//! the literal `"0"` reset second, the handoff gate third, greetings (inside
//! the engine) last.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use aurum_core::channel::{MessageChannel, OutboundMessage};
use aurum_core::clock::Clock;
use aurum_core::domain::approval::{ApprovalRequest, ApprovalStatus};
use aurum_core::domain::customer::InboxPatch;
use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::rates::{Metal, RateProvider};
use aurum_core::domain::session::{CustomerId, Session, SessionMode};
use aurum_core::domain::settings::StoreSettings;
use aurum_core::flows::{advance, hard_reset, texts, Reply, TurnEffect, TurnOutcome};
use aurum_core::pricing::{buy_estimate, format_inr};
use aurum_core::store::{
    ApprovalStore, CustomerStore, MessageStore, SessionStore, SettingsStore,
};
use rust_decimal::Decimal;

use crate::approvals::{ApprovalError, ApprovalWorkflow};
use crate::dedupe::{DeliveryDeduper, DEFAULT_RETENTION_SECS};
use crate::handoff::HandoffController;
use crate::inbound::{is_owner, InboundDelivery};
use crate::ledger::ActivityLedger;
use crate::notify::{AlertContext, OwnerNotifier};
use crate::owner::OwnerDesk;
use crate::queue::TurnSerializer;

#[derive(Clone, Debug)]
pub struct RouterOptions {
    /// Gate behavior when the customer record cannot be read: `true` keeps
    /// the automated flow answering, `false` silences it.
    pub handoff_fail_open: bool,
    pub dedupe_retention_secs: u64,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { handoff_fail_open: true, dedupe_retention_secs: DEFAULT_RETENTION_SECS }
    }
}

pub struct TurnRouterDeps {
    pub sessions: Arc<dyn SessionStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub approvals: Arc<dyn ApprovalStore>,
    pub messages: Arc<dyn MessageStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub rates: Arc<dyn RateProvider>,
    pub channel: Arc<dyn MessageChannel>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Approval(#[from] ApprovalError),
}

pub struct TurnRouter {
    sessions: Arc<dyn SessionStore>,
    customers: Arc<dyn CustomerStore>,
    settings: Arc<dyn SettingsStore>,
    rates: Arc<dyn RateProvider>,
    channel: Arc<dyn MessageChannel>,
    clock: Arc<dyn Clock>,
    ledger: ActivityLedger,
    approvals: ApprovalWorkflow,
    handoff: HandoffController,
    desk: OwnerDesk,
    notifier: OwnerNotifier,
    deduper: DeliveryDeduper,
    serializer: TurnSerializer,
    handoff_fail_open: bool,
}

impl TurnRouter {
    pub fn new(deps: TurnRouterDeps, options: RouterOptions) -> Self {
        let ledger = ActivityLedger::new(deps.messages.clone(), deps.customers.clone());
        let approvals = ApprovalWorkflow::new(deps.approvals.clone());
        let notifier = OwnerNotifier::new(deps.channel.clone(), deps.settings.clone());
        let handoff = HandoffController::new(
            deps.sessions.clone(),
            deps.customers.clone(),
            notifier.clone(),
        );
        let desk = OwnerDesk::new(
            approvals.clone(),
            deps.settings.clone(),
            deps.channel.clone(),
            ledger.clone(),
        );
        let deduper = DeliveryDeduper::new(deps.clock.clone(), options.dedupe_retention_secs);

        Self {
            sessions: deps.sessions,
            customers: deps.customers,
            settings: deps.settings,
            rates: deps.rates,
            channel: deps.channel,
            clock: deps.clock,
            ledger,
            approvals,
            handoff,
            desk,
            notifier,
            deduper,
            serializer: TurnSerializer::new(),
            handoff_fail_open: options.handoff_fail_open,
        }
    }

    /// Webhook entry point: drops duplicates, serializes turns per sender.
    pub async fn handle_webhook(&self, delivery: InboundDelivery) -> Result<(), TurnError> {
        if !self.deduper.check_and_mark(&delivery.delivery_id) {
            debug!(delivery_id = %delivery.delivery_id, "duplicate delivery dropped");
            return Ok(());
        }

        let lane = delivery.from.clone();
        self.serializer.run(&lane, self.handle_turn(delivery)).await
    }

    async fn handle_turn(&self, delivery: InboundDelivery) -> Result<(), TurnError> {
        let now = self.clock.now();
        let text = delivery.body.trim().to_string();
        let settings = self.load_settings().await;

        if is_owner(&delivery.from, &settings.owner_number) {
            self.desk.handle(&CustomerId(delivery.from), &text, now).await;
            return Ok(());
        }

        let customer = CustomerId(delivery.from);
        info!(
            customer = %customer,
            correlation_id = %delivery.delivery_id,
            "processing customer turn"
        );

        // Ledger and activity update come before the gate so handed-off
        // conversations still surface in the inbox.
        self.ledger.record_inbound(&customer, &text, now).await;

        let session = self.load_session(&customer, now).await;

        if text == "0" {
            let outcome = hard_reset(&session, now);
            return self.finish(&customer, outcome, &settings, now).await;
        }

        if session.mode == SessionMode::Agent || !self.gate_allows_bot(&customer).await {
            debug!(customer = %customer, "handoff gate active; bot stays silent");
            return Ok(());
        }

        let outcome = advance(&session, &text, &settings, now);
        self.finish(&customer, outcome, &settings, now).await
    }

    async fn finish(
        &self,
        customer: &CustomerId,
        outcome: TurnOutcome,
        settings: &StoreSettings,
        now: DateTime<Utc>,
    ) -> Result<(), TurnError> {
        // Session state is persisted before any send: a provider outage must
        // not make the customer re-enter collected data.
        if let Err(error) = self.sessions.save(outcome.session).await {
            warn!(customer = %customer, error = %error, "session save failed");
        }

        let mut replies = outcome.replies;
        for effect in outcome.effects {
            match effect {
                TurnEffect::Handoff { reason } => {
                    self.handoff.set_mode(customer, SessionMode::Agent, &reason, now).await;
                    self.approvals
                        .create(ApprovalRequest::support_request(customer.clone(), now))
                        .await?;
                }
                TurnEffect::ComputeEstimate { metal, item: _, grams, budget } => {
                    let reply =
                        self.run_estimate(customer, metal, grams, budget, settings, now).await?;
                    replies.push(reply);
                }
                TurnEffect::RecordExchange { metal } => {
                    self.ledger
                        .merge_metadata(
                            customer,
                            InboxPatch {
                                intent: Some("exchange_valuation".to_string()),
                                metal: Some(metal),
                                ..InboxPatch::default()
                            },
                            now,
                        )
                        .await;
                }
                TurnEffect::TagStoreLocation => {
                    self.ledger
                        .merge_metadata(
                            customer,
                            InboxPatch {
                                intent: Some("store_location".to_string()),
                                ..InboxPatch::default()
                            },
                            now,
                        )
                        .await;
                }
            }
        }

        for reply in replies {
            self.deliver(customer, reply, now).await;
        }

        Ok(())
    }

    /// Prices the collected buy flow and routes it through the approval
    /// threshold. High-value quotes go to the owner; everything else is
    /// answered immediately and recorded pre-approved.
    async fn run_estimate(
        &self,
        customer: &CustomerId,
        metal: Metal,
        grams: Decimal,
        budget: String,
        settings: &StoreSettings,
        now: DateTime<Utc>,
    ) -> Result<Reply, TurnError> {
        let snapshot = self.rates.get_rates().await;
        let rate = snapshot.per_gram(metal);
        let price = buy_estimate(rate, grams);
        let needs_approval = price > settings.approval_threshold;

        self.ledger
            .merge_metadata(
                customer,
                InboxPatch {
                    intent: Some("purchase_estimate".to_string()),
                    metal: Some(metal),
                    grams: Some(grams),
                    budget: Some(budget.clone()),
                    quoted_price: Some(price),
                    price_source: Some(snapshot.source),
                    requires_owner_action: Some(needs_approval),
                },
                now,
            )
            .await;

        if needs_approval {
            let request = self
                .approvals
                .create(ApprovalRequest::estimate(
                    customer.clone(),
                    metal,
                    grams,
                    budget,
                    price,
                    now,
                ))
                .await?;

            self.notifier
                .alert(
                    &format!(
                        "New Estimate Request (> {}):\n{grams}g {}\nApprox: {}\n\n*Reply 'Approve <Amount>'*",
                        format_inr(settings.approval_threshold),
                        metal.label(),
                        format_inr(price)
                    ),
                    AlertContext {
                        customer: Some(customer.clone()),
                        request_id: Some(request.id.clone()),
                    },
                )
                .await;

            return Ok(Reply::text(texts::pending_approval_reply(grams, metal, price)));
        }

        // Below the threshold the quote is recorded pre-approved; losing
        // that record must not withhold the estimate from the customer.
        let mut request =
            ApprovalRequest::estimate(customer.clone(), metal, grams, budget, price, now);
        request.status = ApprovalStatus::Approved;
        request.final_price = Some(price);
        if let Err(error) = self.approvals.create(request).await {
            warn!(customer = %customer, error = %error, "auto-approved estimate record failed");
        }

        Ok(Reply::text(texts::estimate_reply(grams, metal, price)))
    }

    async fn deliver(&self, customer: &CustomerId, reply: Reply, now: DateTime<Utc>) {
        self.ledger
            .record_outbound(MessageRecord::from_bot(customer.as_str(), &reply.body, now))
            .await;

        let message = OutboundMessage {
            to: customer.clone(),
            body: reply.body,
            media_url: reply.media_url,
        };
        if let Err(error) = self.channel.send(&message).await {
            warn!(customer = %customer, error = %error, "reply send failed");
        }
    }

    async fn load_settings(&self) -> StoreSettings {
        match self.settings.load().await {
            Ok(settings) => settings,
            Err(error) => {
                warn!(error = %error, "settings read failed; using defaults");
                StoreSettings::default()
            }
        }
    }

    async fn load_session(&self, customer: &CustomerId, now: DateTime<Utc>) -> Session {
        match self.sessions.find(customer).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(customer.clone(), now),
            Err(error) => {
                warn!(customer = %customer, error = %error, "session read failed; starting fresh");
                Session::new(customer.clone(), now)
            }
        }
    }

    async fn gate_allows_bot(&self, customer: &CustomerId) -> bool {
        match self.customers.find(customer).await {
            Ok(Some(record)) => record.bot_enabled,
            Ok(None) => true,
            Err(error) => {
                warn!(
                    customer = %customer,
                    error = %error,
                    fail_open = self.handoff_fail_open,
                    "handoff gate read failed"
                );
                self.handoff_fail_open
            }
        }
    }
}
