//! Operator control endpoints consumed by the dashboard UI. Presentation
//! lives elsewhere; these handlers only expose state and the manual-send /
//! approval / handoff controls.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use aurum_core::channel::OutboundMessage;
use aurum_core::domain::approval::{ApprovalId, ApprovalRequest};
use aurum_core::domain::customer::InboxRecord;
use aurum_core::domain::message::MessageRecord;
use aurum_core::domain::session::{CustomerId, SessionMode};
use aurum_core::domain::settings::{SettingsPatch, StoreSettings};
use aurum_core::flows::texts;

use crate::bootstrap::AppState;

const NUDGE_MIN_AGE_HOURS: i64 = 24;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat/{customer}", get(chat_history))
        .route("/send-message", post(send_message))
        .route("/pending", get(pending))
        .route("/approve", post(approve))
        .route("/stats", get(stats))
        .route("/inbox", get(inbox))
        .route("/toggle-bot", post(toggle_bot))
        .route("/bot-status/{customer}", get(bot_status))
        .route("/settings", get(read_settings).post(update_settings))
        .route("/nudge-list", get(nudge_list))
        .route("/nudge", post(nudge))
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

async fn chat_history(
    State(state): State<AppState>,
    Path(customer): Path<String>,
) -> Json<Vec<MessageRecord>> {
    Json(state.ledger.history(&CustomerId(customer), 200).await)
}

#[derive(Debug, Deserialize)]
struct SendMessageRequest {
    customer: String,
    text: String,
}

/// Operator-authored message; bypasses the state machine entirely.
async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let customer = CustomerId(request.customer);
    let now = state.clock.now();

    state
        .ledger
        .record_outbound(MessageRecord::from_owner(customer.as_str(), &request.text, now))
        .await;

    state
        .channel
        .send(&OutboundMessage::text(customer, request.text))
        .await
        .map_err(|error| api_error(StatusCode::BAD_GATEWAY, error.to_string()))?;

    Ok(Json(json!({ "success": true })))
}

async fn pending(State(state): State<AppState>) -> Json<Vec<ApprovalRequest>> {
    Json(state.approvals.list_pending().await)
}

#[derive(Debug, Deserialize)]
struct ApproveRequest {
    id: String,
    #[serde(default)]
    final_price: Option<Decimal>,
}

async fn approve(
    State(state): State<AppState>,
    Json(request): Json<ApproveRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = ApprovalId(request.id);
    let Some(stored) = state.approvals.find(&id).await else {
        return Err(api_error(StatusCode::NOT_FOUND, "Request not found"));
    };

    let Some(price) = request.final_price.or(stored.estimated_cost) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "final_price is required"));
    };

    let now = state.clock.now();
    if !state.approvals.approve(&id, price, now).await {
        return Err(api_error(StatusCode::NOT_FOUND, "Request not found"));
    }

    let notice = texts::approved_price_notice(price);
    state
        .ledger
        .record_outbound(MessageRecord::from_bot(stored.customer.as_str(), &notice, now))
        .await;
    if let Err(error) =
        state.channel.send(&OutboundMessage::text(stored.customer.clone(), notice)).await
    {
        warn!(customer = %stored.customer, error = %error, "approval notice send failed");
    }

    Ok(Json(json!({ "success": true, "id": id.0 })))
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    gold_rate: Decimal,
    silver_rate: Decimal,
    platinum_rate: Decimal,
    rate_source: String,
    pending_count: u64,
    total_requests: u64,
    last_updated: DateTime<Utc>,
}

async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.rates.get_rates().await;
    Json(StatsResponse {
        gold_rate: snapshot.gold,
        silver_rate: snapshot.silver,
        platinum_rate: snapshot.platinum,
        rate_source: snapshot.source.as_str().to_string(),
        pending_count: state.approvals.pending_count().await,
        total_requests: state.approvals.total_count().await,
        last_updated: snapshot.fetched_at,
    })
}

async fn inbox(State(state): State<AppState>) -> Json<Vec<InboxRecord>> {
    match state.customers.list_recent(50).await {
        Ok(records) => Json(records),
        Err(error) => {
            warn!(error = %error, "inbox listing failed; returning empty inbox");
            Json(Vec::new())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToggleBotRequest {
    customer: String,
    mode: String,
}

async fn toggle_bot(
    State(state): State<AppState>,
    Json(request): Json<ToggleBotRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(mode) = SessionMode::parse(&request.mode) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "mode must be `bot` or `agent`"));
    };

    let customer = CustomerId(request.customer);
    let reason = match mode {
        SessionMode::Agent => "operator took over from dashboard",
        SessionMode::Bot => "operator resumed bot from dashboard",
    };
    state.handoff.set_mode(&customer, mode, reason, state.clock.now()).await;

    Ok(Json(json!({ "success": true, "mode": mode.as_str() })))
}

async fn bot_status(
    State(state): State<AppState>,
    Path(customer): Path<String>,
) -> Json<Value> {
    let mode = match state.sessions.find(&CustomerId(customer)).await {
        Ok(Some(session)) => session.mode,
        // Unknown customers and read trouble both present as the default.
        Ok(None) | Err(_) => SessionMode::Bot,
    };
    Json(json!({ "mode": mode.as_str() }))
}

async fn read_settings(State(state): State<AppState>) -> Result<Json<StoreSettings>, ApiError> {
    state
        .settings
        .load()
        .await
        .map(Json)
        .map_err(|error| api_error(StatusCode::SERVICE_UNAVAILABLE, error.to_string()))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<StoreSettings>, ApiError> {
    state
        .settings
        .update(patch)
        .await
        .map(Json)
        .map_err(|error| api_error(StatusCode::SERVICE_UNAVAILABLE, error.to_string()))
}

/// Approved estimates are follow-up candidates once they have aged a day.
async fn nudge_list(State(state): State<AppState>) -> Json<Vec<ApprovalRequest>> {
    Json(state.approvals.list_approved().await)
}

#[derive(Debug, Deserialize)]
struct NudgeRequest {
    id: String,
    #[serde(default)]
    force: bool,
}

async fn nudge(
    State(state): State<AppState>,
    Json(request): Json<NudgeRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = ApprovalId(request.id);
    let Some(stored) = state.approvals.find(&id).await else {
        return Err(api_error(StatusCode::NOT_FOUND, "Request not found"));
    };

    let now = state.clock.now();
    let age_hours = (now - stored.created_at).num_hours();
    if !request.force && age_hours < NUDGE_MIN_AGE_HOURS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Too early to nudge (wait 24h or use force)",
        ));
    }

    let reminder = texts::nudge_reminder();
    state
        .ledger
        .record_outbound(MessageRecord::from_bot(stored.customer.as_str(), &reminder, now))
        .await;
    state
        .channel
        .send(&OutboundMessage::text(stored.customer, reminder))
        .await
        .map_err(|error| api_error(StatusCode::BAD_GATEWAY, error.to_string()))?;

    Ok(Json(json!({ "success": true, "message": "Nudge sent" })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::Json;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use aurum_core::channel::{ChannelError, MessageChannel, OutboundMessage};
    use aurum_core::clock::{Clock, SystemClock};
    use aurum_core::domain::approval::{ApprovalRequest, ApprovalStatus};
    use aurum_core::domain::rates::{FixedRateProvider, Metal, RateSnapshot};
    use aurum_core::domain::session::{CustomerId, SessionMode};
    use aurum_core::domain::settings::StoreSettings;
    use aurum_core::store::{ApprovalStore, SessionStore};
    use aurum_db::repositories::{
        InMemoryApprovalStore, InMemoryCustomerStore, InMemoryMessageStore, InMemorySessionStore,
        InMemorySettingsStore,
    };
    use aurum_whatsapp::approvals::ApprovalWorkflow;
    use aurum_whatsapp::handoff::HandoffController;
    use aurum_whatsapp::ledger::ActivityLedger;
    use aurum_whatsapp::notify::OwnerNotifier;
    use aurum_whatsapp::router::{RouterOptions, TurnRouter, TurnRouterDeps};

    use crate::bootstrap::AppState;

    use super::{
        approve, bot_status, nudge, send_message, stats, toggle_bot, ApproveRequest, NudgeRequest,
        SendMessageRequest, ToggleBotRequest,
    };

    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait::async_trait]
    impl MessageChannel for RecordingChannel {
        async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    struct Fixture {
        state: AppState,
        channel: Arc<RecordingChannel>,
        approvals: Arc<InMemoryApprovalStore>,
        sessions: Arc<InMemorySessionStore>,
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(InMemorySessionStore::default());
        let customers = Arc::new(InMemoryCustomerStore::default());
        let approvals_store = Arc::new(InMemoryApprovalStore::default());
        let messages = Arc::new(InMemoryMessageStore::default());
        let settings = Arc::new(InMemorySettingsStore::with_settings(StoreSettings::default()));
        let channel = Arc::new(RecordingChannel::default());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let rates = Arc::new(FixedRateProvider(RateSnapshot::fallback(Utc::now())));

        let ledger = ActivityLedger::new(messages.clone(), customers.clone());
        let approvals = ApprovalWorkflow::new(approvals_store.clone());
        let notifier = OwnerNotifier::new(channel.clone(), settings.clone());
        let handoff = HandoffController::new(sessions.clone(), customers.clone(), notifier);
        let router = Arc::new(TurnRouter::new(
            TurnRouterDeps {
                sessions: sessions.clone(),
                customers: customers.clone(),
                approvals: approvals_store.clone(),
                messages,
                settings: settings.clone(),
                rates: rates.clone(),
                channel: channel.clone(),
                clock: clock.clone(),
            },
            RouterOptions::default(),
        ));

        let state = AppState {
            router,
            sessions: sessions.clone(),
            customers,
            settings,
            approvals,
            ledger,
            handoff,
            rates,
            channel: channel.clone(),
            clock,
        };

        Fixture { state, channel, approvals: approvals_store, sessions }
    }

    fn pending_estimate(customer: &str) -> ApprovalRequest {
        ApprovalRequest::estimate(
            CustomerId(customer.to_string()),
            Metal::Gold,
            Decimal::from(10),
            "20000".to_string(),
            Decimal::from(69_000),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn approve_records_price_and_notifies_customer() {
        let fx = fixture();
        let request = pending_estimate("whatsapp:+919000000001");
        fx.approvals.insert(request.clone()).await.expect("seed");

        let response = approve(
            State(fx.state.clone()),
            Json(ApproveRequest { id: request.id.0.clone(), final_price: Some(Decimal::from(65_000)) }),
        )
        .await
        .expect("approve succeeds");
        assert_eq!(response.0["success"], true);

        let stored = fx.approvals.find(&request.id).await.expect("find").expect("request");
        assert_eq!(stored.status, ApprovalStatus::Approved);
        assert_eq!(stored.final_price, Some(Decimal::from(65_000)));

        let sent = fx.channel.sent.lock().await;
        assert!(sent[0].body.contains("approved a special price"));
    }

    #[tokio::test]
    async fn approve_defaults_to_the_estimated_cost() {
        let fx = fixture();
        let request = pending_estimate("whatsapp:+919000000001");
        fx.approvals.insert(request.clone()).await.expect("seed");

        approve(State(fx.state.clone()), Json(ApproveRequest { id: request.id.0.clone(), final_price: None }))
            .await
            .expect("approve succeeds");

        let stored = fx.approvals.find(&request.id).await.expect("find").expect("request");
        assert_eq!(stored.final_price, Some(Decimal::from(69_000)));
    }

    #[tokio::test]
    async fn approve_unknown_request_is_not_found() {
        let fx = fixture();
        let error = approve(
            State(fx.state.clone()),
            Json(ApproveRequest { id: "missing".to_string(), final_price: None }),
        )
        .await
        .expect_err("must 404");
        assert_eq!(error.0, axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn toggle_bot_drives_the_handoff_controller() {
        let fx = fixture();

        toggle_bot(
            State(fx.state.clone()),
            Json(ToggleBotRequest {
                customer: "whatsapp:+919000000001".to_string(),
                mode: "agent".to_string(),
            }),
        )
        .await
        .expect("toggle succeeds");

        let session = fx
            .sessions
            .find(&CustomerId("whatsapp:+919000000001".to_string()))
            .await
            .expect("find")
            .expect("session");
        assert_eq!(session.mode, SessionMode::Agent);

        let status = bot_status(
            State(fx.state.clone()),
            Path("whatsapp:+919000000001".to_string()),
        )
        .await;
        assert_eq!(status.0["mode"], "agent");
    }

    #[tokio::test]
    async fn unknown_customer_bot_status_defaults_to_bot() {
        let fx = fixture();
        let status =
            bot_status(State(fx.state.clone()), Path("whatsapp:+919999999999".to_string())).await;
        assert_eq!(status.0["mode"], "bot");
    }

    #[tokio::test]
    async fn send_message_bypasses_flow_and_ledgers_as_owner() {
        let fx = fixture();

        send_message(
            State(fx.state.clone()),
            Json(SendMessageRequest {
                customer: "whatsapp:+919000000001".to_string(),
                text: "we are open till 9 today".to_string(),
            }),
        )
        .await
        .expect("send succeeds");

        let history = fx
            .state
            .ledger
            .history(&CustomerId("whatsapp:+919000000001".to_string()), 10)
            .await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, "owner");

        let sent = fx.channel.sent.lock().await;
        assert_eq!(sent[0].body, "we are open till 9 today");
    }

    #[tokio::test]
    async fn stats_reflect_rates_and_counts() {
        let fx = fixture();
        fx.approvals.insert(pending_estimate("whatsapp:+919000000001")).await.expect("seed");

        let response = stats(State(fx.state.clone())).await;
        assert_eq!(response.0.gold_rate, Decimal::from(7000));
        assert_eq!(response.0.pending_count, 1);
        assert_eq!(response.0.total_requests, 1);
        assert_eq!(response.0.rate_source, "fallback");
    }

    #[tokio::test]
    async fn fresh_approval_cannot_be_nudged_without_force() {
        let fx = fixture();
        let mut request = pending_estimate("whatsapp:+919000000001");
        request.status = ApprovalStatus::Approved;
        fx.approvals.insert(request.clone()).await.expect("seed");

        let error = nudge(
            State(fx.state.clone()),
            Json(NudgeRequest { id: request.id.0.clone(), force: false }),
        )
        .await
        .expect_err("too early");
        assert_eq!(error.0, axum::http::StatusCode::BAD_REQUEST);

        let response = nudge(
            State(fx.state.clone()),
            Json(NudgeRequest { id: request.id.0, force: true }),
        )
        .await
        .expect("forced nudge succeeds");
        assert_eq!(response.0["success"], true);

        let sent = fx.channel.sent.lock().await;
        assert!(sent[0].body.contains("gentle reminder"));
    }
}
