use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
use serde::Deserialize;
use tracing::{error, info};

use aurum_whatsapp::inbound::InboundDelivery;

use crate::bootstrap::AppState;

/// Provider webhook payload. Only three fields matter; everything else the
/// provider posts is ignored.
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "MessageSid")]
    pub message_sid: String,
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/", post(receive)).with_state(state)
}

/// Acknowledges immediately with an empty 200 regardless of downstream
/// outcome; the turn itself runs in a spawned task behind the per-customer
/// serializer. Replies travel over the messaging channel, never in this
/// HTTP response.
async fn receive(State(state): State<AppState>, Form(form): Form<WebhookForm>) -> StatusCode {
    info!(
        event_name = "ingress.webhook.delivery_received",
        correlation_id = %form.message_sid,
        "received webhook delivery"
    );

    let delivery = InboundDelivery {
        delivery_id: form.message_sid,
        from: form.from,
        body: form.body,
    };

    let router = state.router.clone();
    tokio::spawn(async move {
        let correlation_id = delivery.delivery_id.clone();
        if let Err(turn_error) = router.handle_webhook(delivery).await {
            error!(
                event_name = "turn.processing_failed",
                correlation_id = %correlation_id,
                error = %turn_error,
                "webhook turn failed"
            );
        }
    });

    StatusCode::OK
}
