use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    services::order_service,
    state::AppState,
    stripe::{
        signature,
        types::{CheckoutSession, Event},
    },
};

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(stripe_webhook))
}

/// The only writer of new order rows. The payload is untrusted until the
/// signature verifies; after that the processor is always told 2xx so it
/// does not redeliver an event whose payment is already captured.
#[utoipa::path(
    post,
    path = "/api/webhook",
    request_body(content = String, description = "Raw Stripe event payload", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature"),
    ),
    tag = "Webhook"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".into()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("Invalid stripe-signature header".into()))?;

    signature::verify(&body, signature, &state.webhook_secret).map_err(|err| {
        tracing::warn!(error = %err, "webhook signature verification failed");
        AppError::BadRequest("Invalid signature".into())
    })?;

    let event: Event = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "failed to parse webhook event");
        AppError::BadRequest("Invalid event payload".into())
    })?;

    match event.kind.as_str() {
        "checkout.session.completed" => {
            match serde_json::from_value::<CheckoutSession>(event.data.object) {
                Ok(session) => {
                    tracing::info!(session_id = %session.id, "payment completed");
                    if let Err(err) = order_service::record_completed_session(&state, &session).await
                    {
                        // The payment already succeeded; ack so the
                        // processor does not redeliver forever.
                        tracing::error!(session_id = %session.id, error = %err, "failed to record order");
                    }
                }
                Err(err) => {
                    tracing::error!(event_id = %event.id, error = %err, "malformed checkout session object");
                }
            }
        }
        "payment_intent.payment_failed" => {
            tracing::info!(event_id = %event.id, "payment failed");
        }
        other => {
            tracing::debug!(event_type = %other, "unhandled event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
