use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutSessionDto},
    error::AppResult,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_checkout_session))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted payment session created", body = CheckoutSessionDto),
        (status = 400, description = "Empty cart or invalid quantity"),
        (status = 500, description = "Payment processor failure"),
    ),
    tag = "Checkout"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutSessionDto>> {
    let resp = checkout_service::create_session(&state, payload).await?;
    Ok(Json(resp))
}
