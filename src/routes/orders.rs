use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::orders::OrderSummaryResponse,
    error::AppResult,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/by-session/{session_id}", get(get_order_by_session))
}

#[utoipa::path(
    get,
    path = "/api/orders/by-session/{session_id}",
    params(
        ("session_id" = String, Path, description = "Payment session ID")
    ),
    responses(
        (status = 200, description = "Narrow order projection for the confirmation page", body = OrderSummaryResponse),
        (status = 404, description = "No order for this session yet"),
    ),
    tag = "Orders"
)]
pub async fn get_order_by_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<OrderSummaryResponse>> {
    let order = order_service::find_by_session(&state, &session_id).await?;
    Ok(Json(OrderSummaryResponse { order }))
}
