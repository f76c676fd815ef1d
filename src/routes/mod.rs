use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;
pub mod webhook;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/checkout", checkout::router())
        .nest("/webhook", webhook::router())
        .nest("/orders", orders::router())
        .nest("/admin", admin::router())
}
