use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/checkout`: the cart contents at checkout time.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product: CheckoutProduct,
    pub quantity: i32,
}

/// The slice of a product the payment session needs. `price` is the unit
/// price in cents.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutProduct {
    pub id: String,
    pub name: String,
    pub price: i64,
    #[serde(rename = "packageImage")]
    pub package_image: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionDto {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub url: Option<String>,
}
