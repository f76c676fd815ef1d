//! Structured shapes for every Stripe payload this service consumes. Fields
//! the processor may omit are optional; nothing here is read through
//! untyped JSON access.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::PostalAddress;

/// Response of `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionHandle {
    pub id: String,
    pub url: Option<String>,
}

/// A webhook event envelope. The object payload stays untyped until the
/// event type is known.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The completed checkout session carried by `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub amount_total: Option<i64>,
    pub customer_details: Option<CustomerDetails>,
    pub shipping_details: Option<ShippingDetails>,
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSession {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    pub name: Option<String>,
    pub address: Option<Address>,
}

/// Stripe's captured address; every field may be absent.
#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Collapse absent fields to empty strings, keeping `line2` optional.
    pub fn into_postal(self) -> PostalAddress {
        PostalAddress {
            line1: self.line1.unwrap_or_default(),
            line2: self.line2.filter(|l| !l.is_empty()),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            postal_code: self.postal_code.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        }
    }
}
