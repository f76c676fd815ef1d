//! Minimal Stripe surface: hosted checkout-session creation over the REST
//! API, plus webhook payload types and signature verification.

pub mod signature;
pub mod types;

use anyhow::Result;

use self::types::CheckoutSessionHandle;

const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: STRIPE_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create a hosted checkout session. `params` is the flattened form
    /// parameter list Stripe expects (`line_items[0][quantity]=2`, ...).
    pub async fn create_checkout_session(
        &self,
        params: &[(String, String)],
    ) -> Result<CheckoutSessionHandle> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
