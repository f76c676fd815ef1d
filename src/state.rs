use crate::{db::DbPool, email::EmailClient, stripe::StripeClient};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub stripe: StripeClient,
    pub mailer: EmailClient,
    pub app_url: String,
    pub webhook_secret: String,
}
