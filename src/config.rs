use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub resend_api_key: String,
    pub email_from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY")?;
        let stripe_webhook_secret = env::var("STRIPE_WEBHOOK_SECRET")?;
        let resend_api_key = env::var("RESEND_API_KEY")?;
        let email_from =
            env::var("EMAIL_FROM").unwrap_or_else(|_| "Orders <orders@example.com>".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            app_url,
            stripe_secret_key,
            stripe_webhook_secret,
            resend_api_key,
            email_from,
        })
    }
}
