use std::env;
use anyhow::{Context, Result};
use zeroize::Zeroizing;

/// The application's configuration.
///
/// Loaded once at startup; never mutated afterwards. Missing required
/// secrets abort the process before any request is served.
#[derive(Clone)]
pub struct Config {
    /// The Telegram bot token.
    pub bot_token: String,
    /// The single authorized Telegram user id.
    pub allowed_user_id: i64,
    /// The secret the field-level encryption key is derived from.
    pub encrypt_key: Zeroizing<String>,
    /// The secret protecting the admin endpoints.
    pub admin_secret: String,
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The public base URL the webhook is registered under (no trailing slash).
    pub public_url: Option<String>,
    /// The TCP port the server listens on.
    pub port: u16,
    /// Seconds between expiry-reminder runs.
    pub reminder_interval_secs: u64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let encrypt_key = env::var("ENCRYPT_KEY")
            .context("ENCRYPT_KEY must be set")?;
        if encrypt_key.is_empty() {
            anyhow::bail!("ENCRYPT_KEY must not be empty");
        }

        Ok(Self {
            bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            allowed_user_id: env::var("ALLOWED_USER_ID")
                .context("ALLOWED_USER_ID must be set")?
                .parse()
                .context("ALLOWED_USER_ID must be a numeric Telegram user id")?,
            encrypt_key: Zeroizing::new(encrypt_key),
            admin_secret: env::var("ADMIN_SECRET")
                .context("ADMIN_SECRET must be set")?,
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            public_url: env::var("PUBLIC_URL")
                .ok()
                .map(|u| u.trim_end_matches('/').to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .context("Invalid REMINDER_INTERVAL_SECS")?,
        })
    }
}
