use deadpool_postgres::Pool;
use crate::config::Config;
use crate::error::Result;
use crate::telegram;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The Telegram Bot API client.
    pub telegram: telegram::Client,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let telegram = telegram::Client::new(&config.bot_token);
        tracing::info!("✅ Telegram client initialized");

        Ok(AppState {
            db,
            config: config.clone(),
            telegram,
        })
    }
}
