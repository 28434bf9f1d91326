use axum::{
    routing::{get, post},
    Router,
};

use std::net::SocketAddr;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod expiry;
mod normalize;
mod telegram;

mod crypto {
    pub mod token;
}

mod models {
    pub mod callback;
    pub mod secret;
    pub mod session;
}

mod repositories {
    pub mod secret;
    pub mod session;
}

mod services {
    pub mod callbacks;
    pub mod conversation;
    pub mod intent;
    pub mod reminder;
    pub mod reports;
}

mod handlers {
    pub mod admin;
    pub mod webhook;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config)?;

    db::init_schema(&state.db).await?;
    tracing::info!("✅ Database schema ready");

    let app = Router::new()
        .route("/webhook", post(handlers::webhook::webhook))
        .route("/setWebhook", get(handlers::admin::set_webhook))
        .route("/healthz", get(handlers::admin::healthz))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .with_state(state.clone());

    let reminder_state = state.clone();
    let interval = Duration::from_secs(config.reminder_interval_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            tracing::info!("⏰ Running scheduled expiry reminder check...");
            match services::reminder::check_expiry_reminders(&reminder_state).await {
                Ok(_) => {
                    tracing::info!("✅ Reminder check completed");
                }
                Err(e) => {
                    tracing::error!("❌ Reminder check failed: {}", e);
                }
            }
        }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Bot server listening on http://{}", addr);
    tracing::info!("✅ Background reminder job started");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
