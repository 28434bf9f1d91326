use axum::extract::{Query, State};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdminQuery {
    key: Option<String>,
}

/// Constant-time check of the admin key; length mismatches compare
/// unequal without short-circuiting on content.
fn verify_admin_key(secret: &str, provided: Option<&str>) -> Result<()> {
    let provided = provided.ok_or(AppError::PermissionDenied)?;
    if bool::from(provided.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Registers the Telegram webhook (`PUBLIC_URL` + `/webhook`) and the bot
/// command menu. Protected by the admin secret.
pub async fn set_webhook(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<&'static str> {
    verify_admin_key(&state.config.admin_secret, query.key.as_deref())?;

    let base = state
        .config
        .public_url
        .clone()
        .ok_or_else(|| AppError::Validation("PUBLIC_URL is not configured".to_string()))?;
    let url = format!("{}/webhook", base);

    state.telegram.set_webhook(&url).await?;
    state.telegram.set_my_commands().await?;
    tracing::info!(url = %url, "webhook registered");

    Ok("webhook registered")
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_key_is_accepted() {
        assert!(verify_admin_key("s3cret", Some("s3cret")).is_ok());
    }

    #[test]
    fn wrong_or_missing_key_is_rejected() {
        assert!(verify_admin_key("s3cret", Some("guess")).is_err());
        assert!(verify_admin_key("s3cret", Some("")).is_err());
        assert!(verify_admin_key("s3cret", None).is_err());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(verify_admin_key("s3cret", Some("s3cret-and-more")).is_err());
    }
}
