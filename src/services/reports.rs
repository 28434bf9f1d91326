//! List, expiring and detail views.

use chrono::Utc;

use crate::crypto::token;
use crate::error::{AppError, Result};
use crate::expiry::{classify, days_until, format_expiry_line};
use crate::models::callback::CallbackAction;
use crate::repositories::secret as secret_repo;
use crate::state::AppState;
use crate::telegram::{Button, Reply};

/// Days covered by the `/expiring` view.
const EXPIRING_VIEW_DAYS: i32 = 30;

/// All records as tappable buttons, most recent first.
pub async fn list_reply(state: &AppState) -> Result<Reply> {
    let records = secret_repo::list_all(&state.db).await?;
    if records.is_empty() {
        return Ok(Reply::text("📭 Nothing saved yet"));
    }

    let today = Utc::now().date_naive();
    let mut rows: Vec<Vec<Button>> = records
        .iter()
        .map(|record| {
            let mut label = format!("{} ({})", record.name, record.site);
            if let Some(expiry) = record.expires_at {
                let days = days_until(expiry, today);
                if days <= 0 {
                    label = format!("⚠️ {}", label);
                } else if days <= 7 {
                    label = format!("🔴 {}", label);
                }
            }
            vec![Button::new(label, CallbackAction::View(record.id))]
        })
        .collect();
    rows.push(vec![Button::new("🗑️ Delete mode", CallbackAction::DeleteMode)]);

    Ok(Reply::with_keyboard("📋 Tap to view:", rows))
}

/// Records expiring within 30 days (expired included), soonest first.
pub async fn expiring_reply(state: &AppState) -> Result<Reply> {
    let records = secret_repo::list_expiring_within(&state.db, EXPIRING_VIEW_DAYS).await?;
    if records.is_empty() {
        return Ok(Reply::text("✅ Nothing expires within 30 days"));
    }

    let today = Utc::now().date_naive();
    let rows: Vec<Vec<Button>> = records
        .iter()
        .filter_map(|record| {
            let expiry = record.expires_at?;
            let icon = classify(expiry, today).icon();
            let days = days_until(expiry, today);
            Some(vec![Button::new(
                format!("{} {} ({} days)", icon, record.name, days),
                CallbackAction::View(record.id),
            )])
        })
        .collect();

    Ok(Reply::with_keyboard("⏰ Expiring soon:", rows))
}

/// Full decrypted view of one record. This is the only path that decrypts,
/// so ciphertext is opened at most once per user-initiated detail view.
pub async fn detail_reply(state: &AppState, id: i64) -> Result<Reply> {
    let record = secret_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let key = state.config.encrypt_key.as_str();
    let mut msg = if record.is_raw() {
        let content = token::decrypt(&record.password, key)?;
        format!("🔐 {}\n\n{}", record.name, content)
    } else {
        let account = token::decrypt(&record.account, key)?;
        let password = token::decrypt(&record.password, key)?;
        let mut msg = format!(
            "🔐 {}\n🌐 {}\n👤 {}\n🔑 {}",
            record.name, record.site, account, password
        );
        if let Some(extra_token) = &record.extra {
            msg.push_str(&format!("\n📝 {}", token::decrypt(extra_token, key)?));
        }
        msg
    };

    let today = Utc::now().date_naive();
    msg.push_str(&format_expiry_line(record.expires_at, today));

    Ok(Reply::with_keyboard(
        msg,
        vec![
            vec![Button::new("📅 Set expiry", CallbackAction::SetExpiry(record.id))],
            vec![Button::new("🗑️ Delete", CallbackAction::DeleteRequest(record.id))],
        ],
    ))
}
