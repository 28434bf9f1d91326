//! Button-press handling.
//!
//! Callbacks arrive with a decoded [`CallbackAction`]; presses that no
//! longer match the session state (stale keyboards, double taps) resolve
//! to `None` and send nothing.

use chrono::{Duration, Utc};

use crate::error::{AppError, Result};
use crate::models::callback::{CallbackAction, ExpiryChoice};
use crate::models::session::Step;
use crate::repositories::{secret as secret_repo, session as session_repo};
use crate::services::{conversation, reports};
use crate::state::AppState;
use crate::telegram::{Button, Reply};

/// Handles one authorized button press.
pub async fn handle_callback(
    state: &AppState,
    user_id: i64,
    action: CallbackAction,
) -> Result<Option<Reply>> {
    match action {
        CallbackAction::ExpiryPick(choice) => expiry_pick(state, user_id, choice).await,
        CallbackAction::SkipExtra => skip_extra(state, user_id).await,
        CallbackAction::View(id) => reports::detail_reply(state, id).await.map(Some),
        CallbackAction::DeleteMode => delete_mode(state).await.map(Some),
        CallbackAction::DeleteRequest(id) => delete_request(state, id).await.map(Some),
        CallbackAction::DeleteConfirm(id) => delete_confirm(state, id).await.map(Some),
        CallbackAction::SetExpiry(id) => Ok(Some(Reply::text(format!(
            "📅 To set an expiry, reply:\n#expiry {} 2026-12-31\n\nTo clear it:\n#expiry {} none",
            id, id
        )))),
    }
}

/// A quick-pick on the expiry step. Ignored unless the session is actually
/// waiting at `ask_expiry`.
async fn expiry_pick(
    state: &AppState,
    user_id: i64,
    choice: ExpiryChoice,
) -> Result<Option<Reply>> {
    let mut session = session_repo::get(&state.db, user_id).await?;
    if session.step != Step::AskExpiry {
        return Ok(None);
    }

    match choice {
        ExpiryChoice::Custom => {
            // Stay at ask_expiry; the next typed text is parsed as a date.
            return Ok(Some(Reply::text(
                "📅 Enter the expiry date (e.g. 2026-12-31 or 12-31):",
            )));
        }
        ExpiryChoice::None => session.expires_at = None,
        ExpiryChoice::Days(days) => {
            let today = Utc::now().date_naive();
            session.expires_at = Some(today + Duration::days(i64::from(days)));
        }
    }

    session.step = Step::AskExtra;
    session_repo::set(&state.db, user_id, &session).await?;
    Ok(Some(conversation::prompt_for(&session)))
}

/// The "skip and save" button on the note step.
async fn skip_extra(state: &AppState, user_id: i64) -> Result<Option<Reply>> {
    let mut session = session_repo::get(&state.db, user_id).await?;
    if session.step != Step::AskExtra {
        return Ok(None);
    }
    session.extra = None;
    conversation::finalize(state, user_id, session).await.map(Some)
}

/// The list again, but every record deletes instead of viewing.
async fn delete_mode(state: &AppState) -> Result<Reply> {
    let records = secret_repo::list_all(&state.db).await?;
    if records.is_empty() {
        return Ok(Reply::text("📭 Nothing saved yet"));
    }
    let rows = records
        .iter()
        .map(|record| {
            vec![Button::new(
                format!("❌ {} ({})", record.name, record.site),
                CallbackAction::DeleteRequest(record.id),
            )]
        })
        .collect();
    Ok(Reply::with_keyboard("🗑️ Tap to delete:", rows))
}

/// First stage of a delete: confirm before anything irreversible happens.
async fn delete_request(state: &AppState, id: i64) -> Result<Reply> {
    let record = secret_repo::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Reply::with_keyboard(
        format!("🗑️ Delete \"{}\"?", record.name),
        vec![vec![
            Button::new("✅ Yes, delete", CallbackAction::DeleteConfirm(id)),
            Button::new("↩️ Back", CallbackAction::View(id)),
        ]],
    ))
}

/// Second stage: the actual delete.
async fn delete_confirm(state: &AppState, id: i64) -> Result<Reply> {
    let name = secret_repo::find_by_id(&state.db, id)
        .await?
        .map(|record| record.name);
    if secret_repo::delete_by_id(&state.db, id).await? {
        tracing::info!(id, "record deleted");
        Ok(Reply::text(format!(
            "🗑️ Deleted \"{}\"",
            name.unwrap_or_else(|| id.to_string())
        )))
    } else {
        Err(AppError::NotFound)
    }
}
