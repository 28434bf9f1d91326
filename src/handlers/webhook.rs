use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppError;
use crate::models::callback::CallbackAction;
use crate::services::{callbacks, conversation};
use crate::state::AppState;
use crate::telegram::{CallbackQuery, Message, Update};

/// The webhook endpoint. Always answers `200 OK` — Telegram retries
/// non-2xx deliveries, and every failure here is already surfaced to the
/// user as a message.
#[axum::debug_handler]
pub async fn webhook(State(state): State<AppState>, Json(update): Json<Update>) -> StatusCode {
    if let Some(callback) = update.callback_query {
        process_callback(&state, callback).await;
    } else if let Some(message) = update.message {
        process_message(&state, message).await;
    }
    StatusCode::OK
}

/// Wording shown to the user when a service call fails. Decryption
/// failures must never leak partial plaintext, so everything below
/// not-found is a generic message.
fn user_facing_error(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound => "❌ Does not exist",
        AppError::Decryption(_) => "⚠️ Could not read that record — please try again",
        _ => "⚠️ Something went wrong — please try again",
    }
}

async fn process_message(state: &AppState, message: Message) {
    let chat_id = message.chat.id;
    let (Some(from), Some(text)) = (message.from, message.text) else {
        return;
    };

    if from.id != state.config.allowed_user_id {
        tracing::warn!(sender = from.id, "rejected message from unauthorized sender");
        if let Err(e) = state.telegram.send_text(chat_id, "⛔ Permission denied").await {
            tracing::error!("Failed to send denial: {}", e);
        }
        return;
    }

    let outcome = conversation::handle_message(state, from.id, &text).await;
    let send_result = match &outcome {
        Ok(reply) => state.telegram.send_reply(chat_id, reply).await,
        Err(e) => {
            tracing::error!("Message handling failed: {}", e);
            state.telegram.send_text(chat_id, user_facing_error(e)).await
        }
    };
    if let Err(e) = send_result {
        tracing::error!("Failed to send reply: {}", e);
    }
}

async fn process_callback(state: &AppState, callback: CallbackQuery) {
    // Acknowledge first so the client stops its progress spinner, even for
    // presses that end up ignored.
    if let Err(e) = state.telegram.answer_callback(&callback.id).await {
        tracing::warn!("Failed to acknowledge callback: {}", e);
    }

    if callback.from.id != state.config.allowed_user_id {
        tracing::warn!(sender = callback.from.id, "ignoring unauthorized callback");
        return;
    }

    let Some(chat_id) = callback.message.map(|m| m.chat.id) else {
        return;
    };
    let Some(data) = callback.data else {
        return;
    };
    let Some(action) = CallbackAction::decode(&data) else {
        tracing::debug!(payload = %data, "ignoring unknown callback tag");
        return;
    };

    let outcome = callbacks::handle_callback(state, callback.from.id, action).await;
    let send_result = match &outcome {
        Ok(Some(reply)) => state.telegram.send_reply(chat_id, reply).await,
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::error!("Callback handling failed: {}", e);
            state.telegram.send_text(chat_id, user_facing_error(e)).await
        }
    };
    if let Err(e) = send_result {
        tracing::error!("Failed to send reply: {}", e);
    }
}
