//! Telegram Bot API transport: inbound update shapes and the outbound
//! client used by the handlers and the reminder job.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::callback::CallbackAction;

/// Telegram Bot API base URL. All method calls are POSTed to
/// `{BASE_URL}{bot_token}/{method}`.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";

// ---------------------------------------------------------------------------
// Inbound shapes
// ---------------------------------------------------------------------------

/// One webhook delivery: either a text message or a button-press callback.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// An inline keyboard button.
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub text: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(text: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            text: text.into(),
            action,
        }
    }
}

/// An outbound message: text plus an optional inline keyboard.
///
/// Services return `Reply` values; the handlers own the actual send, so
/// the conversation logic stays free of transport concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Vec<Vec<Button>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, rows: Vec<Vec<Button>>) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(rows),
        }
    }
}

/// Renders a reply's keyboard as the Bot API `reply_markup` value.
fn keyboard_json(rows: &[Vec<Button>]) -> Value {
    let grid: Vec<Vec<Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.action.encode() }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": grid })
}

/// Checks a Bot API response's `ok` flag.
///
/// Responses follow `{ "ok": true, "result": ... }` on success and
/// `{ "ok": false, "error_code": ..., "description": ... }` on failure.
fn check_response(response: &Value, method: &str) -> Result<()> {
    let ok = response.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !ok {
        let error_code = response
            .get("error_code")
            .and_then(|v| v.as_i64())
            .unwrap_or(-1);
        let description = response
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(AppError::Transport(format!(
            "{} failed (code {}): {}",
            method, error_code, description
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Thin Bot API client. Sends are fire-and-forget from the core's point
/// of view; no delivery guarantee is assumed.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    bot_token: String,
}

impl Client {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: bot_token.into(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", TELEGRAM_API_BASE, self.bot_token, method)
    }

    async fn call(&self, method: &str, body: Value) -> Result<()> {
        let response = self
            .http
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await?;
        let json_resp: Value = response.json().await?;
        check_response(&json_resp, method)
    }

    /// Sends a plain text message.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    /// Sends a reply, attaching its inline keyboard when present.
    pub async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<()> {
        let mut body = json!({ "chat_id": chat_id, "text": reply.text });
        if let Some(rows) = &reply.keyboard {
            body["reply_markup"] = keyboard_json(rows);
        }
        self.call("sendMessage", body).await
    }

    /// Acknowledges a callback so the client stops its progress spinner.
    pub async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.call(
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id }),
        )
        .await
    }

    /// Registers the webhook URL for push-based updates.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        self.call("setWebhook", json!({ "url": url })).await
    }

    /// Publishes the bot's command menu.
    pub async fn set_my_commands(&self) -> Result<()> {
        self.call(
            "setMyCommands",
            json!({
                "commands": [
                    { "command": "list", "description": "📋 All saved records" },
                    { "command": "expiring", "description": "⏰ Expiring soon" },
                    { "command": "cancel", "description": "❌ Cancel the current flow" },
                    { "command": "help", "description": "❓ Help" },
                ]
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_constructs_correct_url() {
        let client = Client::new("123456:ABC-DEF");
        assert_eq!(
            client.api_url("sendMessage"),
            "https://api.telegram.org/bot123456:ABC-DEF/sendMessage"
        );
    }

    #[test]
    fn check_response_succeeds_on_ok_true() {
        let resp = json!({ "ok": true, "result": { "message_id": 42 } });
        assert!(check_response(&resp, "sendMessage").is_ok());
    }

    #[test]
    fn check_response_fails_on_ok_false() {
        let resp = json!({ "ok": false, "error_code": 401, "description": "Unauthorized" });
        let err = check_response(&resp, "sendMessage").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Unauthorized"));
    }

    #[test]
    fn check_response_fails_on_missing_ok() {
        assert!(check_response(&json!({}), "sendMessage").is_err());
    }

    #[test]
    fn keyboard_json_encodes_actions() {
        let rows = vec![vec![Button::new("View", CallbackAction::View(9))]];
        let markup = keyboard_json(&rows);
        assert_eq!(
            markup["inline_keyboard"][0][0],
            json!({ "text": "View", "callback_data": "view_9" })
        );
    }

    #[test]
    fn reply_builders() {
        let plain = Reply::text("hi");
        assert!(plain.keyboard.is_none());

        let with_kb = Reply::with_keyboard("pick", vec![vec![Button::new("x", CallbackAction::DeleteMode)]]);
        assert_eq!(with_kb.keyboard.as_ref().unwrap().len(), 1);
    }
}
