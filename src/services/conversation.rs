//! The conversation engine: interprets each inbound text against the
//! current session state, command syntax or free-text search, and drives
//! the session store, record store and crypto codec.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::crypto::token;
use crate::error::Result;
use crate::expiry::parse_expiry_date;
use crate::models::callback::{CallbackAction, ExpiryChoice};
use crate::models::secret::RAW_SITE;
use crate::models::session::{SessionData, Step};
use crate::repositories::{secret as secret_repo, session as session_repo};
use crate::services::intent::{self, Command, Intent};
use crate::services::reports;
use crate::state::AppState;
use crate::telegram::{Button, Reply};

/// Trailing `@date` suffix on a structured-save header line.
static HEADER_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\d/\-]+)\s*$").unwrap());

const HELP_TEXT: &str = "🔐 Secret-keeper bot\n\n\
📝 Save an account: send a name to start the guided flow\n\
e.g. gpt team account\n\n\
📄 Save a long text (SSH key, note):\n\
  #save <name> [@expiry date]\n\
  <content...>\n\n\
🔍 Search: just type a keyword\n\n\
📋 Commands:\n\
  /list - all records\n\
  /expiring - expiring soon\n\
  /cancel - cancel the current flow\n\
  /help - this help\n\n\
🔒 AES-GCM encrypted at rest\n\
⏰ Automatic expiry reminders";

/// Handles one inbound text message from the authorized user.
pub async fn handle_message(state: &AppState, user_id: i64, text: &str) -> Result<Reply> {
    let text = text.trim();
    let intent = intent::classify(text);

    // Commands work in any state; /cancel is the escape hatch out of a flow.
    if let Intent::Command(cmd) = &intent {
        return handle_command(state, user_id, *cmd).await;
    }

    // An active flow consumes the text as the answer to the current step.
    // A timed-out session reads back as idle, so stale flows self-heal here.
    let session = session_repo::get(&state.db, user_id).await?;
    if session.step != Step::Idle {
        return continue_intake(state, user_id, session, text).await;
    }

    match intent {
        Intent::Command(_) => unreachable!("commands are dispatched above"),
        Intent::StructuredSave { header, body } => structured_save(state, &header, &body).await,
        Intent::MalformedSave => Ok(Reply::text(
            "❓ Format:\n#save <name> [@date]\n<content>",
        )),
        Intent::ExpirySet { id, value } => set_expiry_by_id(state, id, &value).await,
        Intent::MalformedExpirySet => Ok(Reply::text(
            "❓ Format: #expiry <id> <2026-12-31|none>",
        )),
        Intent::Search(term) => search_or_intake(state, user_id, &term).await,
        Intent::IntakeStart(name) => start_intake(state, user_id, &name).await,
    }
}

async fn handle_command(state: &AppState, user_id: i64, cmd: Command) -> Result<Reply> {
    match cmd {
        Command::Help => Ok(Reply::text(HELP_TEXT)),
        Command::List => reports::list_reply(state).await,
        Command::Expiring => reports::expiring_reply(state).await,
        Command::Cancel => {
            session_repo::clear(&state.db, user_id).await?;
            Ok(Reply::text("✅ Cancelled"))
        }
        Command::Unknown => Ok(Reply::text("❓ Unknown command — try /help")),
    }
}

// ---------------------------------------------------------------------------
// Idle-state paths
// ---------------------------------------------------------------------------

/// Saves a marker-prefixed freeform body as a single encrypted blob.
async fn structured_save(state: &AppState, header: &str, body: &str) -> Result<Reply> {
    let today = Utc::now().date_naive();

    // An `@date` suffix on the header line sets the expiry; an unparsable
    // one is stripped and ignored, matching the predecessor's behavior.
    let (name, expires_at) = match HEADER_DATE_RE.captures(header) {
        Some(caps) => {
            let date = parse_expiry_date(&caps[1], today);
            let name = header[..caps.get(0).unwrap().start()].trim();
            (name, date)
        }
        None => (header.trim(), None),
    };

    let content = crate::normalize::normalize(body);
    if name.is_empty() || content.is_empty() {
        return Ok(Reply::text("❓ Name and content are both required"));
    }

    let encrypted = token::encrypt(&content, &state.config.encrypt_key)?;
    let record = secret_repo::insert(
        &state.db,
        name,
        RAW_SITE,
        "",
        &encrypted,
        None,
        expires_at,
    )
    .await?;
    tracing::info!(id = record.id, "raw record saved");

    let mut msg = format!("✅ Saved \"{}\"", name);
    if let Some(date) = expires_at {
        msg.push_str(&format!("\n📅 expires: {}", date));
    }
    Ok(Reply::text(msg))
}

/// Sets or clears an existing record's expiry by id.
async fn set_expiry_by_id(state: &AppState, id: i64, value: &str) -> Result<Reply> {
    if matches!(value, "none" | "无" | "取消") {
        return Ok(if secret_repo::update_expiry(&state.db, id, None).await? {
            Reply::text("✅ Expiry cleared")
        } else {
            Reply::text(format!("❌ Record #{} does not exist", id))
        });
    }

    let today = Utc::now().date_naive();
    let Some(date) = parse_expiry_date(value, today) else {
        return Ok(Reply::text(
            "❓ Bad date — use 2026-12-31 or 12-31 (or \"none\" to clear)",
        ));
    };

    Ok(if secret_repo::update_expiry(&state.db, id, Some(date)).await? {
        Reply::text(format!("✅ expires: {}", date))
    } else {
        Reply::text(format!("❌ Record #{} does not exist", id))
    })
}

/// Search-first: a short bare token queries existing records before it is
/// allowed to open a new intake flow.
async fn search_or_intake(state: &AppState, user_id: i64, term: &str) -> Result<Reply> {
    let hits = secret_repo::search_by_name_or_site(&state.db, term, 5).await?;
    match hits.len() {
        0 => start_intake(state, user_id, term).await,
        1 => reports::detail_reply(state, hits[0].id).await,
        n => {
            let rows = hits
                .iter()
                .map(|hit| {
                    vec![Button::new(
                        format!("{} ({})", hit.name, hit.site),
                        CallbackAction::View(hit.id),
                    )]
                })
                .collect();
            Ok(Reply::with_keyboard(format!("🔍 Found {}:", n), rows))
        }
    }
}

/// Opens the guided intake flow with the given name.
async fn start_intake(state: &AppState, user_id: i64, name: &str) -> Result<Reply> {
    let data = SessionData {
        step: Step::AskSite,
        name: Some(name.to_string()),
        ..Default::default()
    };
    session_repo::set(&state.db, user_id, &data).await?;
    Ok(Reply::text(format!("📝 Saving \"{}\"\n\n🌐 Site:", name)))
}

// ---------------------------------------------------------------------------
// The intake flow
// ---------------------------------------------------------------------------

/// The outcome of applying one text input to an active session.
#[derive(Debug, PartialEq)]
enum Advance {
    /// Session moved one step forward; persist it and prompt.
    Next(SessionData),
    /// Input rejected; the session is left unchanged at the same step.
    Reprompt,
    /// All fields collected; encrypt and insert.
    Complete(SessionData),
}

/// Pure step-transition logic: each valid input advances exactly one step
/// forward or terminates the flow; invalid expiry input changes nothing.
fn advance_with_text(mut data: SessionData, text: &str, today: NaiveDate) -> Advance {
    match data.step {
        Step::AskSite => {
            data.site = Some(text.to_string());
            data.step = Step::AskAccount;
            Advance::Next(data)
        }
        Step::AskAccount => {
            data.account = Some(text.to_string());
            data.step = Step::AskPassword;
            Advance::Next(data)
        }
        Step::AskPassword => {
            data.password = Some(text.to_string());
            data.step = Step::AskExpiry;
            Advance::Next(data)
        }
        Step::AskExpiry => match parse_expiry_date(text, today) {
            Some(date) => {
                data.expires_at = Some(date);
                data.step = Step::AskExtra;
                Advance::Next(data)
            }
            None => Advance::Reprompt,
        },
        Step::AskExtra => {
            data.extra = Some(text.to_string());
            Advance::Complete(data)
        }
        Step::Idle => Advance::Reprompt,
    }
}

/// The prompt shown after the session reached `data.step`.
pub(crate) fn prompt_for(data: &SessionData) -> Reply {
    match data.step {
        Step::AskAccount => Reply::text("👤 Account:"),
        Step::AskPassword => Reply::text("🔑 Password:"),
        Step::AskExpiry => Reply::with_keyboard(
            "📅 Set an expiry reminder?",
            vec![
                vec![Button::new(
                    "No expiry",
                    CallbackAction::ExpiryPick(ExpiryChoice::None),
                )],
                vec![
                    Button::new("In 7 days", CallbackAction::ExpiryPick(ExpiryChoice::Days(7))),
                    Button::new("In 30 days", CallbackAction::ExpiryPick(ExpiryChoice::Days(30))),
                ],
                vec![
                    Button::new("In 90 days", CallbackAction::ExpiryPick(ExpiryChoice::Days(90))),
                    Button::new("In 1 year", CallbackAction::ExpiryPick(ExpiryChoice::Days(365))),
                ],
                vec![Button::new(
                    "Custom date",
                    CallbackAction::ExpiryPick(ExpiryChoice::Custom),
                )],
            ],
        ),
        Step::AskExtra => {
            let mut text = String::new();
            if let Some(date) = data.expires_at {
                text.push_str(&format!("📅 expires: {}\n\n", date));
            }
            text.push_str("📝 Add a note?");
            Reply::with_keyboard(
                text,
                vec![vec![Button::new("Skip and save", CallbackAction::SkipExtra)]],
            )
        }
        // Reached only through bugs; keep the user unblocked.
        Step::Idle | Step::AskSite => Reply::text("🌐 Site:"),
    }
}

/// Feeds a text answer into the active flow.
async fn continue_intake(
    state: &AppState,
    user_id: i64,
    session: SessionData,
    text: &str,
) -> Result<Reply> {
    let today = Utc::now().date_naive();
    match advance_with_text(session, text, today) {
        Advance::Reprompt => Ok(Reply::text(
            "❓ Bad date — use 2026-12-31 or 12-31 format:",
        )),
        Advance::Next(data) => {
            session_repo::set(&state.db, user_id, &data).await?;
            Ok(prompt_for(&data))
        }
        Advance::Complete(data) => finalize(state, user_id, data).await,
    }
}

/// Encrypts the collected fields, inserts the record in a single statement
/// and clears the session. No partial records: any earlier abandonment
/// leaves the record store untouched.
pub(crate) async fn finalize(state: &AppState, user_id: i64, data: SessionData) -> Result<Reply> {
    let name = data.name.unwrap_or_default();
    let site = data.site.unwrap_or_default();
    let account = data.account.unwrap_or_default();
    let password = data.password.unwrap_or_default();

    let key = state.config.encrypt_key.as_str();
    let enc_account = token::encrypt(&account, key)?;
    let enc_password = token::encrypt(&password, key)?;
    let enc_extra = data
        .extra
        .as_deref()
        .map(|extra| token::encrypt(extra, key))
        .transpose()?;

    let record = secret_repo::insert(
        &state.db,
        &name,
        &site,
        &enc_account,
        &enc_password,
        enc_extra.as_deref(),
        data.expires_at,
    )
    .await?;
    session_repo::clear(&state.db, user_id).await?;
    tracing::info!(id = record.id, "record saved");

    let mut msg = format!(
        "✅ Saved!\n\n🏷️ {}\n🌐 {}\n👤 {}\n🔑 ******",
        name, site, account
    );
    if let Some(extra) = &data.extra {
        msg.push_str(&format!("\n📝 {}", extra));
    }
    if let Some(date) = data.expires_at {
        msg.push_str(&format!("\n📅 expires: {}", date));
    }
    Ok(Reply::text(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn session_at(step: Step) -> SessionData {
        SessionData {
            step,
            name: Some("gpt".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn each_step_advances_exactly_one_forward() {
        let expectations = [
            (Step::AskSite, Step::AskAccount),
            (Step::AskAccount, Step::AskPassword),
            (Step::AskPassword, Step::AskExpiry),
        ];
        for (from, to) in expectations {
            match advance_with_text(session_at(from), "value", today()) {
                Advance::Next(data) => assert_eq!(data.step, to),
                other => panic!("expected Next from {:?}, got {:?}", from, other),
            }
        }
    }

    #[test]
    fn valid_date_at_ask_expiry_advances() {
        match advance_with_text(session_at(Step::AskExpiry), "12-31", today()) {
            Advance::Next(data) => {
                assert_eq!(data.step, Step::AskExtra);
                assert_eq!(
                    data.expires_at,
                    Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap())
                );
            }
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[test]
    fn invalid_date_at_ask_expiry_leaves_session_unchanged() {
        assert_eq!(
            advance_with_text(session_at(Step::AskExpiry), "someday", today()),
            Advance::Reprompt
        );
        assert_eq!(
            advance_with_text(session_at(Step::AskExpiry), "13-45", today()),
            Advance::Reprompt
        );
    }

    #[test]
    fn extra_input_terminates_the_flow() {
        match advance_with_text(session_at(Step::AskExtra), "backup codes in safe", today()) {
            Advance::Complete(data) => {
                assert_eq!(data.extra.as_deref(), Some("backup codes in safe"));
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn fields_accumulate_across_steps() {
        let mut data = session_at(Step::AskSite);
        for input in ["openai.com", "me@example.com", "hunter2"] {
            data = match advance_with_text(data, input, today()) {
                Advance::Next(next) => next,
                other => panic!("unexpected {:?}", other),
            };
        }
        assert_eq!(data.step, Step::AskExpiry);
        assert_eq!(data.site.as_deref(), Some("openai.com"));
        assert_eq!(data.account.as_deref(), Some("me@example.com"));
        assert_eq!(data.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn expiry_prompt_offers_the_quick_picks() {
        let reply = prompt_for(&session_at(Step::AskExpiry));
        let rows = reply.keyboard.expect("expiry prompt has a keyboard");
        let actions: Vec<_> = rows
            .iter()
            .flatten()
            .map(|b| b.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                CallbackAction::ExpiryPick(ExpiryChoice::None),
                CallbackAction::ExpiryPick(ExpiryChoice::Days(7)),
                CallbackAction::ExpiryPick(ExpiryChoice::Days(30)),
                CallbackAction::ExpiryPick(ExpiryChoice::Days(90)),
                CallbackAction::ExpiryPick(ExpiryChoice::Days(365)),
                CallbackAction::ExpiryPick(ExpiryChoice::Custom),
            ]
        );
    }

    #[test]
    fn extra_prompt_echoes_a_chosen_expiry() {
        let mut data = session_at(Step::AskExtra);
        data.expires_at = Some(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        let reply = prompt_for(&data);
        assert!(reply.text.contains("2026-12-31"));
        assert!(reply.keyboard.is_some());
    }

    #[test]
    fn header_date_suffix_is_detected() {
        let caps = HEADER_DATE_RE.captures("prod db key @2026-12-31").unwrap();
        assert_eq!(&caps[1], "2026-12-31");
        assert!(HEADER_DATE_RE.captures("no date here").is_none());
    }
}
