use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Seconds of inactivity after which a pending session is discarded.
pub const SESSION_TTL_SECS: i64 = 300;

/// Position in the multi-step intake flow.
///
/// Steps strictly follow name → site → account → password → expiry →
/// extra → persist; any step may be abandoned without touching the
/// record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Idle,
    AskSite,
    AskAccount,
    AskPassword,
    AskExpiry,
    AskExtra,
}

impl Step {
    /// Stable string form stored in the `step` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Idle => "idle",
            Step::AskSite => "ask_site",
            Step::AskAccount => "ask_account",
            Step::AskPassword => "ask_password",
            Step::AskExpiry => "ask_expiry",
            Step::AskExtra => "ask_extra",
        }
    }
}

/// The partially-built record a user is walking through the intake flow.
/// Serialized as JSON into the session row's `data` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub step: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl SessionData {
    /// A fresh session with no pending flow.
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Whether a session row last touched at `updated_at` has outlived its TTL.
pub fn is_stale(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(updated_at) > Duration::seconds(SESSION_TTL_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_idle() {
        assert_eq!(SessionData::idle().step, Step::Idle);
    }

    #[test]
    fn staleness_boundary_is_exclusive() {
        let now = Utc::now();
        assert!(!is_stale(now - Duration::seconds(300), now));
        assert!(is_stale(now - Duration::seconds(301), now));
    }

    #[test]
    fn step_serializes_snake_case() {
        let data = SessionData {
            step: Step::AskSite,
            name: Some("gpt".to_string()),
            ..Default::default()
        };
        let json = sonic_rs::to_string(&data).unwrap();
        assert!(json.contains(r#""step":"ask_site""#));
        let back: SessionData = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn unset_fields_are_omitted_from_json() {
        let json = sonic_rs::to_string(&SessionData::idle()).unwrap();
        assert_eq!(json, r#"{"step":"idle"}"#);
    }
}
