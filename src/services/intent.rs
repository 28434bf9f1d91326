//! Classification of raw inbound text into a discriminated intent.
//!
//! Matchers run in a fixed order — command, structured save, expiry set,
//! single-token search, intake start — so every input maps to exactly one
//! intent before any handler touches the store.

use std::sync::LazyLock;

use regex::Regex;

/// Markers opening a structured freeform save (`#save name\nbody`).
const SAVE_MARKERS: &[&str] = &["#save", "#存"];
/// Markers opening an expiry set/clear command (`#expiry 12 12-31`).
const EXPIRY_MARKERS: &[&str] = &["#expiry", "#到期"];
/// Maximum length of a bare token treated as a search before intake.
const SEARCH_MAX_CHARS: usize = 20;

static EXPIRY_SET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:#expiry|#到期)\s+(\d+)\s+(.+)$").unwrap());

/// A recognized slash command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Expiring,
    Cancel,
    /// Starts with `/` but matches no known command.
    Unknown,
}

/// The result of classifying one inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Command(Command),
    /// Marker-prefixed multi-line save: header line (may carry a trailing
    /// `@date`) plus the raw body.
    StructuredSave { header: String, body: String },
    /// Save marker present but the shape is unusable (no body line).
    MalformedSave,
    /// Expiry set/clear for an existing record.
    ExpirySet { id: i64, value: String },
    /// Expiry marker present but id/value missing.
    MalformedExpirySet,
    /// Short bare token — search before starting a new entry.
    Search(String),
    /// Anything else opens the guided intake with this as the name.
    IntakeStart(String),
}

/// Whether `text` opens with `marker` followed by whitespace.
fn has_marker(text: &str, marker: &str) -> bool {
    text.strip_prefix(marker)
        .is_some_and(|rest| rest.starts_with([' ', '\n']))
}

/// Classifies trimmed inbound text. Evaluation order is significant:
/// search-first takes priority over starting a new multi-field entry.
pub fn classify(text: &str) -> Intent {
    if text.starts_with('/') {
        return Intent::Command(match text {
            "/start" | "/help" => Command::Help,
            "/list" => Command::List,
            "/expiring" => Command::Expiring,
            "/cancel" => Command::Cancel,
            _ => Command::Unknown,
        });
    }

    if SAVE_MARKERS.iter().any(|m| has_marker(text, m)) {
        let after_marker = text
            .split_once(|c: char| c == ' ' || c == '\n')
            .map(|(_, rest)| rest)
            .unwrap_or("");
        return match after_marker.split_once('\n') {
            Some((header, body)) => Intent::StructuredSave {
                header: header.trim().to_string(),
                body: body.to_string(),
            },
            None => Intent::MalformedSave,
        };
    }

    if EXPIRY_MARKERS.iter().any(|m| has_marker(text, m)) {
        return match EXPIRY_SET_RE.captures(text) {
            Some(caps) => match caps[1].parse() {
                Ok(id) => Intent::ExpirySet {
                    id,
                    value: caps[2].trim().to_string(),
                },
                Err(_) => Intent::MalformedExpirySet,
            },
            None => Intent::MalformedExpirySet,
        };
    }

    if !text.chars().any(char::is_whitespace) && text.chars().count() <= SEARCH_MAX_CHARS {
        return Intent::Search(text.to_string());
    }

    Intent::IntakeStart(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_classify() {
        assert_eq!(classify("/help"), Intent::Command(Command::Help));
        assert_eq!(classify("/start"), Intent::Command(Command::Help));
        assert_eq!(classify("/list"), Intent::Command(Command::List));
        assert_eq!(classify("/expiring"), Intent::Command(Command::Expiring));
        assert_eq!(classify("/cancel"), Intent::Command(Command::Cancel));
    }

    #[test]
    fn unknown_slash_text_is_an_unknown_command() {
        assert_eq!(classify("/drop"), Intent::Command(Command::Unknown));
        assert_eq!(classify("/list now"), Intent::Command(Command::Unknown));
    }

    #[test]
    fn structured_save_splits_header_and_body() {
        let intent = classify("#save ssh key @12-31\n-----BEGIN KEY-----\nabc");
        assert_eq!(
            intent,
            Intent::StructuredSave {
                header: "ssh key @12-31".to_string(),
                body: "-----BEGIN KEY-----\nabc".to_string(),
            }
        );
    }

    #[test]
    fn chinese_save_marker_is_accepted() {
        let intent = classify("#存 key\nabc");
        assert_eq!(
            intent,
            Intent::StructuredSave {
                header: "key".to_string(),
                body: "abc".to_string(),
            }
        );
    }

    #[test]
    fn save_without_a_body_line_is_malformed() {
        assert_eq!(classify("#save only a header"), Intent::MalformedSave);
    }

    #[test]
    fn bare_save_marker_falls_through_to_search() {
        // No trailing space or newline after the marker — not a save.
        assert_eq!(classify("#save"), Intent::Search("#save".to_string()));
    }

    #[test]
    fn expiry_set_parses_id_and_value() {
        assert_eq!(
            classify("#expiry 12 2026-12-31"),
            Intent::ExpirySet {
                id: 12,
                value: "2026-12-31".to_string(),
            }
        );
        assert_eq!(
            classify("#到期 3 none"),
            Intent::ExpirySet {
                id: 3,
                value: "none".to_string(),
            }
        );
    }

    #[test]
    fn expiry_set_without_id_or_value_is_malformed() {
        assert_eq!(classify("#expiry 12-31"), Intent::MalformedExpirySet);
        assert_eq!(classify("#expiry 12"), Intent::MalformedExpirySet);
    }

    #[test]
    fn short_single_token_searches_first() {
        assert_eq!(classify("gpt"), Intent::Search("gpt".to_string()));
        assert_eq!(
            classify(&"x".repeat(20)),
            Intent::Search("x".repeat(20))
        );
    }

    #[test]
    fn long_or_spaced_text_starts_intake() {
        assert_eq!(
            classify(&"x".repeat(21)),
            Intent::IntakeStart("x".repeat(21))
        );
        assert_eq!(
            classify("gpt team account"),
            Intent::IntakeStart("gpt team account".to_string())
        );
    }
}
