//! Inline-button callback payloads.
//!
//! Telegram delivers button presses as opaque strings. The finite set of
//! actions is modeled as an enum with a prefix-tagged encoding; payloads
//! that decode to no known tag are dropped as a no-op.

/// A quick-pick choice on the expiry step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryChoice {
    /// No expiry reminder.
    None,
    /// Expire this many days from today.
    Days(u32),
    /// Ask the user to type a date.
    Custom,
}

/// Every action an inline button can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show the full decrypted detail of a record.
    View(i64),
    /// Ask for confirmation before deleting a record.
    DeleteRequest(i64),
    /// Confirmed, irreversible delete.
    DeleteConfirm(i64),
    /// Show the list with per-record delete buttons.
    DeleteMode,
    /// Show instructions for setting a record's expiry.
    SetExpiry(i64),
    /// Quick-pick selection while the session is at the expiry step.
    ExpiryPick(ExpiryChoice),
    /// Skip the note step and save.
    SkipExtra,
}

impl CallbackAction {
    /// Encodes the action as a callback payload string.
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::View(id) => format!("view_{id}"),
            CallbackAction::DeleteRequest(id) => format!("del_{id}"),
            CallbackAction::DeleteConfirm(id) => format!("delyes_{id}"),
            CallbackAction::DeleteMode => "delmode".to_string(),
            CallbackAction::SetExpiry(id) => format!("setexp_{id}"),
            CallbackAction::ExpiryPick(ExpiryChoice::None) => "exp_no".to_string(),
            CallbackAction::ExpiryPick(ExpiryChoice::Custom) => "exp_custom".to_string(),
            CallbackAction::ExpiryPick(ExpiryChoice::Days(days)) => format!("exp_{days}"),
            CallbackAction::SkipExtra => "extra_no".to_string(),
        }
    }

    /// Decodes a callback payload. Unknown tags and malformed ids yield
    /// `None` rather than undefined behavior.
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            "delmode" => return Some(CallbackAction::DeleteMode),
            "exp_no" => return Some(CallbackAction::ExpiryPick(ExpiryChoice::None)),
            "exp_custom" => return Some(CallbackAction::ExpiryPick(ExpiryChoice::Custom)),
            "extra_no" => return Some(CallbackAction::SkipExtra),
            _ => {}
        }

        if let Some(id) = data.strip_prefix("view_") {
            return id.parse().ok().map(CallbackAction::View);
        }
        // `delyes_` must be tried before its `del_` prefix.
        if let Some(id) = data.strip_prefix("delyes_") {
            return id.parse().ok().map(CallbackAction::DeleteConfirm);
        }
        if let Some(id) = data.strip_prefix("del_") {
            return id.parse().ok().map(CallbackAction::DeleteRequest);
        }
        if let Some(id) = data.strip_prefix("setexp_") {
            return id.parse().ok().map(CallbackAction::SetExpiry);
        }
        if let Some(days) = data.strip_prefix("exp_") {
            return days
                .parse()
                .ok()
                .map(|d| CallbackAction::ExpiryPick(ExpiryChoice::Days(d)));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_round_trips() {
        let actions = [
            CallbackAction::View(42),
            CallbackAction::DeleteRequest(7),
            CallbackAction::DeleteConfirm(7),
            CallbackAction::DeleteMode,
            CallbackAction::SetExpiry(1),
            CallbackAction::ExpiryPick(ExpiryChoice::None),
            CallbackAction::ExpiryPick(ExpiryChoice::Days(30)),
            CallbackAction::ExpiryPick(ExpiryChoice::Custom),
            CallbackAction::SkipExtra,
        ];
        for action in actions {
            assert_eq!(CallbackAction::decode(&action.encode()), Some(action));
        }
    }

    #[test]
    fn unknown_tags_decode_to_none() {
        assert_eq!(CallbackAction::decode(""), None);
        assert_eq!(CallbackAction::decode("nonsense"), None);
        assert_eq!(CallbackAction::decode("view-12"), None);
        assert_eq!(CallbackAction::decode("drop_table"), None);
    }

    #[test]
    fn malformed_ids_decode_to_none() {
        assert_eq!(CallbackAction::decode("view_"), None);
        assert_eq!(CallbackAction::decode("view_abc"), None);
        assert_eq!(CallbackAction::decode("del_1.5"), None);
        assert_eq!(CallbackAction::decode("exp_later"), None);
    }

    #[test]
    fn delete_confirm_wins_over_delete_request_prefix() {
        assert_eq!(
            CallbackAction::decode("delyes_3"),
            Some(CallbackAction::DeleteConfirm(3))
        );
        assert_eq!(
            CallbackAction::decode("del_3"),
            Some(CallbackAction::DeleteRequest(3))
        );
    }
}
