//! Periodic due-soon report sent to the authorized chat.

use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::expiry::days_until;
use crate::models::secret::SecretSummary;
use crate::repositories::secret as secret_repo;
use crate::state::AppState;

/// Days covered by a reminder run (expired records are always included).
const REMINDER_WINDOW_DAYS: i32 = 7;

/// Report buckets, each holding pre-rendered `• name` lines. Input order
/// (ascending expiry) is preserved inside every bucket.
#[derive(Debug, Default, PartialEq)]
struct DueBuckets {
    expired: Vec<String>,
    today: Vec<String>,
    tomorrow: Vec<String>,
    within_three: Vec<String>,
    within_week: Vec<String>,
}

fn group_due(records: &[SecretSummary], today: NaiveDate) -> DueBuckets {
    let mut buckets = DueBuckets::default();
    for record in records {
        let Some(expiry) = record.expires_at else {
            continue;
        };
        let item = format!("• {}", record.name);
        match days_until(expiry, today) {
            d if d < 0 => buckets.expired.push(item),
            0 => buckets.today.push(item),
            1 => buckets.tomorrow.push(item),
            2..=3 => buckets.within_three.push(item),
            _ => buckets.within_week.push(item),
        }
    }
    buckets
}

/// Renders the consolidated report, or `None` when every bucket is empty.
fn render(buckets: &DueBuckets) -> Option<String> {
    let sections = [
        ("⚠️ Expired:", &buckets.expired),
        ("🔴 Due today:", &buckets.today),
        ("🔴 Due tomorrow:", &buckets.tomorrow),
        ("🟡 Within 3 days:", &buckets.within_three),
        ("🟢 Within 7 days:", &buckets.within_week),
    ];

    let body = sections
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(title, items)| format!("{}\n{}", title, items.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n");

    if body.is_empty() {
        None
    } else {
        Some(format!("⏰ Expiry reminders\n\n{}", body))
    }
}

/// One reminder run: read-only scan of the record store plus at most one
/// outbound message. No-op when nothing is due.
pub async fn check_expiry_reminders(state: &AppState) -> Result<()> {
    let records = secret_repo::list_expiring_within(&state.db, REMINDER_WINDOW_DAYS).await?;
    let today = Utc::now().date_naive();

    let Some(report) = render(&group_due(&records, today)) else {
        tracing::debug!("no records due within {} days", REMINDER_WINDOW_DAYS);
        return Ok(());
    };

    state
        .telegram
        .send_text(state.config.allowed_user_id, &report)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn summary(name: &str, offset_days: i64, today: NaiveDate) -> SecretSummary {
        SecretSummary {
            id: 1,
            name: name.to_string(),
            site: "x".to_string(),
            expires_at: Some(today + Duration::days(offset_days)),
        }
    }

    #[test]
    fn groups_by_day_distance() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let records = vec![
            summary("overdue", -1, today),
            summary("due-now", 0, today),
            summary("due-tomorrow", 1, today),
            summary("due-soon", 2, today),
            summary("due-this-week", 5, today),
        ];
        let buckets = group_due(&records, today);
        assert_eq!(buckets.expired, vec!["• overdue"]);
        assert_eq!(buckets.today, vec!["• due-now"]);
        assert_eq!(buckets.tomorrow, vec!["• due-tomorrow"]);
        assert_eq!(buckets.within_three, vec!["• due-soon"]);
        assert_eq!(buckets.within_week, vec!["• due-this-week"]);
    }

    #[test]
    fn bucket_order_follows_input_order() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        // Ascending by expiry, as the store query returns them.
        let records = vec![
            summary("a", 2, today),
            summary("b", 3, today),
        ];
        let buckets = group_due(&records, today);
        assert_eq!(buckets.within_three, vec!["• a", "• b"]);
    }

    #[test]
    fn render_skips_empty_buckets() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let records = vec![summary("only-one", 0, today)];
        let report = render(&group_due(&records, today)).unwrap();
        assert_eq!(report, "⏰ Expiry reminders\n\n🔴 Due today:\n• only-one");
    }

    #[test]
    fn render_is_none_when_nothing_is_due() {
        assert_eq!(render(&DueBuckets::default()), None);
        // Records without an expiry never appear in a reminder.
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let no_expiry = SecretSummary {
            id: 9,
            name: "n".to_string(),
            site: "s".to_string(),
            expires_at: None,
        };
        assert_eq!(render(&group_due(&[no_expiry], today)), None);
    }
}
