//! Expiry-date parsing and day-distance urgency classification.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Accepted shapes: `YYYY-MM-DD`, `YYYY/MM/DD`, `MM-DD`, `MM/DD`.
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d{4})[-/])?(\d{1,2})[-/](\d{1,2})$").unwrap());

/// Urgency bucket for a record's expiry date relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Days overdue (positive).
    Expired(i64),
    Today,
    /// Due in 1–3 days.
    Red(i64),
    /// Due in 4–7 days.
    Yellow(i64),
    /// Due in 8–30 days.
    Green(i64),
    /// More than 30 days out; shown as a plain date.
    Far(NaiveDate),
}

impl Urgency {
    /// Marker icon used in list labels.
    pub fn icon(&self) -> &'static str {
        match self {
            Urgency::Expired(_) => "⚠️",
            Urgency::Today | Urgency::Red(_) => "🔴",
            Urgency::Yellow(_) => "🟡",
            Urgency::Green(_) => "🟢",
            Urgency::Far(_) => "📅",
        }
    }
}

/// Parses a user-supplied expiry date.
///
/// When the year is omitted the current year is assumed, rolling to next
/// year if that date has already passed (or does not exist this year, e.g.
/// `02-29`). Calendar-invalid dates such as month 13 are rejected even
/// though they match the regex.
pub fn parse_expiry_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(text.trim())?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    match caps.get(1) {
        Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
        None => match NaiveDate::from_ymd_opt(today.year(), month, day) {
            Some(date) if date >= today => Some(date),
            _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
        },
    }
}

/// Whole-day distance from `today` to `expiry` (negative when overdue).
pub fn days_until(expiry: NaiveDate, today: NaiveDate) -> i64 {
    expiry.signed_duration_since(today).num_days()
}

/// Classifies an expiry date into an urgency bucket.
pub fn classify(expiry: NaiveDate, today: NaiveDate) -> Urgency {
    let days = days_until(expiry, today);
    match days {
        d if d < 0 => Urgency::Expired(-d),
        0 => Urgency::Today,
        1..=3 => Urgency::Red(days),
        4..=7 => Urgency::Yellow(days),
        8..=30 => Urgency::Green(days),
        _ => Urgency::Far(expiry),
    }
}

/// Renders the expiry annotation appended to detail views and summaries.
/// Empty when the record has no expiry date.
pub fn format_expiry_line(expires_at: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(expiry) = expires_at else {
        return String::new();
    };
    match classify(expiry, today) {
        Urgency::Expired(days) => format!("\n⚠️ expired {} days ago", days),
        Urgency::Today => "\n🔴 expires today!".to_string(),
        Urgency::Red(days) => format!("\n🔴 expires in {} days", days),
        Urgency::Yellow(days) => format!("\n🟡 expires in {} days", days),
        Urgency::Green(days) => format!("\n🟢 expires in {} days", days),
        Urgency::Far(date) => format!("\n📅 expires: {}", date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_full_dates_in_both_separators() {
        let today = d(2026, 8, 6);
        assert_eq!(parse_expiry_date("2026-12-31", today), Some(d(2026, 12, 31)));
        assert_eq!(parse_expiry_date("2026/12/31", today), Some(d(2026, 12, 31)));
        assert_eq!(parse_expiry_date("2026-1-5", today), Some(d(2026, 1, 5)));
    }

    #[test]
    fn rejects_non_matching_shapes() {
        let today = d(2026, 8, 6);
        assert_eq!(parse_expiry_date("tomorrow", today), None);
        assert_eq!(parse_expiry_date("2026-12", today), None);
        assert_eq!(parse_expiry_date("12-31 extra", today), None);
        assert_eq!(parse_expiry_date("", today), None);
    }

    #[test]
    fn rejects_calendar_invalid_dates() {
        let today = d(2026, 8, 6);
        assert_eq!(parse_expiry_date("13-45", today), None);
        assert_eq!(parse_expiry_date("2026-02-30", today), None);
        assert_eq!(parse_expiry_date("2026-00-10", today), None);
    }

    #[test]
    fn yearless_date_in_the_future_stays_this_year() {
        let today = d(2026, 8, 6);
        assert_eq!(parse_expiry_date("12-25", today), Some(d(2026, 12, 25)));
    }

    #[test]
    fn yearless_date_already_passed_rolls_to_next_year() {
        let today = d(2026, 12, 26);
        assert_eq!(parse_expiry_date("12-25", today), Some(d(2027, 12, 25)));
        assert_eq!(parse_expiry_date("12/25", today), Some(d(2027, 12, 25)));
    }

    #[test]
    fn yearless_today_is_not_rolled() {
        let today = d(2026, 12, 25);
        assert_eq!(parse_expiry_date("12-25", today), Some(d(2026, 12, 25)));
    }

    #[test]
    fn leap_day_rolls_to_a_year_where_it_exists() {
        // 2026 has no Feb 29; 2027 does not either, so parsing gives up.
        assert_eq!(parse_expiry_date("02-29", d(2026, 3, 1)), None);
        // From 2027, next year (2028) is a leap year.
        assert_eq!(parse_expiry_date("02-29", d(2027, 3, 1)), Some(d(2028, 2, 29)));
    }

    #[test]
    fn classification_boundaries() {
        let today = d(2026, 8, 6);
        assert_eq!(classify(d(2026, 8, 5), today), Urgency::Expired(1));
        assert_eq!(classify(today, today), Urgency::Today);
        assert_eq!(classify(d(2026, 8, 9), today), Urgency::Red(3));
        assert_eq!(classify(d(2026, 8, 10), today), Urgency::Yellow(4));
        assert_eq!(classify(d(2026, 8, 13), today), Urgency::Yellow(7));
        assert_eq!(classify(d(2026, 8, 14), today), Urgency::Green(8));
        assert_eq!(classify(d(2026, 9, 5), today), Urgency::Green(30));
        assert_eq!(classify(d(2026, 9, 6), today), Urgency::Far(d(2026, 9, 6)));
    }

    #[test]
    fn format_lines_carry_the_tier_marker() {
        let today = d(2026, 8, 6);
        assert_eq!(format_expiry_line(None, today), "");
        assert_eq!(format_expiry_line(Some(today), today), "\n🔴 expires today!");
        assert_eq!(
            format_expiry_line(Some(d(2026, 8, 4)), today),
            "\n⚠️ expired 2 days ago"
        );
        assert_eq!(
            format_expiry_line(Some(d(2027, 8, 6)), today),
            "\n📅 expires: 2027-08-06"
        );
    }
}
