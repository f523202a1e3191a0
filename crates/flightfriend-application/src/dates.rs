//! Natural-language travel-date resolution.
//!
//! Best-effort parser for the date fragments people type into a chat box:
//! "tomorrow", "next tuesday", "25th December", "3/4". Anything absent or
//! unparseable resolves to tomorrow. Slash dates are tried month-first and
//! retried day-first when the first read is impossible; a genuinely
//! ambiguous "3/4" silently picks the month-first reading. Absolute dates
//! that already passed this year roll over to the next year.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const MONTH_PATTERN: &str = "Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|\
Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?";

const RELATIVE_PATTERN: &str =
    r"tomorrow|today|next\s+(?:week|monday|tuesday|wednesday|thursday|friday|saturday|sunday)";

/// One alternation covering every fragment shape we understand: day-month,
/// month-day, numeric slash/dash, and relative keywords.
static DATE_FRAGMENT: Lazy<String> = Lazy::new(|| {
    format!(
        r"\d{{1,2}}(?:st|nd|rd|th)?\s+(?:{MONTH_PATTERN})(?:\s+\d{{4}})?|(?:{MONTH_PATTERN})\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?|\d{{1,2}}[-/.]\d{{1,2}}(?:[-/.]\d{{2,4}})?|{RELATIVE_PATTERN}"
    )
});

/// Fragment introduced by a date keyword ("on 25th December").
static KEYWORDED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:on|for|around|near|date|dated)\s+({})",
        *DATE_FRAGMENT
    ))
    .expect("keyworded date pattern is valid")
});

/// Bare fragment anywhere in the message.
static BARE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", *DATE_FRAGMENT)).expect("bare date pattern is valid")
});

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d{1,2})(?:st|nd|rd|th)").expect("ordinal pattern is valid"));

static DAY_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2})\s+([a-z]+)(?:\s+(\d{4}))?$").expect("valid"));

static MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([a-z]+)\s+(\d{1,2})(?:,?\s+(\d{4}))?$").expect("valid"));

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[-/.](\d{1,2})(?:[-/.](\d{2,4}))?$").expect("valid"));

/// Resolves the travel date mentioned in `text` relative to `today`.
///
/// Returns tomorrow when no fragment is found or the found fragment cannot
/// be parsed.
pub fn resolve_travel_date(text: &str, today: NaiveDate) -> NaiveDate {
    let default = today + Duration::days(1);
    let fragment = KEYWORDED_DATE
        .captures(text)
        .or_else(|| BARE_DATE.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase());

    let Some(fragment) = fragment else {
        return default;
    };
    debug!("[DateResolver] Found date fragment: {fragment}");
    match parse_fragment(&fragment, today) {
        Some(date) => date,
        None => {
            debug!("[DateResolver] Could not parse '{fragment}', defaulting to tomorrow");
            default
        }
    }
}

fn parse_fragment(fragment: &str, today: NaiveDate) -> Option<NaiveDate> {
    if fragment == "today" {
        return Some(today);
    }
    if fragment == "tomorrow" {
        return Some(today + Duration::days(1));
    }
    if let Some(rest) = fragment.strip_prefix("next") {
        return parse_next(rest.trim(), today);
    }

    let cleaned = ORDINAL_SUFFIX.replace_all(fragment, "$1").into_owned();

    let parsed = if let Some(caps) = DAY_MONTH.captures(&cleaned) {
        build_date(
            caps.get(3).map(|m| m.as_str()),
            month_number(caps.get(2)?.as_str())?,
            caps.get(1)?.as_str().parse().ok()?,
            today,
        )
    } else if let Some(caps) = MONTH_DAY.captures(&cleaned) {
        build_date(
            caps.get(3).map(|m| m.as_str()),
            month_number(caps.get(1)?.as_str())?,
            caps.get(2)?.as_str().parse().ok()?,
            today,
        )
    } else if let Some(caps) = NUMERIC.captures(&cleaned) {
        parse_numeric(&caps, today)
    } else {
        None
    }?;

    Some(advance_past_date(parsed, today)?)
}

fn parse_next(target: &str, today: NaiveDate) -> Option<NaiveDate> {
    if target == "week" {
        return Some(today + Duration::days(7));
    }
    let weekday: Weekday = target.parse().ok()?;
    let current = today.weekday().num_days_from_sunday() as i64;
    let wanted = weekday.num_days_from_sunday() as i64;
    // Always lands in the following week, never later today/this week.
    let days_ahead = ((wanted - current).rem_euclid(7)) + 7;
    Some(today + Duration::days(days_ahead))
}

fn parse_numeric(caps: &regex::Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    let second: u32 = caps.get(2)?.as_str().parse().ok()?;
    let year = match caps.get(3).map(|m| m.as_str()) {
        Some(raw) if raw.len() == 2 => 2000 + raw.parse::<i32>().ok()?,
        Some(raw) => raw.parse().ok()?,
        None => today.year(),
    };
    // Month-first, retried day-first when the first number cannot be a month.
    NaiveDate::from_ymd_opt(year, first, second)
        .filter(|_| first <= 12)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
}

fn build_date(year: Option<&str>, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let year = match year {
        Some(raw) => raw.parse().ok()?,
        None => today.year(),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// A date already behind us probably means the same day next year.
fn advance_past_date(date: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    if date >= today {
        return Some(date);
    }
    let next_year = date.with_year(date.year() + 1)?;
    if next_year >= today { Some(next_year) } else { None }
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        // A Sunday.
        NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_date_phrase_defaults_to_tomorrow() {
        assert_eq!(
            resolve_travel_date("flights from Delhi to Mumbai", today()),
            day(2026, 8, 24)
        );
    }

    #[test]
    fn test_today_and_tomorrow_keywords() {
        assert_eq!(resolve_travel_date("fly out today", today()), today());
        assert_eq!(
            resolve_travel_date("leaving tomorrow morning", today()),
            day(2026, 8, 24)
        );
    }

    #[test]
    fn test_next_weekday_lands_in_following_week() {
        // Today is Sunday 23rd; "next tuesday" is the 1st, not the 25th.
        assert_eq!(
            resolve_travel_date("book me next tuesday", today()),
            day(2026, 9, 1)
        );
        // "next sunday" is a full week out.
        assert_eq!(
            resolve_travel_date("next sunday please", today()),
            day(2026, 8, 30)
        );
    }

    #[test]
    fn test_next_week_adds_seven_days() {
        assert_eq!(
            resolve_travel_date("sometime next week", today()),
            day(2026, 8, 30)
        );
    }

    #[test]
    fn test_ordinal_day_with_month_name() {
        assert_eq!(
            resolve_travel_date("flights on 25th December", today()),
            day(2026, 12, 25)
        );
        assert_eq!(
            resolve_travel_date("around 3rd September 2027", today()),
            day(2027, 9, 3)
        );
    }

    #[test]
    fn test_month_name_then_day() {
        assert_eq!(
            resolve_travel_date("travel on December 25", today()),
            day(2026, 12, 25)
        );
    }

    #[test]
    fn test_past_absolute_date_rolls_to_next_year() {
        // March has already passed relative to August.
        assert_eq!(
            resolve_travel_date("flights on 15th March", today()),
            day(2027, 3, 15)
        );
        let resolved = resolve_travel_date("on 1/2", today());
        assert!(resolved >= today());
        assert_eq!(resolved, day(2027, 1, 2));
    }

    #[test]
    fn test_slash_date_month_first() {
        assert_eq!(resolve_travel_date("on 9/5", today()), day(2026, 9, 5));
    }

    #[test]
    fn test_slash_date_retries_day_first_when_month_impossible() {
        // 25 cannot be a month, so this is the 25th of September.
        assert_eq!(resolve_travel_date("on 25/9", today()), day(2026, 9, 25));
    }

    #[test]
    fn test_slash_date_with_two_digit_year() {
        assert_eq!(
            resolve_travel_date("on 9/5/27", today()),
            day(2027, 9, 5)
        );
    }

    #[test]
    fn test_garbage_fragment_defaults_to_tomorrow() {
        assert_eq!(
            resolve_travel_date("flights on 45/45", today()),
            day(2026, 8, 24)
        );
    }
}
