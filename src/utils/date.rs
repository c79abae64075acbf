// src/utils/date.rs

//! Lenient date parsing for scraped timestamps.
//!
//! Pages publish dates in every format imaginable. [`parse_datetime`] accepts
//! the common machine formats first, then a set of human formats after
//! normalizing CJK and dotted/slashed separators. Values without an explicit
//! zone are taken as UTC. Unparseable input yields `None`, never "now".

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Embedded `YYYY-MM-DD[ HH:MM[:SS]]` with `-`, `.` or `/` separators.
static DATE_IN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2}[./-]\d{1,2}[./-]\d{1,2}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?)")
        .expect("date pattern compiles")
});

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const ZONED_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%a, %d %b %Y %H:%M:%S %z",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parse a scraped timestamp.
pub fn parse_datetime(candidate: &str) -> Option<DateTime<FixedOffset>> {
    let text = candidate.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(dt) = parse_machine(text) {
        return Some(dt);
    }

    let normalized = normalize_separators(text);
    if let Some(dt) = parse_machine(&normalized).or_else(|| parse_human(&normalized)) {
        return Some(dt);
    }

    // Fuzzy: first embedded date-looking substring
    DATE_IN_TEXT
        .find(text)
        .map(|m| normalize_separators(m.as_str()))
        .filter(|found| found != &normalized)
        .and_then(|found| parse_machine(&found).or_else(|| parse_human(&found)))
}

/// Find the first parseable date inside free text.
pub fn find_date_in_text(text: &str) -> Option<DateTime<FixedOffset>> {
    DATE_IN_TEXT
        .find_iter(text)
        .find_map(|m| parse_datetime(m.as_str()))
}

fn normalize_separators(text: &str) -> String {
    text.replace('年', "-")
        .replace('月', "-")
        .replace('日', "")
        .replace(['.', '/'], "-")
        .trim()
        .to_string()
}

fn parse_machine(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    // "2026-02-01T10:00:00Z" with fractional seconds mangled or missing offset
    let trimmed = text.strip_suffix('Z').unwrap_or(text);
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(as_utc(naive));
        }
    }
    None
}

fn parse_human(text: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = text.trim_end_matches('-').trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, format) {
            return date.and_hms_opt(0, 0, 0).map(as_utc);
        }
    }
    None
}

fn as_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ymd(dt: &DateTime<FixedOffset>) -> (i32, u32, u32) {
        (dt.year(), dt.month(), dt.day())
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let dt = parse_datetime("2026-02-01T10:30:00+08:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = parse_datetime("2026-02-01T10:30:00.123Z").unwrap();
        assert_eq!(ymd(&dt), (2026, 2, 1));
    }

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_datetime("Sun, 01 Feb 2026 10:30:00 +0000").unwrap();
        assert_eq!(ymd(&dt), (2026, 2, 1));
    }

    #[test]
    fn test_parse_cjk_date() {
        let dt = parse_datetime("2026年2月1日").unwrap();
        assert_eq!(ymd(&dt), (2026, 2, 1));
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_dotted_and_slashed() {
        assert_eq!(ymd(&parse_datetime("2026.02.01").unwrap()), (2026, 2, 1));
        assert_eq!(ymd(&parse_datetime("2026/2/1 08:15").unwrap()), (2026, 2, 1));
    }

    #[test]
    fn test_parse_english_dates() {
        assert_eq!(
            ymd(&parse_datetime("February 1, 2026").unwrap()),
            (2026, 2, 1)
        );
        assert_eq!(ymd(&parse_datetime("Feb 1, 2026").unwrap()), (2026, 2, 1));
        assert_eq!(ymd(&parse_datetime("1 Feb 2026").unwrap()), (2026, 2, 1));
    }

    #[test]
    fn test_parse_fuzzy_substring() {
        let dt = parse_datetime("Published on 2026-01-15 by the team").unwrap();
        assert_eq!(ymd(&dt), (2026, 1, 15));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("yesterday-ish").is_none());
        assert!(parse_datetime("2026-13-45").is_none());
    }

    #[test]
    fn test_find_date_in_text() {
        let dt = find_date_in_text("Release notes 2026/03/04 12:00 final").unwrap();
        assert_eq!(ymd(&dt), (2026, 3, 4));
        assert_eq!(dt.hour(), 12);
    }
}
