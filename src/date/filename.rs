//! Dates embedded in file names.

use chrono::{DateTime, Datelike, NaiveDate};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;
use tracing::trace;

static DATE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static UNIX_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Year/month/day patterns, most specific first. Each is anchored on
/// non-digits so a date is never cut out of a longer number.
fn date_patterns() -> &'static Vec<Regex> {
    DATE_PATTERNS.get_or_init(|| {
        vec![
            // 2024-01-15, 2024_01_15 14-30-00, 2024.01.15
            Regex::new(r"(?:^|\D)(?P<y>\d{4})[-_.](?P<m>\d{2})[-_.](?P<d>\d{2})(?:\D|$)").unwrap(),
            // 20240115, IMG_20240115_143000, IMG-20240115-WA0001, 20240115T143000
            Regex::new(r"(?:^|\D)(?P<y>\d{4})(?P<m>\d{2})(?P<d>\d{2})(?:[-_T]?\d{6})?(?:\D|$)")
                .unwrap(),
        ]
    })
}

/// Seconds (10 digits) or milliseconds (13 digits) since the epoch.
fn unix_pattern() -> &'static Regex {
    UNIX_PATTERN.get_or_init(|| Regex::new(r"(?:^|\D)(?P<ts>\d{13}|\d{10})(?:\D|$)").unwrap())
}

const YEARS: std::ops::RangeInclusive<i32> = 1990..=2100;

/// Parse a calendar date out of a file name such as `IMG_20230615_101010.jpg`.
pub fn parse_filename_date(filename: &str) -> Option<NaiveDate> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    for pattern in date_patterns() {
        if let Some(date) = first_valid(pattern, stem, "d", |caps| {
            build_date(&caps["y"], &caps["m"], &caps["d"])
        }) {
            trace!(filename, pattern = pattern.as_str(), "Matched date pattern");
            return Some(date);
        }
    }

    first_valid(unix_pattern(), stem, "ts", |caps| from_timestamp(&caps["ts"]))
}

/// Try every match of `pattern` until `build` accepts one. The search
/// resumes right after the `last` group, so the trailing separator of a
/// rejected match can open the next one.
fn first_valid<T>(
    pattern: &Regex,
    haystack: &str,
    last: &str,
    build: impl Fn(&Captures) -> Option<T>,
) -> Option<T> {
    let mut start = 0;
    while let Some(caps) = pattern.captures_at(haystack, start) {
        if let Some(found) = build(&caps) {
            return Some(found);
        }
        start = caps.name(last).map_or(haystack.len(), |m| m.end());
    }
    None
}

fn build_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let year: i32 = year.parse().ok()?;
    if !YEARS.contains(&year) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn from_timestamp(digits: &str) -> Option<NaiveDate> {
    let mut secs: i64 = digits.parse().ok()?;
    if digits.len() == 13 {
        secs /= 1000;
    }

    let date = DateTime::from_timestamp(secs, 0)?.date_naive();
    YEARS.contains(&date.year()).then_some(date)
}
