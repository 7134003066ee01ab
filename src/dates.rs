//! Posted-date recovery from free text.
//!
//! Listing pages describe recency in whatever format they like. We look for,
//! in priority order:
//!
//! 1. ISO dates: `2025-10-31`
//! 2. Slash dates, read as month/day/year: `10/31/2025`
//! 3. Relative phrases: `5 days ago`, `1 hour ago`, `3 weeks ago`, `2 months ago`
//! 4. Long dates as the search API writes them: `October 30, 2025`
//!
//! The first pattern whose fragment is a real date wins. Finding nothing is
//! normal and yields `None`.

use crate::fallback::first_match;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((\d{4})-(\d{2})-(\d{2}))(?:\b|T)").expect("static regex"));
static SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("static regex"));
static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)\s+(hours?|days?|weeks?|months?)\s+ago\b").expect("static regex")
});
static LONG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2}),\s*(\d{4})\b",
    )
    .expect("static regex")
});

/// A recognised date fragment and the instant it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedDate {
    /// The matched text exactly as it appeared.
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Iso,
    Slash,
    Relative,
    Long,
}

const PRIORITY: [Pattern; 4] = [
    Pattern::Iso,
    Pattern::Slash,
    Pattern::Relative,
    Pattern::Long,
];

/// Parse `text`, resolving relative phrases against `now`.
pub fn parse_posted_at(text: &str, now: DateTime<Utc>) -> Option<PostedDate> {
    if text.trim().is_empty() {
        return None;
    }
    first_match(PRIORITY, |pattern| match pattern {
        Pattern::Iso => iso(text),
        Pattern::Slash => slash(text),
        Pattern::Relative => relative(text, now),
        Pattern::Long => long(text),
    })
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// Also finds the date part of an RFC 3339 timestamp; the time is dropped.
fn iso(text: &str) -> Option<PostedDate> {
    ISO_RE.captures_iter(text).find_map(|caps| {
        let date = NaiveDate::from_ymd_opt(
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
            caps[4].parse().ok()?,
        )?;
        Some(PostedDate {
            text: caps[1].to_string(),
            at: midnight(date),
        })
    })
}

fn slash(text: &str) -> Option<PostedDate> {
    SLASH_RE.captures_iter(text).find_map(|caps| {
        let date = NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
        )?;
        Some(PostedDate {
            text: caps[0].to_string(),
            at: midnight(date),
        })
    })
}

fn relative(text: &str, now: DateTime<Utc>) -> Option<PostedDate> {
    RELATIVE_RE.captures_iter(text).find_map(|caps| {
        let count: i64 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        // A month is treated as exactly 30 days.
        let delta = match unit.trim_end_matches('s') {
            "hour" => Duration::try_hours(count)?,
            "day" => Duration::try_days(count)?,
            "week" => Duration::try_weeks(count)?,
            "month" => Duration::try_days(count.checked_mul(30)?)?,
            _ => return None,
        };
        Some(PostedDate {
            text: caps[0].to_string(),
            at: now.checked_sub_signed(delta)?,
        })
    })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_lowercase().as_str() {
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

fn long(text: &str) -> Option<PostedDate> {
    LONG_RE.captures_iter(text).find_map(|caps| {
        let date = NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            month_number(&caps[1])?,
            caps[2].parse().ok()?,
        )?;
        Some(PostedDate {
            text: caps[0].to_string(),
            at: midnight(date),
        })
    })
}
