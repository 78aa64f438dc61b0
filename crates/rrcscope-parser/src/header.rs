//! Entry header parsing.
//!
//! Grammar of the first line of every entry:
//!
//! ```text
//! YYYY Mon D[D]  HH:MM:SS.mmm  [TT]  0xCCCC  Log Name[  --  Sub Name]
//! ```

use chrono::{Month, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})\s+([A-Z][a-z]{2})\s+(\d{1,2})\s+(\d{2}:\d{2}:\d{2}\.\d{3})\s+\[([0-9A-Fa-f]{2})\]\s+(0x[0-9A-Fa-f]{4})\s+(.+)$",
    )
    .expect("Invalid entry header regex")
});

/// Separator between log name and sub name
pub const SUBNAME_SEPARATOR: &str = "  --  ";

/// Fields of a parsed header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub timestamp_ms: i64,
    pub tag: String,
    pub log_code: String,
    pub log_name: String,
    pub log_subname: String,
}

/// Parse the header line of an entry
///
/// Returns `None` if the line does not match the header grammar or names an
/// impossible calendar date; callers skip such groups.
pub fn parse_header(line: &str) -> Option<EntryHeader> {
    let caps = HEADER_PATTERN.captures(line)?;

    let year: i32 = caps[1].parse().ok()?;
    let month = caps[2].parse::<Month>().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month.number_from_month(), day)?;
    let time = NaiveTime::parse_from_str(&caps[4], "%H:%M:%S%.3f").ok()?;

    let (log_name, log_subname) = split_name(&caps[7]);

    Some(EntryHeader {
        date,
        time,
        timestamp_ms: epoch_ms(date, time),
        tag: caps[5].to_string(),
        log_code: caps[6].to_string(),
        log_name,
        log_subname,
    })
}

/// UTC epoch milliseconds for a header date and time
pub fn epoch_ms(date: NaiveDate, time: NaiveTime) -> i64 {
    NaiveDateTime::new(date, time).and_utc().timestamp_millis()
}

fn split_name(rest: &str) -> (String, String) {
    match rest.split_once(SUBNAME_SEPARATOR) {
        Some((name, sub)) => (name.trim().to_string(), sub.trim().to_string()),
        None => (rest.trim().to_string(), String::new()),
    }
}
