//! Wall-clock date and time helpers.
//!
//! Schedules carry a local calendar date plus `HH:MM` start/end times with no
//! timezone. All interval reasoning happens on integer minutes since midnight.
//!
//! Weekday indices follow two conventions at once: in memory a weekday is
//! `0 = Sunday .. 6 = Saturday`, while the backend speaks ISO numbering
//! (`1 = Monday .. 7 = Sunday`). [`js_to_iso_weekday`] and
//! [`iso_to_js_weekday`] are the only place the two meet.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::error::{CallogError, Result};

/// Number of minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CallogError::InvalidDate(s.to_string()))
}

/// Parse an `HH:MM` time. `HH:MM:SS` is accepted too, with seconds dropped.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let trimmed = s.trim();
    let parsed = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| CallogError::InvalidTime(s.to_string()))?;

    NaiveTime::from_hms_opt(parsed.hour(), parsed.minute(), 0)
        .ok_or_else(|| CallogError::InvalidTime(s.to_string()))
}

/// Parse a display datetime of the form `YYYY-MM-DDTHH:MM`.
pub fn parse_date_time(s: &str) -> Result<(NaiveDate, NaiveTime)> {
    let (date, time) = s
        .trim()
        .split_once('T')
        .ok_or_else(|| CallogError::InvalidDate(s.to_string()))?;
    Ok((parse_date(date)?, parse_time(time)?))
}

/// Minutes elapsed since midnight, ignoring seconds (e.g. `10:30` -> 630).
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minutes_since_midnight`]. `None` for values outside one day.
pub fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    if minutes >= MINUTES_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Signed difference `end - start` in minutes.
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    minutes_since_midnight(end) as i64 - minutes_since_midnight(start) as i64
}

/// Human-readable duration: `90` -> `"1h 30m"`, `120` -> `"2h"`, `0` -> `"0m"`.
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let mins = minutes % 60;

    let mut parts = Vec::with_capacity(2);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 || hours == 0 {
        parts.push(format!("{}m", mins));
    }
    parts.join(" ")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `YYYY-MM-DDTHH:MM`, the form calendar display events use.
pub fn format_date_time(date: NaiveDate, time: NaiveTime) -> String {
    format!("{}T{}", format_date(date), format_time(time))
}

/// Number of days in the given month, or `None` for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// True when `date` falls inside the given year/month.
pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

/// Weekday for a `0 = Sunday .. 6 = Saturday` index.
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// `0 = Sunday .. 6 = Saturday` index of a weekday.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

/// Translate an in-memory weekday index (`0 = Sunday`) to ISO numbering
/// (`7 = Sunday`). Monday through Saturday keep their number.
pub fn js_to_iso_weekday(day: u8) -> Result<u8> {
    match day {
        0 => Ok(7),
        1..=6 => Ok(day),
        _ => Err(CallogError::InvalidWeekday(format!(
            "{} is not in 0..=6",
            day
        ))),
    }
}

/// Translate an ISO weekday (`1 = Monday .. 7 = Sunday`) to the in-memory
/// index (`0 = Sunday`).
pub fn iso_to_js_weekday(day: u8) -> Result<u8> {
    match day {
        7 => Ok(0),
        1..=6 => Ok(day),
        _ => Err(CallogError::InvalidWeekday(format!(
            "{} is not in 1..=7",
            day
        ))),
    }
}

/// Serde adapter for `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}
