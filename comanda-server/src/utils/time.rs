//! Business-timezone date helpers
//!
//! Handlers turn `YYYY-MM-DD` query parameters into `[start, end)` Unix-millis
//! ranges here; repositories only ever see `i64` millis.

use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Parse `YYYY-MM-DD`
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Today in the business timezone
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// Optional `YYYY-MM-DD` parameter, defaulting to today
pub fn date_or_today(date: Option<&str>, tz: Tz) -> AppResult<NaiveDate> {
    match date {
        Some(d) if !d.trim().is_empty() => parse_date(d),
        _ => Ok(today(tz)),
    }
}

/// Local midnight → Unix millis. A midnight skipped by DST falls back to UTC.
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Next local midnight → Unix millis (exclusive end of the day)
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day, tz)
}

/// `[start, end)` millis range for a business day
pub fn day_range(date: NaiveDate, tz: Tz) -> (i64, i64) {
    (day_start_millis(date, tz), day_end_millis(date, tz))
}

/// Unix millis → `YYYY-MM-DD HH:MM:SS` in the business timezone
pub fn format_millis(millis: i64, tz: Tz) -> String {
    match tz.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
