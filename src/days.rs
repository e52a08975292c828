//! Day-of-week conventions.
//!
//! Two encodings are in play. A *native* day index comes from the calendar
//! primitive (Sunday=0 .. Saturday=6); a *schedule* day index is what a habit
//! stores in `days` (Monday=0 .. Sunday=6). Dates are converted exactly once,
//! in [`schedule_day_of`]; everything downstream works in schedule days only.

use chrono::{Datelike, Local, NaiveDate};

pub const DAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Native (Sunday=0) to schedule (Monday=0).
pub fn to_schedule_day(native_day: u8) -> u8 {
    if native_day == 0 { 6 } else { native_day - 1 }
}

/// Schedule (Monday=0) to native (Sunday=0).
pub fn to_native_day(schedule_day: u8) -> u8 {
    if schedule_day == 6 { 0 } else { schedule_day + 1 }
}

pub fn schedule_day_of(date: NaiveDate) -> u8 {
    to_schedule_day(date.weekday().num_days_from_sunday() as u8)
}

pub fn is_scheduled_on(days: &[u8], date: NaiveDate) -> bool {
    days.contains(&schedule_day_of(date))
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// The viewer's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
