use crate::days::date_key;
use crate::errors::AppError;
use crate::models::{DayCell, Habit, MonthGrid, YearGrid};
use crate::overlay::OptimisticOverlay;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn build_month_grid(
    year: i32,
    month: u32,
    habit: &Habit,
    today: NaiveDate,
) -> Result<MonthGrid, AppError> {
    build_month_grid_with(year, month, habit, today, &OptimisticOverlay::default())
}

/// Monday-first month grid padded with adjacent-month days, with pending
/// overrides laid over the habit's completions.
pub fn build_month_grid_with(
    year: i32,
    month: u32,
    habit: &Habit,
    today: NaiveDate,
    overlay: &OptimisticOverlay,
) -> Result<MonthGrid, AppError> {
    let (first, last) = month_bounds(year, month)?;
    let completions = habit.completion_map();
    let today_key = date_key(today);

    let cell = |date: NaiveDate| {
        let key = date_key(date);
        let is_completed = overlay
            .get(&key)
            .or_else(|| completions.get(key.as_str()).copied())
            .unwrap_or(false);
        DayCell {
            day_of_month: date.day(),
            in_current_month: date.month() == month && date.year() == year,
            is_scheduled: habit.is_scheduled_on(date),
            is_completed,
            is_today: key == today_key,
            date: key,
        }
    };

    let mut weeks: Vec<[DayCell; 7]> = Vec::with_capacity(6);
    let mut week_start = first - Duration::days(i64::from(first.weekday().num_days_from_monday()));
    while week_start <= last {
        let start = week_start;
        weeks.push(std::array::from_fn(|offset| cell(start + Duration::days(offset as i64))));
        week_start += Duration::weeks(1);
    }

    let in_month = || weeks.iter().flatten().filter(|c: &&DayCell| c.in_current_month);
    let scheduled_days = in_month().filter(|c| c.is_scheduled).count() as u32;
    let completed_days = in_month().filter(|c| c.is_scheduled && c.is_completed).count() as u32;

    Ok(MonthGrid {
        year,
        month,
        label: format!("{} {year}", MONTH_NAMES[(month - 1) as usize]),
        weeks,
        scheduled_days,
        completed_days,
    })
}

pub fn build_year_grid(year: i32, habit: &Habit, today: NaiveDate) -> Result<YearGrid, AppError> {
    let months = (1..=12)
        .map(|month| build_month_grid(year, month, habit, today))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(YearGrid { year, months })
}

/// Moves `delta` months from (`year`, `month`), crossing year boundaries.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

impl DayCell {
    /// Only past or current days of the displayed month accept a toggle.
    pub fn is_tappable(&self, today: NaiveDate) -> bool {
        self.in_current_month && self.date <= date_key(today)
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let invalid = || AppError::validation(format!("invalid month {year}-{month}"));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
    Ok((first, next - Duration::days(1)))
}

/// Day-cell lookup by date key, for callers that need a single cell.
pub fn cells_by_date(grid: &MonthGrid) -> HashMap<&str, &DayCell> {
    grid.weeks
        .iter()
        .flatten()
        .map(|cell| (cell.date.as_str(), cell))
        .collect()
}
