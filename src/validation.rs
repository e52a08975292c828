use crate::errors::AppError;
use crate::models::HabitInput;
use crate::theme::DEFAULT_HABIT_COLOR;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_NAME_CHARS: usize = 255;

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})$").expect("time pattern compiles"));
static COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern compiles"));

/// Checks a create/update payload and returns its normalized form: trimmed
/// name, sorted unique days, default color when none was picked.
pub fn validate_input(input: &HabitInput) -> Result<HabitInput, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("habit name is required"));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::validation(format!(
            "habit name must be at most {MAX_NAME_CHARS} characters"
        )));
    }

    if input.days.is_empty() {
        return Err(AppError::validation("pick at least one day"));
    }
    if let Some(day) = input.days.iter().find(|day| **day > 6) {
        return Err(AppError::validation(format!("day {day} is out of range 0..=6")));
    }
    let mut days = input.days.clone();
    days.sort_unstable();
    days.dedup();

    validate_time(&input.time)?;

    let color = input.color.trim();
    let color = if color.is_empty() {
        DEFAULT_HABIT_COLOR.to_string()
    } else if COLOR_PATTERN.is_match(color) {
        color.to_lowercase()
    } else {
        return Err(AppError::validation(format!("invalid color {color}")));
    };

    Ok(HabitInput {
        name: name.to_string(),
        days,
        time: input.time.clone(),
        color,
    })
}

fn validate_time(time: &str) -> Result<(), AppError> {
    let malformed = || AppError::validation(format!("time must be HH:MM, got {time:?}"));
    let captures = TIME_PATTERN.captures(time).ok_or_else(malformed)?;
    let hours: u32 = captures[1].parse().map_err(|_| malformed())?;
    let minutes: u32 = captures[2].parse().map_err(|_| malformed())?;
    if hours > 23 || minutes > 59 {
        return Err(malformed());
    }
    Ok(())
}
