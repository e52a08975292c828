use crate::days::{DAY_LABELS, date_key, schedule_day_of, today};
use crate::models::{Habit, HabitStats, TodayHabit, TodaySummary, WeeklyBucket};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

const LOOKBACK_DAYS: i64 = 365;
const RATE_WINDOW_DAYS: i64 = 30;
const WEEKLY_LOOKBACK_WEEKS: i64 = 4;

pub fn compute_stats(habit: &Habit) -> HabitStats {
    compute_stats_at(today(), habit)
}

pub fn compute_stats_at(as_of: NaiveDate, habit: &Habit) -> HabitStats {
    let completions = habit.completion_map();
    let total_completions = completions.values().filter(|done| **done).count() as u32;

    HabitStats {
        current_streak: current_streak(as_of, habit, &completions),
        longest_streak: longest_streak(as_of, habit, &completions),
        completion_rate_last_30: completion_rate(as_of, habit, &completions),
        total_completions,
        weekly_buckets: weekly_buckets(as_of, habit, &completions),
    }
}

fn completed_on(completions: &HashMap<&str, bool>, date: NaiveDate) -> bool {
    completions.get(date_key(date).as_str()).copied().unwrap_or(false)
}

/// Walks backward from `as_of`. The reference day itself may still be open, so
/// an incomplete `as_of` is skipped rather than ending the streak.
fn current_streak(as_of: NaiveDate, habit: &Habit, completions: &HashMap<&str, bool>) -> u32 {
    let mut streak = 0;
    for offset in 0..LOOKBACK_DAYS {
        let date = as_of - Duration::days(offset);
        if !habit.is_scheduled_on(date) {
            continue;
        }
        if completed_on(completions, date) {
            streak += 1;
        } else if offset > 0 {
            break;
        }
    }
    streak
}

fn longest_streak(as_of: NaiveDate, habit: &Habit, completions: &HashMap<&str, bool>) -> u32 {
    let mut longest = 0;
    let mut running = 0;
    for offset in (0..LOOKBACK_DAYS).rev() {
        let date = as_of - Duration::days(offset);
        if !habit.is_scheduled_on(date) {
            continue;
        }
        if completed_on(completions, date) {
            running += 1;
            longest = longest.max(running);
        } else {
            running = 0;
        }
    }
    longest
}

fn completion_rate(as_of: NaiveDate, habit: &Habit, completions: &HashMap<&str, bool>) -> u32 {
    let mut total = 0u32;
    let mut completed = 0u32;
    for offset in 0..RATE_WINDOW_DAYS {
        let date = as_of - Duration::days(offset);
        if habit.is_scheduled_on(date) {
            total += 1;
            if completed_on(completions, date) {
                completed += 1;
            }
        }
    }
    percent(completed, total)
}

/// One bucket per schedule weekday, over its last four occurrences on or
/// before `as_of`.
fn weekly_buckets(
    as_of: NaiveDate,
    habit: &Habit,
    completions: &HashMap<&str, bool>,
) -> Vec<WeeklyBucket> {
    let as_of_day = i64::from(schedule_day_of(as_of));

    DAY_LABELS
        .iter()
        .enumerate()
        .map(|(schedule_day, label)| {
            let back = (as_of_day - schedule_day as i64).rem_euclid(7);
            let mut completed = 0;
            let mut total = 0;
            for week in 0..WEEKLY_LOOKBACK_WEEKS {
                let date = as_of - Duration::days(back + week * 7);
                if habit.is_scheduled_on(date) {
                    total += 1;
                    if completed_on(completions, date) {
                        completed += 1;
                    }
                }
            }
            WeeklyBucket {
                label: (*label).to_string(),
                completed,
                total,
            }
        })
        .collect()
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
}

pub fn is_habit_active_on(habit: &Habit, date: NaiveDate) -> bool {
    habit.is_scheduled_on(date)
}

pub fn is_habit_completed_on(habit: &Habit, date: NaiveDate) -> bool {
    habit.is_completed_on(date)
}

pub fn is_habit_completed_today(habit: &Habit) -> bool {
    is_habit_completed_on(habit, today())
}

pub fn today_summary(habits: &[Habit]) -> TodaySummary {
    today_summary_at(today(), habits)
}

pub fn today_summary_at(date: NaiveDate, habits: &[Habit]) -> TodaySummary {
    let active: Vec<TodayHabit> = habits
        .iter()
        .filter(|habit| is_habit_active_on(habit, date))
        .map(|habit| TodayHabit {
            id: habit.id.clone(),
            name: habit.name.clone(),
            time: habit.time.clone(),
            color: habit.color.clone(),
            completed: is_habit_completed_on(habit, date),
        })
        .collect();

    let total = active.len() as u32;
    let completed = active.iter().filter(|habit| habit.completed).count() as u32;

    TodaySummary {
        date: date_key(date),
        total,
        completed,
        remaining: total - completed,
        completion_rate: percent(completed, total),
        habits: active,
    }
}
