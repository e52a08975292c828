use crate::days::{date_key, is_scheduled_on};
use crate::theme::DEFAULT_HABIT_COLOR;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    /// Schedule days, Monday=0 .. Sunday=6.
    pub days: Vec<u8>,
    pub time: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<Vec<HabitCompletion>>,
}

impl Habit {
    /// Date key to completion flag. Later entries win over earlier ones.
    pub fn completion_map(&self) -> HashMap<&str, bool> {
        self.completions
            .iter()
            .flatten()
            .map(|c| (c.date.as_str(), c.completed))
            .collect()
    }

    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        is_scheduled_on(&self.days, date)
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        let key = date_key(date);
        self.completion_map().get(key.as_str()).copied().unwrap_or(false)
    }

    /// Upsert, the same way the backend treats the completion endpoint.
    pub fn set_completion(&mut self, date: &str, completed: bool) {
        let completions = self.completions.get_or_insert_with(Vec::new);
        completions.retain(|c| c.date != date);
        completions.push(HabitCompletion {
            date: date.to_string(),
            completed,
        });
    }
}

fn default_color() -> String {
    DEFAULT_HABIT_COLOR.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitCompletion {
    pub date: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitInput {
    pub name: String,
    pub days: Vec<u8>,
    pub time: String,
    #[serde(default)]
    pub color: String,
}

impl From<&Habit> for HabitInput {
    fn from(habit: &Habit) -> Self {
        Self {
            name: habit.name.clone(),
            days: habit.days.clone(),
            time: habit.time.clone(),
            color: habit.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub date: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.username) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (Some(first), None, _) => first.clone(),
            (None, _, Some(username)) => format!("@{username}"),
            _ => format!("user {}", self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the platform bridge hands over at launch; also the telegram auth body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformIdentity {
    pub init_data: String,
    #[serde(default)]
    pub init_data_unsafe: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyBucket {
    pub label: String,
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completion_rate_last_30: u32,
    pub total_completions: u32,
    pub weekly_buckets: Vec<WeeklyBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCell {
    pub date: String,
    pub day_of_month: u32,
    pub in_current_month: bool,
    pub is_scheduled: bool,
    pub is_completed: bool,
    pub is_today: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub weeks: Vec<[DayCell; 7]>,
    pub scheduled_days: u32,
    pub completed_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YearGrid {
    pub year: i32,
    pub months: Vec<MonthGrid>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodayHabit {
    pub id: String,
    pub name: String,
    pub time: String,
    pub color: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodaySummary {
    pub date: String,
    pub total: u32,
    pub completed: u32,
    pub remaining: u32,
    pub completion_rate: u32,
    pub habits: Vec<TodayHabit>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: String,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HabitsResponse {
    pub habits: Vec<Habit>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthStateResponse {
    pub is_authenticated: bool,
    pub user: Option<AuthUser>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub backend: bool,
}
