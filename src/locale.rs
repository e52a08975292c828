//! UI strings in English and Russian.
//!
//! Lookups fall back from the requested locale to English and then to the
//! key itself, so a missing entry shows up as its key rather than as a blank.

use crate::models::AuthUser;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// `ru`, `ru-RU` and friends pick Russian; anything else is English.
    pub fn from_language_code(code: Option<&str>) -> Self {
        match code.and_then(|code| code.split(['-', '_']).next()) {
            Some(primary) if primary.eq_ignore_ascii_case("ru") => Locale::Ru,
            _ => Locale::En,
        }
    }

    pub fn for_user(user: Option<&AuthUser>) -> Self {
        Self::from_language_code(user.and_then(|user| user.language_code.as_deref()))
    }

    pub fn tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("today.title", "Today"),
    ("today.noHabits", "No habits yet"),
    ("today.nothingScheduled", "Nothing scheduled today"),
    ("today.allDone", "All {n} habits done today"),
    ("today.progress", "{done}/{total} done · {remaining} remaining · {rate}%"),
    ("today.markDone", "Mark done"),
    ("today.done", "Done"),
    ("auth.guest", "Guest · saved on this device"),
    ("habits.new", "New Habit"),
    ("habits.namePlaceholder", "e.g., Read 30 minutes"),
    ("habits.addLabel", "Add habit"),
    ("detail.currentStreak", "current streak"),
    ("detail.longestStreak", "longest streak"),
    ("detail.last30", "last 30 days"),
    ("calendar.summary", "{done} of {total} scheduled days done"),
    ("heatmap.notScheduled", "Not scheduled"),
    ("heatmap.missed", "Missed"),
    ("heatmap.completed", "Completed"),
    ("error.requestFailed", "Request failed"),
    ("days.mon", "Mon"),
    ("days.tue", "Tue"),
    ("days.wed", "Wed"),
    ("days.thu", "Thu"),
    ("days.fri", "Fri"),
    ("days.sat", "Sat"),
    ("days.sun", "Sun"),
    ("months.january", "January"),
    ("months.february", "February"),
    ("months.march", "March"),
    ("months.april", "April"),
    ("months.may", "May"),
    ("months.june", "June"),
    ("months.july", "July"),
    ("months.august", "August"),
    ("months.september", "September"),
    ("months.october", "October"),
    ("months.november", "November"),
    ("months.december", "December"),
    ("months.jan", "Jan"),
    ("months.feb", "Feb"),
    ("months.mar", "Mar"),
    ("months.apr", "Apr"),
    ("months.mayShort", "May"),
    ("months.jun", "Jun"),
    ("months.jul", "Jul"),
    ("months.aug", "Aug"),
    ("months.sep", "Sep"),
    ("months.oct", "Oct"),
    ("months.nov", "Nov"),
    ("months.dec", "Dec"),
];

const RU: &[(&str, &str)] = &[
    ("today.title", "Сегодня"),
    ("today.noHabits", "Пока нет привычек"),
    ("today.nothingScheduled", "На сегодня ничего не запланировано"),
    ("today.allDone", "Все привычки выполнены: {n}"),
    ("today.progress", "{done}/{total} выполнено · осталось {remaining} · {rate}%"),
    ("today.markDone", "Отметить"),
    ("today.done", "Готово"),
    ("auth.guest", "Гость · данные на этом устройстве"),
    ("habits.new", "Новая привычка"),
    ("habits.namePlaceholder", "напр., Читать 30 минут"),
    ("habits.addLabel", "Добавить привычку"),
    ("detail.currentStreak", "текущая серия"),
    ("detail.longestStreak", "лучшая серия"),
    ("detail.last30", "за 30 дней"),
    ("calendar.summary", "{done} из {total} запланированных дней"),
    ("heatmap.notScheduled", "Не запланировано"),
    ("heatmap.missed", "Пропущено"),
    ("heatmap.completed", "Выполнено"),
    ("error.requestFailed", "Ошибка запроса"),
    ("days.mon", "Пн"),
    ("days.tue", "Вт"),
    ("days.wed", "Ср"),
    ("days.thu", "Чт"),
    ("days.fri", "Пт"),
    ("days.sat", "Сб"),
    ("days.sun", "Вс"),
    ("months.january", "Январь"),
    ("months.february", "Февраль"),
    ("months.march", "Март"),
    ("months.april", "Апрель"),
    ("months.may", "Май"),
    ("months.june", "Июнь"),
    ("months.july", "Июль"),
    ("months.august", "Август"),
    ("months.september", "Сентябрь"),
    ("months.october", "Октябрь"),
    ("months.november", "Ноябрь"),
    ("months.december", "Декабрь"),
    ("months.jan", "Янв"),
    ("months.feb", "Фев"),
    ("months.mar", "Мар"),
    ("months.apr", "Апр"),
    ("months.mayShort", "Май"),
    ("months.jun", "Июн"),
    ("months.jul", "Июл"),
    ("months.aug", "Авг"),
    ("months.sep", "Сен"),
    ("months.oct", "Окт"),
    ("months.nov", "Ноя"),
    ("months.dec", "Дек"),
];

const DAY_KEYS: [&str; 7] = [
    "days.mon", "days.tue", "days.wed", "days.thu", "days.fri", "days.sat", "days.sun",
];

const MONTH_KEYS: [&str; 12] = [
    "months.january",
    "months.february",
    "months.march",
    "months.april",
    "months.may",
    "months.june",
    "months.july",
    "months.august",
    "months.september",
    "months.october",
    "months.november",
    "months.december",
];

const SHORT_MONTH_KEYS: [&str; 12] = [
    "months.jan", "months.feb", "months.mar", "months.apr", "months.mayShort", "months.jun",
    "months.jul", "months.aug", "months.sep", "months.oct", "months.nov", "months.dec",
];

static TABLES: Lazy<HashMap<Locale, HashMap<&'static str, &'static str>>> = Lazy::new(|| {
    HashMap::from([
        (Locale::En, EN.iter().copied().collect()),
        (Locale::Ru, RU.iter().copied().collect()),
    ])
});

fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    TABLES.get(&locale)?.get(key).copied()
}

pub fn t<'a>(locale: Locale, key: &'a str) -> &'a str {
    lookup(locale, key)
        .or_else(|| lookup(Locale::En, key))
        .unwrap_or(key)
}

/// [`t`] with `{name}` placeholders filled in.
pub fn t_with(locale: Locale, key: &str, args: &[(&str, String)]) -> String {
    args.iter()
        .fold(t(locale, key).to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
}

/// Short weekday label for a schedule day (Mon=0). Out-of-range days yield "".
pub fn day_label(locale: Locale, schedule_day: usize) -> &'static str {
    DAY_KEYS
        .get(schedule_day)
        .copied()
        .map(|key| t(locale, key))
        .unwrap_or_default()
}

/// Month name for a 1-based month. Out-of-range months yield "".
pub fn month_name(locale: Locale, month: u32) -> &'static str {
    month_key(&MONTH_KEYS, month).map(|key| t(locale, key)).unwrap_or_default()
}

pub fn short_month_name(locale: Locale, month: u32) -> &'static str {
    month_key(&SHORT_MONTH_KEYS, month)
        .map(|key| t(locale, key))
        .unwrap_or_default()
}

fn month_key(keys: &[&'static str; 12], month: u32) -> Option<&'static str> {
    keys.get(month.checked_sub(1)? as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_russian_from_language_code() {
        assert_eq!(Locale::from_language_code(Some("ru")), Locale::Ru);
        assert_eq!(Locale::from_language_code(Some("ru-RU")), Locale::Ru);
        assert_eq!(Locale::from_language_code(Some("en")), Locale::En);
        assert_eq!(Locale::from_language_code(Some("de")), Locale::En);
        assert_eq!(Locale::from_language_code(None), Locale::En);
    }

    #[test]
    fn lookups_fall_back_to_english_then_key() {
        assert_eq!(t(Locale::Ru, "today.title"), "Сегодня");
        assert_eq!(t(Locale::En, "today.title"), "Today");
        assert_eq!(t(Locale::Ru, "no.such.key"), "no.such.key");
    }

    #[test]
    fn every_english_key_has_a_russian_entry() {
        for (key, _) in EN {
            assert!(lookup(Locale::Ru, key).is_some(), "missing ru entry for {key}");
        }
    }

    #[test]
    fn fills_placeholders() {
        let text = t_with(
            Locale::En,
            "calendar.summary",
            &[("done", "3".to_string()), ("total", "5".to_string())],
        );
        assert_eq!(text, "3 of 5 scheduled days done");
    }

    #[test]
    fn names_days_and_months() {
        assert_eq!(day_label(Locale::Ru, 0), "Пн");
        assert_eq!(day_label(Locale::En, 6), "Sun");
        assert_eq!(day_label(Locale::En, 7), "");
        assert_eq!(month_name(Locale::Ru, 2), "Февраль");
        assert_eq!(short_month_name(Locale::En, 5), "May");
        assert_eq!(month_name(Locale::En, 0), "");
        assert_eq!(month_name(Locale::En, 13), "");
    }
}
