use crate::models::HabitInput;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HabitTemplate {
    pub name: &'static str,
    pub days: &'static [u8],
    pub time: &'static str,
    pub color: &'static str,
}

const EVERY_DAY: &[u8] = &[0, 1, 2, 3, 4, 5, 6];

pub const HABIT_TEMPLATES: [HabitTemplate; 10] = [
    HabitTemplate { name: "📖 Read", days: EVERY_DAY, time: "21:00", color: "#3b82f6" },
    HabitTemplate { name: "🏃 Run", days: &[0, 2, 4], time: "07:00", color: "#22c55e" },
    HabitTemplate { name: "🧘 Meditate", days: EVERY_DAY, time: "06:30", color: "#a855f7" },
    HabitTemplate { name: "💪 Workout", days: &[0, 2, 4], time: "08:00", color: "#ef4444" },
    HabitTemplate { name: "💧 Drink Water", days: EVERY_DAY, time: "09:00", color: "#06b6d4" },
    HabitTemplate { name: "📝 Journal", days: EVERY_DAY, time: "22:00", color: "#eab308" },
    HabitTemplate { name: "🎸 Practice Music", days: &[0, 1, 2, 3, 4], time: "18:00", color: "#f97316" },
    HabitTemplate { name: "🧹 Clean", days: &[5, 6], time: "10:00", color: "#14b8a6" },
    HabitTemplate { name: "📱 No Screens", days: EVERY_DAY, time: "21:30", color: "#64748b" },
    HabitTemplate { name: "🌿 Walk Outside", days: EVERY_DAY, time: "12:00", color: "#84cc16" },
];

impl From<&HabitTemplate> for HabitInput {
    fn from(template: &HabitTemplate) -> Self {
        Self {
            name: template.name.to_string(),
            days: template.days.to_vec(),
            time: template.time.to_string(),
            color: template.color.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_input;

    #[test]
    fn every_template_passes_validation() {
        for template in &HABIT_TEMPLATES {
            assert!(validate_input(&HabitInput::from(template)).is_ok(), "{}", template.name);
        }
    }
}
