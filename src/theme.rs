use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HABIT_COLORS: [&str; 13] = [
    "#ef4444", "#f97316", "#eab308", "#84cc16", "#22c55e", "#14b8a6", "#06b6d4", "#3b82f6",
    "#8b5cf6", "#a855f7", "#ec4899", "#f43f5e", "#64748b",
];

pub const DEFAULT_HABIT_COLOR: &str = "#8b5cf6";

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn habit_color_with_opacity(color: &str, opacity: f32) -> String {
    let (r, g, b) = parse_hex(color)
        .or_else(|| parse_hex(DEFAULT_HABIT_COLOR))
        .unwrap_or_default();
    format!("rgba({r}, {g}, {b}, {opacity})")
}

/// Dark ink on light backgrounds, white otherwise (YIQ brightness).
pub fn contrast_color(color: &str) -> &'static str {
    match parse_hex(color) {
        Some((r, g, b)) => {
            let yiq = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
            if yiq >= 128 { "#0b1221" } else { "#ffffff" }
        }
        None => "#ffffff",
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Light,
    #[default]
    Dark,
}

/// Colors the host platform passes to the page.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ThemeParams {
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub hint_color: Option<String>,
    pub link_color: Option<String>,
    pub button_color: Option<String>,
    pub button_text_color: Option<String>,
    pub secondary_bg_color: Option<String>,
    pub header_bg_color: Option<String>,
    pub section_bg_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    #[serde(default)]
    pub color_scheme: Option<ColorScheme>,
    #[serde(default)]
    pub theme_params: ThemeParams,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub scheme: ColorScheme,
    pub variables: BTreeMap<String, String>,
}

struct Fallback {
    bg: &'static str,
    text: &'static str,
    hint: &'static str,
    link: &'static str,
    primary: &'static str,
    secondary_bg: &'static str,
    header_bg: &'static str,
    section_bg: &'static str,
}

const COZY: Fallback = Fallback {
    bg: "#0b0b10",
    text: "#e5e7eb",
    hint: "#9aa4b2",
    link: "#a78bfa",
    primary: "#8b5cf6",
    secondary_bg: "#111827",
    header_bg: "#0f172a",
    section_bg: "#111827",
};

pub fn resolve_theme(request: &ThemeRequest) -> ThemeResponse {
    let params = &request.theme_params;
    let pick = |value: &Option<String>, fallback: &'static str| {
        value
            .as_deref()
            .filter(|v| parse_hex(v).is_some())
            .unwrap_or(fallback)
            .to_string()
    };

    let primary = pick(&params.button_color, COZY.primary);
    let primary_text = params
        .button_text_color
        .clone()
        .filter(|v| parse_hex(v).is_some())
        .unwrap_or_else(|| contrast_color(&primary).to_string());

    let mut variables = BTreeMap::new();
    variables.insert("--background".to_string(), pick(&params.bg_color, COZY.bg));
    variables.insert("--foreground".to_string(), pick(&params.text_color, COZY.text));
    variables.insert("--muted-foreground".to_string(), pick(&params.hint_color, COZY.hint));
    variables.insert("--link".to_string(), pick(&params.link_color, COZY.link));
    variables.insert(
        "--secondary".to_string(),
        pick(&params.secondary_bg_color, COZY.secondary_bg),
    );
    variables.insert("--header".to_string(), pick(&params.header_bg_color, COZY.header_bg));
    variables.insert("--card".to_string(), pick(&params.section_bg_color, COZY.section_bg));
    variables.insert("--primary".to_string(), primary);
    variables.insert("--primary-foreground".to_string(), primary_text);

    ThemeResponse {
        scheme: request.color_scheme.unwrap_or_default(),
        variables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_expands_hex() {
        assert_eq!(habit_color_with_opacity("#8b5cf6", 0.35), "rgba(139, 92, 246, 0.35)");
        assert_eq!(habit_color_with_opacity("nope", 0.5), "rgba(139, 92, 246, 0.5)");
    }

    #[test]
    fn contrast_picks_readable_ink() {
        assert_eq!(contrast_color("#ffffff"), "#0b1221");
        assert_eq!(contrast_color("#8b5cf6"), "#ffffff");
        assert_eq!(contrast_color("garbage"), "#ffffff");
    }

    #[test]
    fn theme_falls_back_to_cozy_palette() {
        let request = ThemeRequest {
            color_scheme: Some(ColorScheme::Light),
            theme_params: ThemeParams {
                button_color: Some("#eab308".to_string()),
                bg_color: Some("not-a-color".to_string()),
                ..ThemeParams::default()
            },
        };
        let theme = resolve_theme(&request);
        assert_eq!(theme.scheme, ColorScheme::Light);
        assert_eq!(theme.variables["--background"], "#0b0b10");
        assert_eq!(theme.variables["--primary"], "#eab308");
        assert_eq!(theme.variables["--primary-foreground"], "#0b1221");
    }

    #[test]
    fn palette_contains_default() {
        assert!(HABIT_COLORS.contains(&DEFAULT_HABIT_COLOR));
    }
}
