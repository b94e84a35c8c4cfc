//! Translation of the 0–1 safety slider into provider safety settings.

use serde::Serialize;

/// Harm categories a threshold is applied to.
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Provider's categorical blocking scale, least to most strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl HarmBlockThreshold {
    /// Breakpoints: ≤0.25, ≤0.5, ≤0.75, >0.75. Higher means stricter.
    pub fn from_slider(value: f64) -> Self {
        if value <= 0.25 {
            HarmBlockThreshold::BlockNone
        } else if value <= 0.5 {
            HarmBlockThreshold::BlockOnlyHigh
        } else if value <= 0.75 {
            HarmBlockThreshold::BlockMediumAndAbove
        } else {
            HarmBlockThreshold::BlockLowAndAbove
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: HarmBlockThreshold,
}

pub fn safety_settings(slider: f64) -> Vec<SafetySetting> {
    let threshold = HarmBlockThreshold::from_slider(slider);
    HARM_CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold,
        })
        .collect()
}
