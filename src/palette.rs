//! Consumer side of the palette-suggestion service.

use anyhow::{Context, Result};
use serde::Deserialize;
use settings_model::{Background, Rgba8, SettingsSnapshot};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradientPair {
    pub start: Rgba8,
    pub end: Rgba8,
}

/// Colors suggested for a screenshot. Entries that are not valid hex colors are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteSuggestion {
    pub colors: Vec<Rgba8>,
    pub gradients: Vec<GradientPair>,
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    gradients: Vec<RawGradient>,
}

#[derive(Deserialize)]
struct RawGradient {
    start: String,
    end: String,
}

fn color(raw: &str) -> Option<Rgba8> {
    let parsed = Rgba8::parse_hex(raw);
    if parsed.is_none() {
        debug!(value = raw, "ignoring invalid palette color");
    }
    parsed
}

/// Strip an optional Markdown code fence (with or without a language tag).
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

impl PaletteSuggestion {
    pub fn from_response_text(text: &str) -> Result<Self> {
        let raw: RawSuggestion =
            serde_json::from_str(strip_fence(text)).context("palette response is not valid JSON")?;
        Ok(Self {
            colors: raw.colors.iter().filter_map(|c| color(c)).collect(),
            gradients: raw
                .gradients
                .iter()
                .filter_map(|g| {
                    Some(GradientPair {
                        start: color(&g.start)?,
                        end: color(&g.end)?,
                    })
                })
                .collect(),
        })
    }

    /// New snapshot with the suggestion applied to the active background. Solid takes the
    /// first color, gradient the first pair, generative the first five colors. Pattern and
    /// wallpaper backgrounds keep their look. Absent suggestions never overwrite anything.
    pub fn apply_to(&self, snapshot: &SettingsSnapshot) -> SettingsSnapshot {
        let background = match &snapshot.background {
            Background::Solid { color } => Background::Solid {
                color: self.colors.first().copied().unwrap_or(*color),
            },
            Background::Gradient { start, end } => match self.gradients.first() {
                Some(pair) => Background::Gradient {
                    start: pair.start,
                    end: pair.end,
                },
                None => Background::Gradient {
                    start: *start,
                    end: *end,
                },
            },
            Background::Generative(params) if !self.colors.is_empty() => {
                let mut params = params.clone();
                params.palette = self.colors.iter().take(5).copied().collect();
                Background::Generative(params)
            }
            other => other.clone(),
        };
        snapshot.with_background(background)
    }
}
