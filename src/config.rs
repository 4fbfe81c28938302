use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub use settings_model::SettingsSnapshot;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Device-pixel multiplier for exported rasters (previews always render at 1.0).
    pub export_pixel_ratio: f64,
    /// Upper bound on the shadow blur sigma, in device pixels.
    pub shadow_blur_max_sigma: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            export_pixel_ratio: 1.0,
            shadow_blur_max_sigma: 64.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Composition settings for the first render.
    pub settings: SettingsSnapshot,
    pub render: RenderConfig,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Validate invariants serde defaults cannot express.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.render.export_pixel_ratio.is_finite() && self.render.export_pixel_ratio > 0.0,
            "export-pixel-ratio must be positive"
        );
        ensure!(
            self.render.export_pixel_ratio <= 8.0,
            "export-pixel-ratio must be at most 8"
        );
        ensure!(
            self.render.shadow_blur_max_sigma.is_finite()
                && self.render.shadow_blur_max_sigma > 0.0,
            "shadow-blur-max-sigma must be positive"
        );
        self.settings
            .validate()
            .context("invalid settings section")?;
        Ok(self)
    }
}
