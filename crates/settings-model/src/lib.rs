use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};

pub use background::{Background, GenerativeParams, PatternId};
pub use color::Rgba8;
pub use presets::{
    GRADIENT_PRESETS, GradientPreset, PERSPECTIVE_PRESETS, PerspectivePreset, SOLID_COLOR_PRESETS,
    SolidColorPreset, gradient_preset, perspective_preset, solid_color_preset,
};

mod color {
    use super::*;

    /// Straight-alpha 8-bit sRGB color, parsed from a CSS-style hex literal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Rgba8 {
        pub r: u8,
        pub g: u8,
        pub b: u8,
        pub a: u8,
    }

    impl Rgba8 {
        pub const BLACK: Self = Self::rgb(0, 0, 0);
        pub const WHITE: Self = Self::rgb(255, 255, 255);

        pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b, a: 255 }
        }

        pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
            Self { r, g, b, a }
        }

        /// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa` (leading `#` optional).
        pub fn parse_hex(value: &str) -> Option<Self> {
            let hex = value.trim().trim_start_matches('#');
            if !hex.is_ascii() {
                return None;
            }
            let short = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
            let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            match hex.len() {
                3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
                4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
                6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
                8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
                _ => None,
            }
        }

        /// Scales the RGB channels toward black by `amount` in `[0, 1]`.
        pub fn darken(&self, amount: f32) -> Self {
            let keep = 1.0 - amount.clamp(0.0, 1.0);
            let ch = |v: u8| ((v as f32) * keep).round().clamp(0.0, 255.0) as u8;
            Self::rgba(ch(self.r), ch(self.g), ch(self.b), self.a)
        }

        pub fn with_alpha(&self, a: u8) -> Self {
            Self::rgba(self.r, self.g, self.b, a)
        }
    }

    impl fmt::Display for Rgba8 {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
            if self.a != 255 {
                write!(f, "{:02x}", self.a)?;
            }
            Ok(())
        }
    }

    impl FromStr for Rgba8 {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> Result<Self> {
            Self::parse_hex(s).ok_or_else(|| anyhow!("invalid hex color '{s}'"))
        }
    }

    impl<'de> Deserialize<'de> for Rgba8 {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = String::deserialize(deserializer)?;
            Self::parse_hex(&raw)
                .ok_or_else(|| de::Error::custom(format!("invalid hex color '{raw}'")))
        }
    }
}

mod background {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum PatternId {
        Hearts,
        Dots,
        Stripes,
        Grid,
    }

    impl PatternId {
        pub const ALL: &'static [Self] = &[Self::Hearts, Self::Dots, Self::Stripes, Self::Grid];

        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Hearts => "hearts",
                Self::Dots => "dots",
                Self::Stripes => "stripes",
                Self::Grid => "grid",
            }
        }

        /// Base color the preset ships with.
        pub const fn preset_color(&self) -> Rgba8 {
            match self {
                Self::Hearts => Rgba8::rgb(0xa8, 0xd8, 0xf0),
                Self::Dots => Rgba8::rgb(0xff, 0xd6, 0xcc),
                Self::Stripes => Rgba8::rgb(0xe8, 0xf5, 0xe8),
                Self::Grid => Rgba8::rgb(0xf0, 0xe6, 0xff),
            }
        }

        /// Legacy lookup: older settings only stored the preset's base color.
        pub fn from_preset_color(color: Rgba8) -> Option<Self> {
            Self::ALL
                .iter()
                .copied()
                .find(|id| id.preset_color() == color.with_alpha(255))
        }

        /// Resolve the pattern to draw and its base color. An explicit id wins over the
        /// color lookup.
        pub fn resolve(pattern: Option<Self>, color: Option<Rgba8>) -> Option<(Self, Rgba8)> {
            match (pattern, color) {
                (Some(id), Some(color)) => Some((id, color)),
                (Some(id), None) => Some((id, id.preset_color())),
                (None, Some(color)) => Self::from_preset_color(color).map(|id| (id, color)),
                (None, None) => None,
            }
        }
    }

    impl fmt::Display for PatternId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case", default)]
    pub struct GenerativeParams {
        /// Ordered blob colors; an empty palette falls back to the built-in one.
        pub palette: Vec<Rgba8>,
        pub seed: u64,
        /// Animation clock in seconds. Fixed per snapshot so renders stay reproducible.
        pub time: f32,
        pub speed: f32,
        pub scale: f32,
        pub distortion: f32,
        pub grain: f32,
    }

    impl GenerativeParams {
        pub const FALLBACK_PALETTE: [Rgba8; 5] = [
            Rgba8::rgb(0xf9, 0x73, 0x16),
            Rgba8::rgb(0xfb, 0xbf, 0x24),
            Rgba8::rgb(0xec, 0x48, 0x99),
            Rgba8::rgb(0x8b, 0x5c, 0xf6),
            Rgba8::rgb(0x3b, 0x82, 0xf6),
        ];

        pub fn effective_palette(&self) -> &[Rgba8] {
            if self.palette.is_empty() {
                &Self::FALLBACK_PALETTE
            } else {
                &self.palette
            }
        }

        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.time.is_finite(),
                "background.time must be a finite number"
            );
            ensure!(
                self.speed.is_finite() && (0.0..=1.0).contains(&self.speed),
                "background.speed must be within [0, 1]"
            );
            ensure!(
                self.scale.is_finite() && (0.1..=4.0).contains(&self.scale),
                "background.scale must be within [0.1, 4]"
            );
            ensure!(
                self.distortion.is_finite() && (0.0..=2.0).contains(&self.distortion),
                "background.distortion must be within [0, 2]"
            );
            ensure!(
                self.grain.is_finite() && (0.0..=1.0).contains(&self.grain),
                "background.grain must be within [0, 1]"
            );
            Ok(())
        }
    }

    impl Default for GenerativeParams {
        fn default() -> Self {
            Self {
                palette: Vec::new(),
                seed: 0,
                time: 0.0,
                speed: 0.5,
                scale: 1.0,
                distortion: 0.0,
                grain: 0.03,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(tag = "type", rename_all = "kebab-case")]
    pub enum Background {
        Solid {
            #[serde(default = "Background::default_color")]
            color: Rgba8,
        },
        Gradient {
            #[serde(default = "Background::default_gradient_start")]
            start: Rgba8,
            #[serde(default = "Background::default_gradient_end")]
            end: Rgba8,
        },
        Pattern {
            #[serde(default)]
            pattern: Option<PatternId>,
            #[serde(default)]
            color: Option<Rgba8>,
        },
        Wallpaper {
            path: PathBuf,
        },
        Generative(GenerativeParams),
    }

    impl Background {
        fn default_color() -> Rgba8 {
            Rgba8::rgb(0xf0, 0xf0, 0xf0)
        }

        fn default_gradient_start() -> Rgba8 {
            Rgba8::rgb(0x66, 0x7e, 0xea)
        }

        fn default_gradient_end() -> Rgba8 {
            Rgba8::rgb(0x76, 0x4b, 0xa2)
        }

        pub fn kind(&self) -> &'static str {
            match self {
                Self::Solid { .. } => "solid",
                Self::Gradient { .. } => "gradient",
                Self::Pattern { .. } => "pattern",
                Self::Wallpaper { .. } => "wallpaper",
                Self::Generative(_) => "generative",
            }
        }

        pub fn wallpaper_path(&self) -> Option<&PathBuf> {
            match self {
                Self::Wallpaper { path } => Some(path),
                _ => None,
            }
        }

        pub fn validate(&self) -> Result<()> {
            match self {
                Self::Solid { .. } | Self::Gradient { .. } => Ok(()),
                Self::Pattern { pattern, color } => {
                    ensure!(
                        PatternId::resolve(*pattern, *color).is_some(),
                        "background.pattern is required unless background.color \
                         matches a pattern preset"
                    );
                    Ok(())
                }
                Self::Wallpaper { path } => {
                    ensure!(
                        !path.as_os_str().is_empty(),
                        "background.path must not be empty"
                    );
                    Ok(())
                }
                Self::Generative(params) => params.validate(),
            }
        }
    }

    impl Default for Background {
        fn default() -> Self {
            Self::Solid {
                color: Self::default_color(),
            }
        }
    }
}

mod presets {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PerspectivePreset {
        pub name: &'static str,
        pub rotate_x: f64,
        pub rotate_y: f64,
        pub rotate_z: f64,
        pub tilt: f64,
    }

    pub const PERSPECTIVE_PRESETS: &[PerspectivePreset] = &[
        PerspectivePreset {
            name: "none",
            rotate_x: 0.0,
            rotate_y: 0.0,
            rotate_z: 0.0,
            tilt: 0.0,
        },
        PerspectivePreset {
            name: "left-lean",
            rotate_x: 10.0,
            rotate_y: -20.0,
            rotate_z: 5.0,
            tilt: -15.0,
        },
        PerspectivePreset {
            name: "right-lean",
            rotate_x: 10.0,
            rotate_y: 20.0,
            rotate_z: -5.0,
            tilt: 15.0,
        },
        PerspectivePreset {
            name: "top-down",
            rotate_x: 25.0,
            rotate_y: 0.0,
            rotate_z: 0.0,
            tilt: 0.0,
        },
        PerspectivePreset {
            name: "stereo",
            rotate_x: 15.0,
            rotate_y: -15.0,
            rotate_z: 0.0,
            tilt: -10.0,
        },
        PerspectivePreset {
            name: "leaning-tower",
            rotate_x: 5.0,
            rotate_y: 5.0,
            rotate_z: 30.0,
            tilt: 0.0,
        },
        PerspectivePreset {
            name: "widescreen-depth",
            rotate_x: 0.0,
            rotate_y: -35.0,
            rotate_z: 0.0,
            tilt: -20.0,
        },
        PerspectivePreset {
            name: "book",
            rotate_x: 0.0,
            rotate_y: 35.0,
            rotate_z: 0.0,
            tilt: 20.0,
        },
        PerspectivePreset {
            name: "geek",
            rotate_x: -20.0,
            rotate_y: -20.0,
            rotate_z: 5.0,
            tilt: 0.0,
        },
        PerspectivePreset {
            name: "bounce",
            rotate_x: 10.0,
            rotate_y: 10.0,
            rotate_z: -15.0,
            tilt: 5.0,
        },
    ];

    fn find<T>(items: &'static [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'static T> {
        let wanted = name.trim();
        items.iter().find(|item| key(item).eq_ignore_ascii_case(wanted))
    }

    pub fn perspective_preset(name: &str) -> Option<&'static PerspectivePreset> {
        find(PERSPECTIVE_PRESETS, name, |p| p.name)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GradientPreset {
        pub name: &'static str,
        pub start: Rgba8,
        pub end: Rgba8,
    }

    impl GradientPreset {
        pub fn background(&self) -> Background {
            Background::Gradient {
                start: self.start,
                end: self.end,
            }
        }
    }

    pub const GRADIENT_PRESETS: &[GradientPreset] = &[
        GradientPreset {
            name: "blue-purple",
            start: Rgba8::rgb(0x66, 0x7e, 0xea),
            end: Rgba8::rgb(0x76, 0x4b, 0xa2),
        },
        GradientPreset {
            name: "pink-orange",
            start: Rgba8::rgb(0xf0, 0x93, 0xfb),
            end: Rgba8::rgb(0xf5, 0x57, 0x6c),
        },
        GradientPreset {
            name: "green-blue",
            start: Rgba8::rgb(0x4f, 0xac, 0xfe),
            end: Rgba8::rgb(0x00, 0xf2, 0xfe),
        },
        GradientPreset {
            name: "purple-pink",
            start: Rgba8::rgb(0xa8, 0xed, 0xea),
            end: Rgba8::rgb(0xfe, 0xd6, 0xe3),
        },
        GradientPreset {
            name: "orange-red",
            start: Rgba8::rgb(0xff, 0x9a, 0x9e),
            end: Rgba8::rgb(0xfe, 0xcf, 0xef),
        },
    ];

    pub fn gradient_preset(name: &str) -> Option<&'static GradientPreset> {
        find(GRADIENT_PRESETS, name, |p| p.name)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SolidColorPreset {
        pub name: &'static str,
        pub color: Rgba8,
    }

    impl SolidColorPreset {
        pub fn background(&self) -> Background {
            Background::Solid { color: self.color }
        }
    }

    pub const SOLID_COLOR_PRESETS: &[SolidColorPreset] = &[
        SolidColorPreset {
            name: "light-gray",
            color: Rgba8::rgb(0xf8, 0xf9, 0xfa),
        },
        SolidColorPreset {
            name: "dark-gray",
            color: Rgba8::rgb(0x34, 0x3a, 0x40),
        },
        SolidColorPreset {
            name: "blue",
            color: Rgba8::rgb(0x00, 0x7b, 0xff),
        },
        SolidColorPreset {
            name: "green",
            color: Rgba8::rgb(0x28, 0xa7, 0x45),
        },
        SolidColorPreset {
            name: "purple",
            color: Rgba8::rgb(0x6f, 0x42, 0xc1),
        },
        SolidColorPreset {
            name: "pink",
            color: Rgba8::rgb(0xe8, 0x3e, 0x8c),
        },
        SolidColorPreset {
            name: "orange",
            color: Rgba8::rgb(0xfd, 0x7e, 0x14),
        },
        SolidColorPreset {
            name: "teal",
            color: Rgba8::rgb(0x20, 0xc9, 0x97),
        },
    ];

    pub fn solid_color_preset(name: &str) -> Option<&'static SolidColorPreset> {
        find(SOLID_COLOR_PRESETS, name, |p| p.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserStyle {
    #[default]
    None,
    Chrome,
    Safari,
}

impl BrowserStyle {
    pub fn has_chrome(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Title bar fill for the simulated window.
    pub fn bar_color(&self) -> Option<Rgba8> {
        match self {
            Self::None => None,
            Self::Chrome => Some(Rgba8::rgb(0xe8, 0xea, 0xed)),
            Self::Safari => Some(Rgba8::rgb(0xf6, 0xf6, 0xf6)),
        }
    }
}

/// One frozen render request. Edits build a new snapshot through the `with_*` helpers
/// instead of mutating one that may be in flight.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SettingsSnapshot {
    pub border_radius: f64,
    pub padding: f64,
    pub scale: f64,
    pub background: Background,
    pub browser_style: BrowserStyle,
    pub shadow: f64,
    pub shadow_color: Rgba8,
    pub rotate_x: f64,
    pub rotate_y: f64,
    pub rotate_z: f64,
    pub tilt: f64,
    /// Only consumed by the host's native 3D preview.
    pub perspective: f64,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            border_radius: 24.0,
            padding: 140.0,
            scale: 1.4,
            background: Background::default(),
            browser_style: BrowserStyle::None,
            shadow: 20.0,
            shadow_color: Rgba8::rgba(0, 0, 0, 0x60),
            rotate_x: 0.0,
            rotate_y: 0.0,
            rotate_z: 0.0,
            tilt: 0.0,
            perspective: 1000.0,
        }
    }
}

impl SettingsSnapshot {
    pub fn has_chrome(&self) -> bool {
        self.browser_style.has_chrome()
    }

    pub fn is_flat(&self) -> bool {
        self.rotate_x == 0.0 && self.rotate_y == 0.0 && self.rotate_z == 0.0 && self.tilt == 0.0
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.border_radius.is_finite() && self.border_radius >= 0.0,
            "border-radius must be a non-negative number"
        );
        ensure!(
            self.padding.is_finite() && self.padding >= 0.0,
            "padding must be a non-negative number"
        );
        ensure!(
            self.scale.is_finite() && self.scale > 0.0,
            "scale must be positive"
        );
        ensure!(
            self.shadow.is_finite() && self.shadow >= 0.0,
            "shadow must be a non-negative number"
        );
        ensure!(
            self.perspective.is_finite() && self.perspective > 0.0,
            "perspective must be positive"
        );
        for (field, value) in [
            ("rotate-x", self.rotate_x),
            ("rotate-y", self.rotate_y),
            ("rotate-z", self.rotate_z),
            ("tilt", self.tilt),
        ] {
            ensure!(value.is_finite(), "{} must be a finite angle", field);
        }
        self.background.validate()
    }

    pub fn with_background(&self, background: Background) -> Self {
        Self {
            background,
            ..self.clone()
        }
    }

    pub fn with_browser_style(&self, browser_style: BrowserStyle) -> Self {
        Self {
            browser_style,
            ..self.clone()
        }
    }

    pub fn with_shadow(&self, shadow: f64) -> Self {
        Self {
            shadow,
            ..self.clone()
        }
    }

    pub fn with_rotation(&self, rotate_x: f64, rotate_y: f64, rotate_z: f64, tilt: f64) -> Self {
        Self {
            rotate_x,
            rotate_y,
            rotate_z,
            tilt,
            ..self.clone()
        }
    }

    pub fn with_perspective_preset(&self, preset: &PerspectivePreset) -> Self {
        self.with_rotation(preset.rotate_x, preset.rotate_y, preset.rotate_z, preset.tilt)
    }
}
