use image::RgbaImage;
use kurbo::Affine;
use settings_model::SettingsSnapshot;
use tracing::debug;

use crate::assets::SourceImage;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::processing::layout::{LayoutResult, compute_layout};
use crate::render::background::{BackgroundAssets, paint_background};
use crate::render::frame::{draw_chrome, draw_image, draw_shadow};
use crate::render::generative::GenerativeBackground;
use crate::render::surface::Surface;
use crate::render::transform::compose_frame_transform;

/// Which layers a render pass bakes into the surface.
///
/// The interactive preview leaves the background and the 3D tilt to the host (which draws
/// them natively); the export flattens everything into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderMode {
    pub paint_background: bool,
    pub apply_transform: bool,
}

impl RenderMode {
    pub const PREVIEW: Self = Self {
        paint_background: false,
        apply_transform: false,
    };
    pub const EXPORT: Self = Self {
        paint_background: true,
        apply_transform: true,
    };
}

/// Everything one render pass reads. Borrowed, never mutated.
#[derive(Clone, Copy)]
pub struct RenderInputs<'a> {
    pub settings: &'a SettingsSnapshot,
    pub source: Option<&'a SourceImage>,
    pub wallpaper: Option<&'a RgbaImage>,
    pub generator: &'a dyn GenerativeBackground,
}

/// Draw one full pass into `surface`, which must already be sized for the layout.
///
/// Fails without touching the surface when the source is missing or the settings are
/// invalid. The surface is cleared before the first layer.
pub fn composite(
    surface: &mut Surface,
    inputs: RenderInputs<'_>,
    mode: RenderMode,
    options: &RenderConfig,
) -> Result<LayoutResult> {
    let source = inputs
        .source
        .ok_or_else(|| Error::Precondition("no decoded source image".into()))?;
    let settings = inputs.settings;
    settings.validate().map_err(Error::InvalidSettings)?;
    let layout = compute_layout(settings, source.width(), source.height());

    surface.clear();
    if mode.paint_background {
        paint_background(
            surface,
            &settings.background,
            &layout,
            BackgroundAssets {
                wallpaper: inputs.wallpaper,
                generator: inputs.generator,
            },
        )?;
    }

    let frame = if mode.apply_transform {
        compose_frame_transform(settings, &layout)
    } else {
        Affine::IDENTITY
    };
    let device = surface.base_transform() * frame;

    draw_shadow(surface, settings, &layout, device, options.shadow_blur_max_sigma)?;
    draw_chrome(surface, settings, &layout, device)?;
    draw_image(surface, settings, &layout, source, device)?;
    debug!(
        width = surface.width(),
        height = surface.height(),
        background = settings.background.kind(),
        ?mode,
        "composited"
    );
    Ok(layout)
}

/// Render into a fresh surface sized for the layout at `pixel_ratio`.
pub fn render(
    inputs: RenderInputs<'_>,
    mode: RenderMode,
    pixel_ratio: f64,
    options: &RenderConfig,
) -> Result<(Surface, LayoutResult)> {
    let source = inputs
        .source
        .ok_or_else(|| Error::Precondition("no decoded source image".into()))?;
    inputs.settings.validate().map_err(Error::InvalidSettings)?;
    let layout = compute_layout(inputs.settings, source.width(), source.height());
    let mut surface = Surface::for_layout(&layout, pixel_ratio)?;
    let layout = composite(&mut surface, inputs, mode, options)?;
    Ok((surface, layout))
}
