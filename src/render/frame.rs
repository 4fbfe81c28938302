//! Layers drawn under the frame transform: drop shadow, browser chrome, screenshot.
//! Each layer builds its own clip so no clip state leaks between steps.

use kurbo::Affine;
use settings_model::{Rgba8, SettingsSnapshot};
use tiny_skia::{FillRule, FilterQuality, Pixmap, PixmapPaint, Rect, Transform};
use tracing::trace;

use crate::assets::SourceImage;
use crate::error::{Error, Result};
use crate::processing::blur::blur_premultiplied;
use crate::processing::layout::LayoutResult;
use crate::processing::resize::device_extent;
use crate::render::background::solid_paint;
use crate::render::shapes::{CornerRadii, circle_path, clip_mask, rounded_rect_path};
use crate::render::surface::{Surface, pixmap_from_rgba};
use crate::render::transform::to_skia;

const DOT_RADIUS: f64 = 6.0;
const DOT_SPACING: f64 = 20.0;
const DOT_INSET: f64 = 20.0;
const DOT_COLORS: [Rgba8; 3] = [
    Rgba8::rgb(0xff, 0x5f, 0x57),
    Rgba8::rgb(0xff, 0xbd, 0x2e),
    Rgba8::rgb(0x28, 0xca, 0x42),
];
const ADDRESS_BAR_HEIGHT: f64 = 24.0;
const ADDRESS_BAR_MAX_WIDTH: f64 = 384.0;
const ADDRESS_BAR_RADIUS: f64 = 6.0;

fn surface_mask_error(surface: &Surface) -> Error {
    Error::SurfaceAlloc {
        width: surface.width(),
        height: surface.height(),
    }
}

/// Blurred silhouette of the whole frame, offset downward by a quarter of the shadow size.
/// `device` maps layout space to device pixels, frame transform included.
pub fn draw_shadow(
    surface: &mut Surface,
    settings: &SettingsSnapshot,
    layout: &LayoutResult,
    device: Affine,
    max_sigma: f32,
) -> Result<()> {
    if settings.shadow <= 0.0 {
        return Ok(());
    }
    let ratio = surface.pixel_ratio();
    let Some(outline) = rounded_rect_path(
        layout.image_x,
        layout.frame_top(),
        layout.scaled_width,
        layout.frame_height(),
        CornerRadii::uniform(settings.border_radius),
    ) else {
        return Ok(());
    };
    let Some(outline) = outline.transform(to_skia(device)) else {
        return Ok(());
    };

    let sigma = ((settings.shadow / 2.0 * ratio) as f32).min(max_sigma);
    let margin = (sigma * 3.0).ceil();
    let offset_y = (settings.shadow / 4.0 * ratio) as f32;
    let bounds = outline.bounds();
    let (sw, sh) = (surface.width() as f32, surface.height() as f32);
    // Only the part of the blurred layer that can land on the surface.
    let x0 = (bounds.left() - margin).max(0.0).floor();
    let x1 = (bounds.right() + margin).min(sw).ceil();
    let y0 = (bounds.top() - margin).max(-offset_y).floor();
    let y1 = (bounds.bottom() + margin).min(sh - offset_y).ceil();
    if x1 <= x0 || y1 <= y0 {
        return Ok(());
    }

    let (lw, lh) = ((x1 - x0) as u32, (y1 - y0) as u32);
    let mut layer = Pixmap::new(lw, lh).ok_or(Error::SurfaceAlloc {
        width: lw,
        height: lh,
    })?;
    layer.fill_path(
        &outline,
        &solid_paint(settings.shadow_color),
        FillRule::Winding,
        Transform::from_translate(-x0, -y0),
        None,
    );
    let blurred = blur_premultiplied(&layer, sigma).ok_or(Error::SurfaceAlloc {
        width: lw,
        height: lh,
    })?;
    trace!(sigma, width = lw, height = lh, "shadow layer blurred");
    surface.pixmap_mut().draw_pixmap(
        0,
        0,
        blurred.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate(x0, y0 + offset_y),
        None,
    );
    Ok(())
}

/// Title bar with traffic-light dots and an address-bar placeholder.
pub fn draw_chrome(
    surface: &mut Surface,
    settings: &SettingsSnapshot,
    layout: &LayoutResult,
    device: Affine,
) -> Result<()> {
    let Some(bar_color) = settings.browser_style.bar_color() else {
        return Ok(());
    };
    let (x, y) = (layout.image_x, layout.frame_top());
    let (w, h) = (layout.scaled_width, layout.chrome_height);
    let Some(band) = rounded_rect_path(x, y, w, h, CornerRadii::top(settings.border_radius)) else {
        return Ok(());
    };
    let ts = to_skia(device);
    let mask = clip_mask(surface.width(), surface.height(), &band, ts)
        .ok_or_else(|| surface_mask_error(surface))?;
    let pixmap = surface.pixmap_mut();
    pixmap.fill_path(&band, &solid_paint(bar_color), FillRule::Winding, ts, None);

    if let Some(divider) = Rect::from_xywh(x as f32, (y + h - 1.0) as f32, w as f32, 1.0) {
        pixmap.fill_rect(divider, &solid_paint(Rgba8::rgba(0, 0, 0, 13)), ts, Some(&mask));
    }

    let cy = y + h / 2.0;
    for (i, color) in DOT_COLORS.into_iter().enumerate() {
        let cx = x + DOT_INSET + DOT_SPACING * i as f64;
        if let Some(dot) = circle_path(cx, cy, DOT_RADIUS) {
            pixmap.fill_path(&dot, &solid_paint(color), FillRule::Winding, ts, Some(&mask));
        }
    }

    let bar_w = (w * 0.5).min(ADDRESS_BAR_MAX_WIDTH);
    if let Some(bar) = rounded_rect_path(
        x + (w - bar_w) / 2.0,
        cy - ADDRESS_BAR_HEIGHT / 2.0,
        bar_w,
        ADDRESS_BAR_HEIGHT,
        CornerRadii::uniform(ADDRESS_BAR_RADIUS),
    ) {
        pixmap.fill_path(
            &bar,
            &solid_paint(Rgba8::WHITE.with_alpha(128)),
            FillRule::Winding,
            ts,
            Some(&mask),
        );
    }
    Ok(())
}

/// The screenshot, clipped to its rounded rect. Top corners stay square under chrome.
pub fn draw_image(
    surface: &mut Surface,
    settings: &SettingsSnapshot,
    layout: &LayoutResult,
    source: &SourceImage,
    device: Affine,
) -> Result<()> {
    let radii = if settings.has_chrome() {
        CornerRadii::bottom(settings.border_radius)
    } else {
        CornerRadii::uniform(settings.border_radius)
    };
    let Some(clip) = rounded_rect_path(
        layout.image_x,
        layout.image_y,
        layout.scaled_width,
        layout.scaled_height,
        radii,
    ) else {
        return Ok(());
    };
    let mask = clip_mask(surface.width(), surface.height(), &clip, to_skia(device))
        .ok_or_else(|| surface_mask_error(surface))?;

    let (w, h) = device_extent(
        layout.scaled_width,
        layout.scaled_height,
        surface.pixel_ratio(),
    );
    let scaled = source.scaled(w, h)?;
    let pixmap = pixmap_from_rgba(&scaled)?;
    let placement = device
        * Affine::translate((layout.image_x, layout.image_y))
        * Affine::scale_non_uniform(
            layout.scaled_width / w as f64,
            layout.scaled_height / h as f64,
        );
    surface.pixmap_mut().draw_pixmap(
        0,
        0,
        pixmap.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        },
        to_skia(placement),
        Some(&mask),
    );
    Ok(())
}
