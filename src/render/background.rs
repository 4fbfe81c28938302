use image::RgbaImage;
use kurbo::Affine;
use settings_model::{Background, GenerativeParams, PatternId, Rgba8};
use tiny_skia::{
    Color, FilterQuality, GradientStop, LinearGradient, Mask, Paint, PathBuilder, Pattern, Pixmap,
    PixmapPaint, Point, Rect, Shader, SpreadMode, Transform,
};
use tracing::trace;

use crate::error::{Error, Result};
use crate::processing::layout::{LayoutResult, cover_fit};
use crate::processing::resize::{device_extent, resize_rgba};
use crate::render::generative::GenerativeBackground;
use crate::render::shapes::{CornerRadii, circle_path, clip_mask, rounded_rect_path};
use crate::render::surface::{Surface, pixmap_from_rgba};
use crate::render::transform::to_skia;

/// Corner radius of the exported canvas.
pub const OUTER_RADIUS: f64 = 48.0;

/// Pattern tile edge, in layout pixels.
const TILE: f64 = 40.0;

/// External inputs some background variants need.
#[derive(Clone, Copy)]
pub struct BackgroundAssets<'a> {
    pub wallpaper: Option<&'a RgbaImage>,
    pub generator: &'a dyn GenerativeBackground,
}

pub fn skia_color(c: Rgba8) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub fn solid_paint<'a>(c: Rgba8) -> Paint<'a> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(c));
    paint.anti_alias = true;
    paint
}

/// Paint the active variant over the whole canvas, clipped to the outer rounded rect.
pub fn paint_background(
    surface: &mut Surface,
    background: &Background,
    layout: &LayoutResult,
    assets: BackgroundAssets<'_>,
) -> Result<()> {
    let base = to_skia(surface.base_transform());
    let clip = rounded_rect_path(
        0.0,
        0.0,
        layout.canvas_width,
        layout.canvas_height,
        CornerRadii::uniform(OUTER_RADIUS),
    )
    .ok_or_else(|| Error::Precondition("canvas has no area".into()))?;
    let mask = clip_mask(surface.width(), surface.height(), &clip, base)
        .ok_or_else(|| Error::SurfaceAlloc {
            width: surface.width(),
            height: surface.height(),
        })?;
    fill_variant(surface, background, layout, assets, Some(&mask))
}

/// Fill the canvas with one variant. `mask` restricts coverage; `None` paints edge to edge.
pub fn fill_variant(
    surface: &mut Surface,
    background: &Background,
    layout: &LayoutResult,
    assets: BackgroundAssets<'_>,
    mask: Option<&Mask>,
) -> Result<()> {
    let ratio = surface.pixel_ratio();
    let base = to_skia(surface.base_transform());
    let canvas = Rect::from_xywh(
        0.0,
        0.0,
        layout.canvas_width as f32,
        layout.canvas_height as f32,
    )
    .ok_or_else(|| Error::Precondition("canvas has no area".into()))?;
    trace!(kind = background.kind(), "painting background");

    match background {
        Background::Solid { color } => {
            surface
                .pixmap_mut()
                .fill_rect(canvas, &solid_paint(*color), base, mask);
        }
        Background::Gradient { start, end } => {
            let mut paint = solid_paint(*start);
            if let Some(shader) = linear_gradient(layout, *start, *end) {
                paint.shader = shader;
            }
            surface.pixmap_mut().fill_rect(canvas, &paint, base, mask);
        }
        Background::Pattern { pattern, color } => {
            let (id, base_color) = PatternId::resolve(*pattern, *color).ok_or_else(|| {
                Error::Precondition("pattern background has no resolvable pattern".into())
            })?;
            let (tile, local) = pattern_tile(id, base_color, ratio)?;
            let mut paint = solid_paint(base_color);
            paint.shader = Pattern::new(
                tile.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Bilinear,
                1.0,
                local,
            );
            surface.pixmap_mut().fill_rect(canvas, &paint, base, mask);
        }
        Background::Wallpaper { path } => {
            let wallpaper = assets.wallpaper.ok_or_else(|| {
                Error::asset(
                    format!("wallpaper {}", path.display()),
                    anyhow::anyhow!("wallpaper raster was not provided"),
                )
            })?;
            draw_cover(surface, wallpaper, layout, mask)?;
        }
        Background::Generative(params) => {
            draw_generative(surface, assets.generator, params, mask)?;
        }
    }
    Ok(())
}

/// Diagonal gradient from the canvas's top-left to bottom-right corner.
fn linear_gradient(layout: &LayoutResult, start: Rgba8, end: Rgba8) -> Option<Shader<'static>> {
    LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(layout.canvas_width as f32, layout.canvas_height as f32),
        vec![
            GradientStop::new(0.0, skia_color(start)),
            GradientStop::new(1.0, skia_color(end)),
        ],
        SpreadMode::Pad,
        Transform::identity(),
    )
}

fn draw_cover(
    surface: &mut Surface,
    wallpaper: &RgbaImage,
    layout: &LayoutResult,
    mask: Option<&Mask>,
) -> Result<()> {
    let ratio = surface.pixel_ratio();
    let fit = cover_fit(
        layout.canvas_width,
        layout.canvas_height,
        wallpaper.width(),
        wallpaper.height(),
    );
    let (w, h) = device_extent(fit.width, fit.height, ratio);
    let resized = resize_rgba(wallpaper, w, h).map_err(|err| Error::asset("wallpaper", err))?;
    let pixmap = pixmap_from_rgba(&resized)?;
    let placement = surface.base_transform()
        * Affine::translate((fit.offset_x, fit.offset_y))
        * Affine::scale_non_uniform(fit.width / w as f64, fit.height / h as f64);
    surface.pixmap_mut().draw_pixmap(
        0,
        0,
        pixmap.as_ref(),
        &PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        },
        to_skia(placement),
        mask,
    );
    Ok(())
}

fn draw_generative(
    surface: &mut Surface,
    generator: &dyn GenerativeBackground,
    params: &GenerativeParams,
    mask: Option<&Mask>,
) -> Result<()> {
    let texture = generator.render(surface.width(), surface.height(), params);
    trace!(generator = generator.name(), "generative texture rendered");
    let pixmap = pixmap_from_rgba(&texture)?;
    surface.pixmap_mut().draw_pixmap(
        0,
        0,
        pixmap.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        mask,
    );
    Ok(())
}

/// Render one repeat tile at device resolution, plus the shader-local transform that maps
/// it back onto a `TILE`-sized cell in layout space.
pub fn pattern_tile(id: PatternId, base: Rgba8, pixel_ratio: f64) -> Result<(Pixmap, Transform)> {
    let side = (TILE * pixel_ratio).round().max(1.0) as u32;
    let k = side as f64 / TILE;
    let mut tile = Pixmap::new(side, side).ok_or(Error::SurfaceAlloc {
        width: side,
        height: side,
    })?;
    tile.fill(skia_color(base));
    let motif = solid_paint(base.darken(0.15));
    let ts = Transform::from_scale(k as f32, k as f32);

    match id {
        PatternId::Dots => {
            if let Some(dot) = circle_path(TILE / 2.0, TILE / 2.0, 6.0) {
                tile.fill_path(&dot, &motif, tiny_skia::FillRule::Winding, ts, None);
            }
        }
        PatternId::Grid => {
            for rect in [
                Rect::from_xywh(0.0, 0.0, TILE as f32, 1.5),
                Rect::from_xywh(0.0, 0.0, 1.5, TILE as f32),
            ]
            .into_iter()
            .flatten()
            {
                tile.fill_rect(rect, &motif, ts, None);
            }
        }
        PatternId::Stripes => {
            if let Some(band) = Rect::from_xywh(0.0, 0.0, (TILE / 2.0) as f32, TILE as f32) {
                tile.fill_rect(band, &motif, ts, None);
            }
        }
        PatternId::Hearts => {
            if let Some(heart) = heart_path(TILE / 2.0, TILE / 2.0, 14.0) {
                tile.fill_path(&heart, &motif, tiny_skia::FillRule::Winding, ts, None);
            }
        }
    }

    let mut local = Affine::scale(1.0 / k);
    if id == PatternId::Stripes {
        local = Affine::rotate(std::f64::consts::FRAC_PI_4) * local;
    }
    Ok((tile, to_skia(local)))
}

fn heart_path(cx: f64, cy: f64, size: f64) -> Option<tiny_skia::Path> {
    let s = (size / 2.0) as f32;
    let (cx, cy) = (cx as f32, cy as f32);
    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy + s);
    pb.cubic_to(cx - 1.6 * s, cy, cx - s, cy - 1.1 * s, cx, cy - 0.4 * s);
    pb.cubic_to(cx + s, cy - 1.1 * s, cx + 1.6 * s, cy, cx, cy + s);
    pb.close();
    pb.finish()
}
