use kurbo::{PathEl, Rect, RoundedRect, RoundedRectRadii, Shape};
use tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

/// Per-corner radii, clockwise from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CornerRadii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl CornerRadii {
    pub const fn uniform(r: f64) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: r,
            bottom_left: r,
        }
    }

    pub const fn top(r: f64) -> Self {
        Self {
            top_left: r,
            top_right: r,
            bottom_right: 0.0,
            bottom_left: 0.0,
        }
    }

    pub const fn bottom(r: f64) -> Self {
        Self {
            top_left: 0.0,
            top_right: 0.0,
            bottom_right: r,
            bottom_left: r,
        }
    }

    /// Clamp every radius to half the shorter side.
    fn clamped(self, width: f64, height: f64) -> Self {
        let limit = (width.min(height) / 2.0).max(0.0);
        let c = |r: f64| r.clamp(0.0, limit);
        Self {
            top_left: c(self.top_left),
            top_right: c(self.top_right),
            bottom_right: c(self.bottom_right),
            bottom_left: c(self.bottom_left),
        }
    }
}

/// Rounded rectangle outline in layout coordinates. `None` for empty or non-finite boxes.
pub fn rounded_rect_path(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radii: CornerRadii,
) -> Option<Path> {
    if !(width > 0.0 && height > 0.0) || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let r = radii.clamped(width, height);
    let rect = RoundedRect::from_rect(
        Rect::new(x, y, x + width, y + height),
        RoundedRectRadii::new(r.top_left, r.top_right, r.bottom_right, r.bottom_left),
    );
    path_from_kurbo(rect.path_elements(0.1))
}

pub fn circle_path(cx: f64, cy: f64, radius: f64) -> Option<Path> {
    PathBuilder::from_circle(cx as f32, cy as f32, radius as f32)
}

pub fn path_from_kurbo(elements: impl IntoIterator<Item = PathEl>) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in elements {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Anti-aliased coverage mask for `path` drawn through `transform`.
pub fn clip_mask(width: u32, height: u32, path: &Path, transform: Transform) -> Option<Mask> {
    let mut mask = Mask::new(width, height)?;
    mask.fill_path(path, FillRule::Winding, true, transform);
    Some(mask)
}
