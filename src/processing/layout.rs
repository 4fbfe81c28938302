use settings_model::SettingsSnapshot;

/// Height of the simulated browser title bar, in layout pixels.
pub const CHROME_HEIGHT: f64 = 60.0;

/// Pixel geometry derived from one snapshot and the source dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
    pub scaled_width: f64,
    pub scaled_height: f64,
    pub chrome_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub image_x: f64,
    pub image_y: f64,
}

impl LayoutResult {
    /// Integer surface size covering the canvas at the given pixel ratio.
    pub fn surface_size(&self, pixel_ratio: f64) -> (u32, u32) {
        let w = (self.canvas_width * pixel_ratio).ceil().max(1.0);
        let h = (self.canvas_height * pixel_ratio).ceil().max(1.0);
        (w as u32, h as u32)
    }

    /// Top edge of the whole frame (chrome band included).
    pub fn frame_top(&self) -> f64 {
        self.image_y - self.chrome_height
    }

    /// Height of the whole frame (chrome band included).
    pub fn frame_height(&self) -> f64 {
        self.scaled_height + self.chrome_height
    }

    /// Pivot used by the transform composer.
    pub fn visual_center(&self) -> (f64, f64) {
        (
            self.image_x + self.scaled_width / 2.0,
            self.image_y + (self.scaled_height + self.chrome_height) / 2.0
                - self.chrome_height / 2.0,
        )
    }
}

/// Scale `scale` must be positive and the dimensions finite; validated snapshots guarantee it.
pub fn compute_layout(
    settings: &SettingsSnapshot,
    image_width: u32,
    image_height: u32,
) -> LayoutResult {
    let chrome_height = if settings.has_chrome() {
        CHROME_HEIGHT
    } else {
        0.0
    };
    let scaled_width = image_width as f64 * settings.scale;
    let scaled_height = image_height as f64 * settings.scale;
    LayoutResult {
        scaled_width,
        scaled_height,
        chrome_height,
        canvas_width: scaled_width + settings.padding * 2.0,
        canvas_height: scaled_height + chrome_height + settings.padding * 2.0,
        image_x: settings.padding,
        image_y: settings.padding + chrome_height,
    }
}

/// Placement of a cover-fitted raster: the scaled size and its top-left offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

pub fn cover_fit(canvas_w: f64, canvas_h: f64, src_w: u32, src_h: u32) -> CoverFit {
    let sw = src_w.max(1) as f64;
    let sh = src_h.max(1) as f64;
    let scale = (canvas_w / sw).max(canvas_h / sh);
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let width = sw * scale;
    let height = sh * scale;
    CoverFit {
        scale,
        width,
        height,
        offset_x: (canvas_w - width) / 2.0,
        offset_y: (canvas_h - height) / 2.0,
    }
}
