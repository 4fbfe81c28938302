use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use kurbo::Affine;
use tiny_skia::{ColorU8, IntSize, Pixmap};

use crate::error::{Error, Result};
use crate::processing::layout::LayoutResult;

/// Raster target the compositor draws into. Pixels are premultiplied RGBA; geometry is
/// expressed in layout pixels and mapped to device pixels through `pixel_ratio`.
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
    pixel_ratio: f64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("pixel_ratio", &self.pixel_ratio)
            .finish()
    }
}

impl Surface {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(Error::SurfaceAlloc { width, height })?;
        Ok(Self {
            pixmap,
            pixel_ratio,
        })
    }

    /// Surface sized to the layout's canvas at `pixel_ratio`.
    pub fn for_layout(layout: &LayoutResult, pixel_ratio: f64) -> Result<Self> {
        let (w, h) = layout.surface_size(pixel_ratio);
        Self::new(w, h, pixel_ratio)
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Layout-to-device mapping.
    pub fn base_transform(&self) -> Affine {
        Affine::scale(self.pixel_ratio)
    }

    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Straight-alpha RGBA at device pixel `(x, y)`.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Read the pixels back as a straight-alpha raster.
    pub fn read_back(&self) -> Result<RgbaImage> {
        let mut data = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(self.width(), self.height(), data).ok_or_else(|| {
            Error::Readback(format!(
                "pixel buffer does not match {}x{}",
                self.width(),
                self.height()
            ))
        })
    }
}

/// Premultiply a straight-alpha raster into a pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(Error::SurfaceAlloc { width, height })?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let p = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[p.red(), p.green(), p.blue(), p.alpha()]);
    }
    Pixmap::from_vec(data, size).ok_or(Error::SurfaceAlloc { width, height })
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|err| Error::Readback(format!("png encoding failed: {err}")))?;
    Ok(out.into_inner())
}
