use anyhow::{Context, Result, bail};
use fast_image_resize as fir;
use image::RgbaImage;

/// High-quality resample to exactly `width` x `height`. Alpha is premultiplied for the
/// convolution so transparent edges do not bleed dark fringes.
pub fn resize_rgba(source: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        bail!("resize target {width}x{height} is empty");
    }
    if source.dimensions() == (width, height) {
        return Ok(source.clone());
    }
    let src = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("source raster does not match its declared size")?;
    let mut dst = fir::images::Image::new(width, height, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom))
        .use_alpha(true);
    fir::Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .with_context(|| {
            format!(
                "resize {}x{} -> {width}x{height} failed",
                source.width(),
                source.height()
            )
        })?;
    RgbaImage::from_raw(width, height, dst.into_vec())
        .context("resized buffer has unexpected length")
}

/// Device-pixel size for a layout box, never below one pixel.
pub fn device_extent(width: f64, height: f64, pixel_ratio: f64) -> (u32, u32) {
    let w = (width * pixel_ratio).round().max(1.0);
    let h = (height * pixel_ratio).round().max(1.0);
    (w as u32, h as u32)
}
