use image::{RgbaImage, imageops};
use tiny_skia::{IntSize, Pixmap};

/// Gaussian blur of a premultiplied pixmap. Channels are filtered independently, which
/// is exact for premultiplied data; the result is re-clamped so color never exceeds alpha.
pub fn blur_premultiplied(pixmap: &Pixmap, sigma: f32) -> Option<Pixmap> {
    if sigma <= 0.0 {
        return Some(pixmap.clone());
    }
    let raw = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())?;
    let mut blurred = imageops::blur(&raw, sigma);
    for px in blurred.pixels_mut() {
        let a = px.0[3];
        for channel in &mut px.0[..3] {
            *channel = (*channel).min(a);
        }
    }
    let size = IntSize::from_wh(pixmap.width(), pixmap.height())?;
    Pixmap::from_vec(blurred.into_raw(), size)
}
