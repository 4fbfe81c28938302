//! Flattened approximation of the frame's 3D tilt.
//!
//! The interactive preview lets the host apply a real `perspective()`/`rotateX()`/... CSS
//! transform. An exported raster has no such luxury, so rotation about the X and Y axes is
//! approximated with shear, tilt adds a horizontal skew, and rotation about Z stays a true
//! rotation. The whole matrix pivots around the frame's visual center.

use kurbo::Affine;
use settings_model::SettingsSnapshot;

use crate::processing::layout::LayoutResult;

/// Shear coefficients `(shear_x, shear_y)` for the given angles (degrees).
pub fn shear_for(rotate_x: f64, rotate_y: f64, tilt: f64) -> (f64, f64) {
    let shear_x = (-rotate_y / 2.0).to_radians().tan() + tilt.to_radians().tan();
    let shear_y = (rotate_x / 2.0).to_radians().tan();
    (shear_x, shear_y)
}

/// Compose translate-to-center, shear, rotate-Z, translate-back, in canvas order
/// (the last factor touches points first).
pub fn compose_frame_transform(settings: &SettingsSnapshot, layout: &LayoutResult) -> Affine {
    let (cx, cy) = layout.visual_center();
    let (shear_x, shear_y) = shear_for(settings.rotate_x, settings.rotate_y, settings.tilt);
    Affine::translate((cx, cy))
        * Affine::skew(shear_x, shear_y)
        * Affine::rotate(settings.rotate_z.to_radians())
        * Affine::translate((-cx, -cy))
}

pub fn to_skia(affine: Affine) -> tiny_skia::Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    tiny_skia::Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// CSS transform the host applies for the native 3D preview.
pub fn host_css_transform(settings: &SettingsSnapshot) -> String {
    format!(
        "perspective({}px) rotateX({}deg) rotateY({}deg) rotateZ({}deg) skew({}deg, 0deg)",
        settings.perspective, settings.rotate_x, settings.rotate_y, settings.rotate_z, settings.tilt
    )
}
