//! Procedural backgrounds. Output depends only on the parameters and the requested size,
//! so the same snapshot always renders to identical pixels.

use std::f32::consts::TAU;

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use settings_model::{GenerativeParams, Rgba8};

use crate::processing::noise::{ValueNoise, lattice, lerp};

/// Strategy that paints a full-canvas texture for the generative background variant.
pub trait GenerativeBackground: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render `width` x `height` straight-alpha pixels.
    fn render(&self, width: u32, height: u32, params: &GenerativeParams) -> RgbaImage;
}

/// Six soft color blobs drifting over white, with optional warp and film grain.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshGradient;

/// Blob placement ranges in canvas fractions: (top, top spread, left, left spread,
/// diameter, opacity).
const BLOBS: [(f32, f32, f32, f32, f32, f32); 6] = [
    (0.10, 0.20, 0.10, 0.20, 0.80, 0.6),
    (0.40, 0.20, 0.50, 0.20, 0.75, 0.4),
    (0.10, 0.30, 0.60, 0.30, 0.70, 0.3),
    (0.60, 0.30, 0.10, 0.30, 0.65, 0.3),
    (0.70, 0.20, 0.70, 0.20, 0.60, 0.2),
    (0.30, 0.40, 0.30, 0.40, 0.90, 0.2),
];

const LAYER_OPACITY: f32 = 0.7;
const DRIFT: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
struct Blob {
    cx: f32,
    cy: f32,
    radius: f32,
    opacity: f32,
    color: [f32; 3],
}

impl MeshGradient {
    fn blobs(params: &GenerativeParams) -> Vec<Blob> {
        let palette = params.effective_palette();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let phase = params.time * params.speed;
        BLOBS
            .iter()
            .enumerate()
            .map(|(i, &(top, top_spread, left, left_spread, diameter, opacity))| {
                let jitter_y: f32 = rng.random();
                let jitter_x: f32 = rng.random();
                let angle = (phase + i as f32 / BLOBS.len() as f32) * TAU;
                // the last blob echoes the primary color
                let color = if i + 1 == BLOBS.len() {
                    palette[0]
                } else {
                    palette[i % palette.len()]
                };
                Blob {
                    cx: left + left_spread * jitter_x + DRIFT * angle.sin() + diameter / 2.0,
                    cy: top + top_spread * jitter_y + DRIFT * angle.cos() + diameter / 2.0,
                    radius: diameter / 2.0 * params.scale,
                    opacity,
                    color: linear(palette_color(color)),
                }
            })
            .collect()
    }
}

impl GenerativeBackground for MeshGradient {
    fn name(&self) -> &'static str {
        "mesh"
    }

    fn render(&self, width: u32, height: u32, params: &GenerativeParams) -> RgbaImage {
        let blobs = Self::blobs(params);
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let warp = ValueNoise::new(0.25 * w.min(h), params.seed ^ 0x5eed);
        let grain_seed = params.seed.rotate_left(17);
        RgbaImage::from_fn(width, height, |x, y| {
            let mut u = (x as f32 + 0.5) / w;
            let mut v = (y as f32 + 0.5) / h;
            if params.distortion > 0.0 {
                let (px, py) = (x as f32, y as f32);
                u += params.distortion * 0.1 * (warp.sample(px, py) - 0.5);
                v += params.distortion * 0.1 * (warp.sample(px + 977.0, py + 631.0) - 0.5);
            }
            let mut rgb = [1.0f32; 3];
            for blob in &blobs {
                let (du, dv) = ((u - blob.cx) / blob.radius, (v - blob.cy) / blob.radius);
                let d2 = du * du + dv * dv;
                let weight = blob.opacity * LAYER_OPACITY * (-d2 * 2.0).exp();
                for (c, target) in rgb.iter_mut().zip(blob.color) {
                    *c = lerp(*c, target, weight);
                }
            }
            let mut out = rgb.map(|c| encode(c) * 255.0);
            if params.grain > 0.0 {
                let n = lattice(x as i32, y as i32, grain_seed) - 0.5;
                for c in &mut out {
                    *c += n * params.grain * 255.0;
                }
            }
            let [r, g, b] = out.map(|c| c.round().clamp(0.0, 255.0) as u8);
            Rgba([r, g, b, 255])
        })
    }
}

fn palette_color(c: Rgba8) -> [f32; 3] {
    [c.r, c.g, c.b].map(|v| v as f32 / 255.0)
}

fn linear(srgb: [f32; 3]) -> [f32; 3] {
    srgb.map(|c| c.powf(2.2))
}

fn encode(c: f32) -> f32 {
    c.clamp(0.0, 1.0).powf(1.0 / 2.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> GenerativeParams {
        GenerativeParams {
            seed,
            ..GenerativeParams::default()
        }
    }

    #[test]
    fn same_parameters_render_identically() {
        let a = MeshGradient.render(48, 32, &params(7));
        let b = MeshGradient.render(48, 32, &params(7));
        assert_eq!(a, b);
        assert!(a.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn seed_and_time_move_the_blobs() {
        let a = MeshGradient.render(48, 32, &params(7));
        let b = MeshGradient.render(48, 32, &params(8));
        assert_ne!(a, b);
        let later = GenerativeParams {
            time: 0.5,
            ..params(7)
        };
        assert_ne!(a, MeshGradient.render(48, 32, &later));
    }

    #[test]
    fn palette_tints_the_canvas() {
        let red = GenerativeParams {
            palette: vec![Rgba8::rgb(255, 0, 0)],
            grain: 0.0,
            ..params(1)
        };
        let image = MeshGradient.render(64, 64, &red);
        let mean_green: f32 =
            image.pixels().map(|p| p.0[1] as f32).sum::<f32>() / (64.0 * 64.0);
        assert!(image.pixels().all(|p| p.0[0] >= p.0[1]));
        assert!(mean_green < 250.0);
    }
}
