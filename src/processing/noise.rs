//! Deterministic value noise used by the generative background (warp and grain).

/// Bilinearly interpolated lattice noise with smoothstep easing. `cell` is the lattice
/// spacing in the caller's coordinate units.
#[derive(Debug, Clone, Copy)]
pub struct ValueNoise {
    cell: f32,
    seed: u64,
}

impl ValueNoise {
    pub fn new(cell: f32, seed: u64) -> Self {
        Self {
            cell: cell.max(f32::EPSILON),
            seed,
        }
    }

    /// Sample in `[0, 1]`.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let fx = x / self.cell;
        let fy = y / self.cell;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = smoothstep(fx - x0);
        let ty = smoothstep(fy - y0);
        let (ix, iy) = (x0 as i32, y0 as i32);
        let top = lerp(
            lattice(ix, iy, self.seed),
            lattice(ix + 1, iy, self.seed),
            tx,
        );
        let bottom = lerp(
            lattice(ix, iy + 1, self.seed),
            lattice(ix + 1, iy + 1, self.seed),
            tx,
        );
        lerp(top, bottom, ty)
    }
}

/// Per-lattice-point hash in `[0, 1]`.
pub fn lattice(x: i32, y: i32, seed: u64) -> f32 {
    let mut v = (x as u32 as u64) | ((y as u32 as u64) << 32);
    v ^= seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    v = (v ^ (v >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    v = (v ^ (v >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    v ^= v >> 31;
    (v >> 40) as f32 / (1u64 << 24) as f32
}

pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
