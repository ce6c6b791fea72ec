//! Normalization and the viridis color ramp.

use overlay_common::Grid;
use rayon::prelude::*;
use tracing::warn;

/// Viridis ramp, 10 stops as 8-bit RGB.
pub const VIRIDIS: [[u8; 3]; 10] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [110, 206, 88],
    [181, 222, 43],
    [253, 231, 37],
];

/// Percentiles used when the caller gives no explicit bounds.
pub const LOW_PERCENTILE: f64 = 2.0;
pub const HIGH_PERCENTILE: f64 = 98.0;

/// Smallest range used as a divisor when normalizing.
const MIN_RANGE: f64 = 1e-12;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }
}

/// Map a normalized value to the ramp.
///
/// NaN maps like 0. Channels are truncated, not rounded, to 8 bits.
pub fn viridis(x: f32) -> Color {
    let last = VIRIDIS.len() - 1;
    let x = if x.is_nan() { 0.0 } else { x };
    let idx = x * last as f32;
    let i0 = (idx.floor().max(0.0) as usize).min(last);
    let i1 = (i0 + 1).min(last);
    let t = (idx - i0 as f32).clamp(0.0, 1.0);

    let channel = |c: usize| {
        let a = VIRIDIS[i0][c] as f32 / 255.0;
        let b = VIRIDIS[i1][c] as f32 / 255.0;
        let v = (a * (1.0 - t) + b * t).clamp(0.0, 1.0);
        (v * 255.0) as u8
    };

    Color::new(channel(0), channel(1), channel(2), 255)
}

/// Finite values of `data`, sorted ascending.
pub fn sorted_finite(data: &[f32]) -> Vec<f32> {
    let mut finite: Vec<f32> = data.par_iter().copied().filter(|v| v.is_finite()).collect();
    finite.par_sort_unstable_by(|a, b| a.total_cmp(b));
    finite
}

/// Linearly interpolated percentile of an already sorted slice.
pub fn percentile_sorted(sorted: &[f32], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let a = sorted[lo] as f64;
    let b = sorted[hi] as f64;
    Some(a + (b - a) * (rank - lo as f64))
}

/// Linearly interpolated percentile of the finite values in `data`.
///
/// Returns `None` when there are no finite values.
pub fn percentile(data: &[f32], p: f64) -> Option<f64> {
    percentile_sorted(&sorted_finite(data), p)
}

/// Resolve normalization bounds, filling in whichever side the caller left
/// open from the 2nd/98th percentiles. The grid is sorted at most once.
pub fn normalization_bounds(data: &[f32], min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    let sorted = if min.is_none() || max.is_none() {
        sorted_finite(data)
    } else {
        Vec::new()
    };
    let min = min.unwrap_or_else(|| {
        percentile_sorted(&sorted, LOW_PERCENTILE).unwrap_or_else(|| {
            warn!("No finite values for lower bound, using 0");
            0.0
        })
    });
    let max = max.unwrap_or_else(|| {
        percentile_sorted(&sorted, HIGH_PERCENTILE).unwrap_or_else(|| {
            warn!("No finite values for upper bound, using 1");
            1.0
        })
    });
    (min, max)
}

/// Scale `value` into [0, 1]. NaN stays NaN.
pub fn normalize(value: f32, min: f64, max: f64) -> f32 {
    let range = (max - min).max(MIN_RANGE);
    (((value as f64 - min) / range) as f32).clamp(0.0, 1.0)
}

/// Colorize normalized values. Pixels where `valid` is false get alpha 0.
pub fn colorize(normalized: &[f32], valid: &[bool]) -> Vec<u8> {
    let mut pixels = vec![0u8; normalized.len() * 4];
    pixels
        .par_chunks_mut(4)
        .zip(normalized.par_iter().zip(valid.par_iter()))
        .for_each(|(px, (x, ok))| {
            let color = viridis(*x);
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = if *ok { 255 } else { 0 };
        });
    pixels
}

/// Normalize and colorize a physical grid; invalid cells are transparent.
pub fn render_rgba(grid: &Grid, min: f64, max: f64) -> Vec<u8> {
    let normalized: Vec<f32> = grid.data.par_iter().map(|v| normalize(*v, min, max)).collect();
    let valid: Vec<bool> = grid.data.par_iter().map(|v| v.is_finite()).collect();
    colorize(&normalized, &valid)
}
