//! Mask-aware bilinear resampling.
//!
//! Grids are resized with a separable triangle-filter convolution: each
//! output sample is centred at `(i + 0.5) * scale` in source coordinates and
//! the filter widens with the downscale factor, so shrinking a grid averages
//! every source cell it covers instead of point-sampling. The horizontal pass
//! runs first, then the vertical pass.
//!
//! Invalid (NaN) cells cannot go through the convolution directly. The data
//! is resized with NaN replaced by zero, a 1/0 validity mask is resized with
//! the same kernel, and output cells whose resized mask falls below 0.5 are
//! marked invalid.

use overlay_common::Grid;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

/// Filter support of the triangle kernel at scale 1.
const BILINEAR_SUPPORT: f64 = 1.0;

/// Mask threshold below which an output cell is invalid.
pub const VALID_THRESHOLD: f32 = 0.5;

fn triangle(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        1.0 - x
    } else {
        0.0
    }
}

/// Normalized kernel weights for one output position.
#[derive(Debug, Clone)]
struct Tap {
    start: usize,
    weights: Vec<f64>,
}

/// Weights mapping `in_size` samples onto `out_size` samples.
fn precompute_taps(in_size: usize, out_size: usize) -> Vec<Tap> {
    let scale = in_size as f64 / out_size as f64;
    let filterscale = scale.max(1.0);
    let support = BILINEAR_SUPPORT * filterscale;

    (0..out_size)
        .map(|i| {
            let center = (i as f64 + 0.5) * scale;
            // Truncation toward zero, then clamp
            let xmin = ((center - support + 0.5) as i64).max(0) as usize;
            let xmax = ((center + support + 0.5) as i64).min(in_size as i64).max(0) as usize;
            let count = xmax.saturating_sub(xmin);

            let mut weights: Vec<f64> = (0..count)
                .map(|x| triangle((x as f64 + xmin as f64 - center + 0.5) / filterscale))
                .collect();
            let total: f64 = weights.iter().sum();
            if total != 0.0 {
                for w in &mut weights {
                    *w /= total;
                }
            }

            Tap {
                start: xmin,
                weights,
            }
        })
        .collect()
}

fn convolve(src: &[f32], stride: usize, tap: &Tap) -> f32 {
    tap.weights
        .iter()
        .enumerate()
        .map(|(k, w)| src[(tap.start + k) * stride] as f64 * w)
        .sum::<f64>() as f32
}

fn resample_horizontal(data: &[f32], width: usize, height: usize, out_width: usize) -> Vec<f32> {
    if width == out_width {
        return data.to_vec();
    }
    let taps = precompute_taps(width, out_width);
    let mut out = vec![0.0f32; out_width * height];
    out.par_chunks_mut(out_width)
        .zip(data.par_chunks(width))
        .for_each(|(dst, row)| {
            for (x, tap) in taps.iter().enumerate() {
                dst[x] = convolve(row, 1, tap);
            }
        });
    out
}

fn resample_vertical(data: &[f32], width: usize, height: usize, out_height: usize) -> Vec<f32> {
    if height == out_height {
        return data.to_vec();
    }
    let taps = precompute_taps(height, out_height);
    let mut out = vec![0.0f32; width * out_height];
    out.par_chunks_mut(width)
        .zip(taps.par_iter())
        .for_each(|(dst, tap)| {
            for (x, value) in dst.iter_mut().enumerate() {
                *value = convolve(&data[x..], width, tap);
            }
        });
    out
}

/// Bilinear resize of a plain surface.
pub fn resample_plane(
    data: &[f32],
    width: usize,
    height: usize,
    out_width: usize,
    out_height: usize,
) -> RenderResult<Vec<f32>> {
    if width == 0 || height == 0 || out_width == 0 || out_height == 0 {
        return Err(RenderError::EmptyGrid {
            src_width: width,
            src_height: height,
            dst_width: out_width,
            dst_height: out_height,
        });
    }
    if data.len() != width * height {
        return Err(RenderError::BufferSize {
            width,
            height,
            expected: width * height,
            actual: data.len(),
        });
    }

    let horizontal = resample_horizontal(data, width, height, out_width);
    Ok(resample_vertical(&horizontal, out_width, height, out_height))
}

/// Resize a grid to `out_width` x `out_height`, keeping invalid regions
/// invalid without bleeding zeros into valid neighbours.
pub fn resample_masked(grid: &Grid, out_width: usize, out_height: usize) -> RenderResult<Grid> {
    let filled: Vec<f32> = grid
        .data
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let mask = grid.validity_mask();

    let (data, mask) = rayon::join(
        || resample_plane(&filled, grid.width, grid.height, out_width, out_height),
        || resample_plane(&mask, grid.width, grid.height, out_width, out_height),
    );
    let (data, mask) = (data?, mask?);

    let combined: Vec<f32> = data
        .into_iter()
        .zip(mask)
        .map(|(v, m)| if m < VALID_THRESHOLD { f32::NAN } else { v })
        .collect();

    debug!(
        src_width = grid.width,
        src_height = grid.height,
        out_width,
        out_height,
        "Resampled grid"
    );

    Ok(Grid {
        data: combined,
        width: out_width,
        height: out_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taps_identity() {
        let taps = precompute_taps(4, 4);
        for (i, tap) in taps.iter().enumerate() {
            let pos = tap.weights.iter().position(|w| *w == 1.0).unwrap();
            assert_eq!(tap.start + pos, i);
        }
    }

    #[test]
    fn test_taps_are_normalized() {
        for (src, dst) in [(7200, 4096), (3600, 2048), (3, 8), (10, 3)] {
            for tap in precompute_taps(src, dst) {
                let sum: f64 = tap.weights.iter().sum();
                assert!((sum - 1.0).abs() < 1e-9, "{}->{}: {}", src, dst, sum);
                assert!(tap.start + tap.weights.len() <= src);
            }
        }
    }

    #[test]
    fn test_halving_widens_filter() {
        // Downscale by 2: support widens to 2 source cells each side of centre
        let out = resample_plane(&[0.0, 2.0, 4.0, 6.0], 4, 1, 2, 1).unwrap();
        assert!((out[0] - 2.5 / 1.75).abs() < 1e-6, "{:?}", out);
        assert!((out[1] - 8.0 / 1.75).abs() < 1e-6, "{:?}", out);
    }

    #[test]
    fn test_upscale_interpolates() {
        let out = resample_plane(&[0.0, 4.0], 2, 1, 4, 1).unwrap();
        assert_eq!(out, vec![0.0, 1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(resample_plane(&[], 0, 0, 4, 4).is_err());
        assert!(resample_plane(&[1.0], 1, 1, 0, 4).is_err());
    }
}
