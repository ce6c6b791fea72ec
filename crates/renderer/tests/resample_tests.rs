//! Tests for mask-aware resampling.

use overlay_common::Grid;
use renderer::resample::{resample_masked, resample_plane};
use test_utils::{
    assert_approx_eq, create_constant_grid, create_grid_with_nans, create_half_masked_grid,
    create_ramp_grid, create_test_grid,
};

// ============================================================================
// Plain surfaces
// ============================================================================

#[test]
fn test_same_size_is_identity() {
    let data = create_test_grid(6, 4);
    let out = resample_plane(&data, 6, 4, 6, 4).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_constant_stays_constant() {
    let data = create_constant_grid(30, 20, 0.42);
    for (w, h) in [(7, 5), (64, 32), (30, 3)] {
        let out = resample_plane(&data, 30, 20, w, h).unwrap();
        assert_eq!(out.len(), w * h);
        for v in out {
            assert_approx_eq!(v, 0.42, 1e-5);
        }
    }
}

#[test]
fn test_ramp_upscale_stays_in_range() {
    let data = create_ramp_grid(10, 5, 0.0, 1.0);
    let out = resample_plane(&data, 10, 5, 40, 20).unwrap();
    assert!(out.iter().all(|v| *v >= -1e-6 && *v <= 1.0 + 1e-6));
    // Monotonic along each row
    for row in out.chunks(40) {
        assert!(row.windows(2).all(|w| w[0] <= w[1] + 1e-6));
    }
}

#[test]
fn test_vertical_only() {
    // 1 column, 4 rows -> 2 rows
    let out = resample_plane(&[0.0, 2.0, 4.0, 6.0], 1, 4, 1, 2).unwrap();
    assert_approx_eq!(out[0], 2.5 / 1.75, 1e-5);
    assert_approx_eq!(out[1], 8.0 / 1.75, 1e-5);
}

// ============================================================================
// Masked resampling
// ============================================================================

#[test]
fn test_same_size_preserves_nan_pattern() {
    let data = create_grid_with_nans(4, 4, &[(0, 0), (3, 2)]);
    let grid = Grid::new(data, 4, 4).unwrap();
    let out = resample_masked(&grid, 4, 4).unwrap();
    assert!(out.get(0, 0).unwrap().is_nan());
    assert!(out.get(3, 2).unwrap().is_nan());
    assert_eq!(out.valid_count(), 14);
}

#[test]
fn test_half_masked_downscale() {
    let grid = Grid::new(create_half_masked_grid(8, 2, 5.0), 8, 2).unwrap();
    let out = resample_masked(&grid, 4, 2).unwrap();

    for y in 0..2 {
        // Fully inside the valid half
        assert_approx_eq!(out.get(0, y).unwrap(), 5.0, 1e-5);
        // Straddles the edge: mostly valid, so kept
        assert!(out.get(1, y).unwrap().is_finite());
        // Mostly or entirely invalid
        assert!(out.get(2, y).unwrap().is_nan());
        assert!(out.get(3, y).unwrap().is_nan());
    }
}

#[test]
fn test_all_invalid_stays_invalid() {
    let grid = Grid::invalid(10, 10);
    let out = resample_masked(&grid, 3, 7).unwrap();
    assert_eq!((out.width, out.height), (3, 7));
    assert_eq!(out.valid_count(), 0);
}

#[test]
fn test_isolated_invalid_cell_stays_local() {
    // A single NaN only removes output cells close to it
    let data = create_grid_with_nans(9, 9, &[(4, 4)]);
    let grid = Grid::new(data.iter().map(|v| if v.is_nan() { *v } else { 1.0 }).collect(), 9, 9)
        .unwrap();
    let out = resample_masked(&grid, 18, 18).unwrap();
    assert_approx_eq!(out.get(0, 0).unwrap(), 1.0, 1e-6);
    assert_approx_eq!(out.get(17, 17).unwrap(), 1.0, 1e-6);
    assert!(out.get(9, 9).unwrap().is_nan());
}

#[test]
fn test_rejects_zero_target() {
    let grid = Grid::new(vec![1.0; 4], 2, 2).unwrap();
    assert!(resample_masked(&grid, 0, 2).is_err());
}
