//! Test data generators for synthetic satellite grids.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a grid that ramps linearly from `min` (left) to `max` (right).
///
/// Every row is identical, so horizontal resampling can be checked
/// against the analytic ramp.
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let step = if width > 1 {
        (max - min) / (width - 1) as f32
    } else {
        0.0
    };
    let row: Vec<f32> = (0..width).map(|col| min + step * col as f32).collect();
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        data.extend_from_slice(&row);
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Creates a grid with NaN values at specified positions.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `nan_positions` - List of (col, row) positions that should be NaN
///
/// # Returns
///
/// A `Vec<f32>` with NaN at specified positions, zeros elsewhere.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates a grid whose left half is valid (`value`) and right half NaN.
///
/// Models a granule edge or an ocean mask: resampling must not pull
/// zeros from the invalid half into the valid half.
pub fn create_half_masked_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(if col < width / 2 { value } else { f32::NAN });
        }
    }
    data
}

/// Creates packed integer-style values, as stored in a CMG granule.
///
/// Values cycle through `lo..=hi` in row-major order and every
/// `fill_every`-th cell (when non-zero) holds `fill`.
pub fn create_packed_grid(
    width: usize,
    height: usize,
    lo: i32,
    hi: i32,
    fill: i32,
    fill_every: usize,
) -> Vec<f64> {
    let span = (hi - lo + 1).max(1) as usize;
    (0..width * height)
        .map(|i| {
            if fill_every != 0 && i % fill_every == fill_every - 1 {
                fill as f64
            } else {
                (lo + (i % span) as i32) as f64
            }
        })
        .collect()
}

/// Creates RGBA pixel data for a simple test pattern.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        for col in 0..width {
            let r = ((col * 255) / width.max(1)) as u8;
            let g = ((row * 255) / height.max(1)) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}
