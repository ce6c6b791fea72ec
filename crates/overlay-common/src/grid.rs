//! Row-major float grids.

use crate::error::{OverlayError, OverlayResult};

/// A 2-D grid of physical values in row-major order.
///
/// NaN marks cells without a valid measurement. The same type carries both
/// decoded grids at native resolution and resampled grids at output
/// resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Grid {
    /// Create a grid, checking that the data matches the shape.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> OverlayResult<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(OverlayError::ShapeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height })
    }

    /// A grid with every cell invalid.
    pub fn invalid(width: usize, height: usize) -> Self {
        Self {
            data: vec![f32::NAN; width * height],
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Number of finite cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Fraction of cells that are not finite (0.0 for an empty grid).
    pub fn nan_fraction(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        (self.data.len() - self.valid_count()) as f64 / self.data.len() as f64
    }

    /// Validity as 1.0 (finite) / 0.0 (not finite).
    pub fn validity_mask(&self) -> Vec<f32> {
        self.data
            .iter()
            .map(|v| if v.is_finite() { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_checked() {
        assert!(Grid::new(vec![0.0; 6], 3, 2).is_ok());
        assert!(matches!(
            Grid::new(vec![0.0; 5], 3, 2),
            Err(OverlayError::ShapeMismatch { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn test_row_major_access() {
        let grid = Grid::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3, 2).unwrap();
        assert_eq!(grid.get(0, 0), Some(0.0));
        assert_eq!(grid.get(2, 0), Some(2.0));
        assert_eq!(grid.get(0, 1), Some(3.0));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_validity() {
        let grid = Grid::new(vec![1.0, f32::NAN, 3.0, f32::NAN], 2, 2).unwrap();
        assert_eq!(grid.valid_count(), 2);
        assert_eq!(grid.nan_fraction(), 0.5);
        assert_eq!(grid.validity_mask(), vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(Grid::invalid(4, 4).valid_count(), 0);
    }
}
