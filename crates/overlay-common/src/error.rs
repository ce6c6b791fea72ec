//! Error types shared by the overlay crates.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Errors raised by the shared types.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Grid shape mismatch: {width}x{height} needs {expected} cells, got {actual}")]
    ShapeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}
