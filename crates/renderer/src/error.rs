//! Error types for rendering.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Source or target grid has a zero dimension
    #[error("Cannot resample {src_width}x{src_height} to {dst_width}x{dst_height}")]
    EmptyGrid {
        src_width: usize,
        src_height: usize,
        dst_width: usize,
        dst_height: usize,
    },

    /// Buffer length does not match the stated dimensions
    #[error("Expected {expected} bytes for {width}x{height}, got {actual}")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// PNG compression failed
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
