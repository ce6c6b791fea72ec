//! Error types for grid reading operations.

use thiserror::Error;

/// Result type for grid reader operations.
pub type GridReadResult<T> = Result<T, GridReadError>;

/// Error types for grid reading.
#[derive(Error, Debug)]
pub enum GridReadError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Extension does not name a supported container
    #[error("Unsupported container: {0}")]
    UnsupportedContainer(String),

    /// The container library refused to open the file
    #[error("Failed to open {path}: {message}")]
    Open { path: String, message: String },

    /// Named variable is not in the file
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// Variable exists but its values could not be read
    #[error("Failed to read {variable}: {message}")]
    Read { variable: String, message: String },

    /// Variable is not a 2-D grid
    #[error("Variable {variable} has shape {shape:?}; expected a 2-D grid")]
    InvalidShape { variable: String, shape: Vec<usize> },
}
