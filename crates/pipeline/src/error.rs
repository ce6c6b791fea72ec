//! Error types for the pipeline crate.

use std::path::PathBuf;

use thiserror::Error;

use grid_reader::GridReadError;
use overlay_common::OverlayError;
use renderer::RenderError;

/// Exit status of a conversion that found nothing readable in its input.
pub const EXIT_NO_VARIABLES: i32 = 2;

/// Errors from converting a single granule.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to read grid: {0}")]
    Read(#[from] GridReadError),

    #[error("No datasets found in {0}")]
    NoVariables(PathBuf),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl ConvertError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::NoVariables(_) => EXIT_NO_VARIABLES,
            _ => 1,
        }
    }
}

/// Errors reading or writing the manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to access manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Timed out after {waited_ms} ms waiting for lock {path}; \
         if no other batch is running, remove the stale lock file"
    )]
    LockTimeout { path: PathBuf, waited_ms: u128 },
}

/// Errors that abort a batch run as a whole.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable {name} not set")]
    MissingVar { name: String },

    #[error("Invalid value {value:?} for {name}")]
    InvalidValue { name: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for conversions.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
