//! Conversion and batch configuration.
//!
//! Values resolve in layers: built-in defaults, then an optional YAML file
//! (with `${VAR}` / `${VAR:-default}` substitution), then `OVERLAY_*`
//! environment variables. Command-line flags are applied last by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_WIDTH: usize = 4096;
pub const DEFAULT_HEIGHT: usize = 2048;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_LOCK_WAIT_SECS: u64 = 30;

/// Runtime configuration shared by `convert` and `batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Output grid width in pixels
    pub width: usize,
    /// Output grid height in pixels
    pub height: usize,
    /// Root directory for overlays and the manifest
    pub out_root: PathBuf,
    /// Concurrent conversions in a batch
    pub workers: usize,
    /// Wall-clock budget for one conversion
    pub timeout_secs: u64,
    /// How long to wait for the manifest lock
    pub lock_wait_secs: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            out_root: PathBuf::from("overlays"),
            workers: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            lock_wait_secs: DEFAULT_LOCK_WAIT_SECS,
        }
    }
}

impl OverlayConfig {
    /// Defaults, overlaid with `path` if given, then with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Apply `OVERLAY_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OVERLAY_WIDTH") {
            self.width = parse_var("OVERLAY_WIDTH", &v)?;
        }
        if let Some(v) = lookup("OVERLAY_HEIGHT") {
            self.height = parse_var("OVERLAY_HEIGHT", &v)?;
        }
        if let Some(v) = lookup("OVERLAY_OUT") {
            self.out_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("OVERLAY_WORKERS") {
            self.workers = parse_var("OVERLAY_WORKERS", &v)?;
        }
        if let Some(v) = lookup("OVERLAY_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("OVERLAY_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "output size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(self.lock_wait_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => {
                        return Err(ConfigError::Invalid(format!(
                            "Unclosed variable substitution: ${{{}",
                            var_expr
                        )))
                    }
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String, ConfigError> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).map_err(|_| ConfigError::MissingVar {
            name: expr.trim().to_string(),
        })
    }
}
