//! Test support for the overlay crates.
//!
//! Most tests run on synthetic grids: [`generators`] builds packed integer
//! arrays and physical `f32` grids with known fill and NaN layouts, and
//! [`fixtures`] holds CMG granule names and the packing attributes those
//! granules carry. Tests against real HDF4/HDF5 granules are opt-in: the
//! files are located through [`paths::find_test_file`] (`$TEST_DATA_DIR`
//! first) and the test is skipped when they are absent.
//!
//! ```ignore
//! use test_utils::{granules, require_test_file};
//!
//! #[test]
//! fn test_viirs_ndvi_converts() {
//!     let granule = require_test_file!(granules::VIIRS_NDVI);
//!     // convert `granule` into a temp output root...
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

use std::path::PathBuf;

/// Resolve every named granule, or report the first one that is missing.
pub fn locate_granules(names: &[&str]) -> Result<Vec<PathBuf>, String> {
    names
        .iter()
        .map(|name| find_test_file(name).ok_or_else(|| name.to_string()))
        .collect()
}

/// Message printed when a granule-backed test is skipped.
pub fn skip_message(name: &str) -> String {
    format!(
        "SKIPPED: granule '{}' not found; put it under testdata/ or point TEST_DATA_DIR at it",
        name
    )
}

/// Path of a sample granule, or return from the calling test when it is
/// not available locally.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("{}", $crate::skip_message($name));
                return;
            }
        }
    }};
}

/// Like [`require_test_file!`] for several granules at once; yields a
/// `Vec<PathBuf>` in argument order.
#[macro_export]
macro_rules! require_test_files {
    ($($name:expr),+ $(,)?) => {{
        match $crate::locate_granules(&[$($name),+]) {
            Ok(paths) => paths,
            Err(missing) => {
                eprintln!("{}", $crate::skip_message(&missing));
                return;
            }
        }
    }};
}

/// Why `left` and `right` are not within `epsilon`, if they are not.
///
/// NaN never compares close, so a stray fill value fails loudly.
pub fn approx_mismatch(left: f64, right: f64, epsilon: f64) -> Option<String> {
    let diff = (left - right).abs();
    if diff <= epsilon {
        return None;
    }
    Some(format!(
        "values differ: left `{:?}`, right `{:?}`, |diff| `{:?}` > `{:?}`",
        left, right, diff, epsilon
    ))
}

/// Assert two numbers agree within an absolute tolerance.
///
/// Operands are widened to `f64`, so `f32` grid samples can be compared
/// against literal physical values.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        if let Some(msg) =
            $crate::approx_mismatch($left as f64, $right as f64, $epsilon as f64)
        {
            panic!("{}", msg);
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_values_compare_within_tolerance() {
        // 0.0001-scaled NDVI reconstructed in f32
        assert_approx_eq!(6543.0_f32 * 0.0001_f32, 0.6543, 1e-6);
        assert_approx_eq!(300.0, 300.0, 0.0);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_nan_is_never_close() {
        assert_approx_eq!(f32::NAN, 0.0, 1.0);
    }

    #[test]
    fn test_locate_reports_missing_granule() {
        let missing = "MOD10C1.A1900001.061.0000000000000.hdf";
        assert_eq!(locate_granules(&[missing]), Err(missing.to_string()));
        assert!(skip_message(missing).contains("TEST_DATA_DIR"));
        assert_eq!(locate_granules(&[]), Ok(Vec::new()));
    }
}
