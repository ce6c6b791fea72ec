//! Product and date detection from granule filenames.
//!
//! Granule names follow `<SHORTNAME>.A<YYYYDDD>.<collection>.<production>.<ext>`,
//! e.g. `VNP13C2.A2025213.002.2025245093052.h5`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use overlay_common::{parse_ordinal_date, Product, ORDINAL_CODE_LEN};

/// Extensions of containers the reader understands.
pub const GRID_EXTENSIONS: [&str; 3] = ["h5", "hdf", "hdf5"];

/// A classified granule on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub product: Product,
    pub date: NaiveDate,
}

impl SourceFile {
    /// Classify `path` by its filename.
    pub fn from_path(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?;
        let (product, date) = detect_product(filename)?;
        Some(Self {
            path: path.to_path_buf(),
            product,
            date,
        })
    }
}

/// Check if a path has an HDF4/HDF5 extension (case-insensitive).
pub fn is_grid_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| GRID_EXTENSIONS.iter().any(|g| e.eq_ignore_ascii_case(g)))
        .unwrap_or(false)
}

/// Find `<prefix>.A<YYYYDDD>.` anywhere in `filename` and parse the date.
fn find_ordinal_date(filename: &str, prefix: &str) -> Option<NaiveDate> {
    let marker = format!("{}.A", prefix);
    filename.match_indices(&marker).find_map(|(pos, _)| {
        let start = pos + marker.len();
        let code = filename.get(start..start + ORDINAL_CODE_LEN)?;
        if filename.as_bytes().get(start + ORDINAL_CODE_LEN) != Some(&b'.') {
            return None;
        }
        parse_ordinal_date(code)
    })
}

/// Detect product and acquisition date from a filename.
///
/// Products are tried in catalog order; the first match wins. `None` means
/// the file should be skipped.
pub fn detect_product(filename: &str) -> Option<(Product, NaiveDate)> {
    Product::ALL.into_iter().find_map(|product| {
        find_ordinal_date(filename, product.definition().filename_prefix)
            .map(|date| (product, date))
    })
}
