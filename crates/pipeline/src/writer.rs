//! Overlay artifact writer.
//!
//! One overlay is a directory `{out_root}/{id}/{YYYY-MM-DD}/` holding:
//! - `overlay_color.png`: RGBA rendering, transparent where invalid
//! - `overlay_raw.bin`: row-major little-endian f32 grid, NaN as no data
//! - `meta.json`: [`OverlayMeta`]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{format_date, Grid};

use crate::error::{ConvertError, ConvertResult};

pub const COLOR_FILE: &str = "overlay_color.png";
pub const RAW_FILE: &str = "overlay_raw.bin";
pub const META_FILE: &str = "meta.json";

pub const COLORMAP: &str = "viridis";
pub const NODATA: &str = "NaN";
pub const NOTES: &str =
    "Resampled bilinear from CMG grid; CF packed scaling applied if attrs present.";

/// Contents of `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayMeta {
    pub id: String,
    pub name: String,
    pub units: String,
    pub date: String,
    pub width: usize,
    pub height: usize,
    pub min: f64,
    pub max: f64,
    pub colormap: String,
    pub nodata: String,
    pub notes: String,
}

impl OverlayMeta {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        name: &str,
        units: &str,
        date: NaiveDate,
        width: usize,
        height: usize,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            units: units.to_string(),
            date: format_date(date),
            width,
            height,
            min,
            max,
            colormap: COLORMAP.to_string(),
            nodata: NODATA.to_string(),
            notes: NOTES.to_string(),
        }
    }
}

/// Directory holding the overlay for `id` on `date`.
pub fn overlay_dir(out_root: &Path, id: &str, date: NaiveDate) -> PathBuf {
    out_root.join(id).join(format_date(date))
}

/// Serialize a grid as little-endian f32.
pub fn raw_bytes(grid: &Grid) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(grid.data.len() * 4);
    for v in &grid.data {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn write_file(path: &Path, contents: &[u8]) -> ConvertResult<()> {
    std::fs::write(path, contents).map_err(|source| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write all three artifacts into `dir`, creating it if needed and
/// overwriting whatever was there.
pub fn write_overlay(dir: &Path, png: &[u8], grid: &Grid, meta: &OverlayMeta) -> ConvertResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| ConvertError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    write_file(&dir.join(COLOR_FILE), png)?;
    write_file(&dir.join(RAW_FILE), &raw_bytes(grid))?;

    let json = serde_json::to_string_pretty(meta)?;
    write_file(&dir.join(META_FILE), json.as_bytes())?;

    debug!(dir = %dir.display(), bytes = png.len(), "Wrote overlay");
    Ok(())
}
