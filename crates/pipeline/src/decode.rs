//! Packed value decoding.
//!
//! CMG granules store integers plus CF-style attributes. Masking happens in
//! packed units, before scaling, because `_FillValue` and `valid_range` are
//! declared in the stored type.

use grid_reader::{Attributes, RawGrid};
use overlay_common::{Grid, OverlayResult};
use tracing::debug;

/// Packing attributes resolved to plain numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub fill_value: Option<f64>,
    pub valid_range: Option<(f64, f64)>,
}

impl Default for Packing {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            fill_value: None,
            valid_range: None,
        }
    }
}

impl Packing {
    pub fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            scale_factor: attrs.scalar("scale_factor").unwrap_or(1.0),
            add_offset: attrs.scalar("add_offset").unwrap_or(0.0),
            fill_value: attrs.scalar("_FillValue"),
            valid_range: attrs.pair("valid_range"),
        }
    }

    /// Physical value of one packed cell, or NaN if it is masked.
    #[inline]
    pub fn unpack(&self, raw: f64) -> f32 {
        if self.fill_value == Some(raw) {
            return f32::NAN;
        }
        if let Some((lo, hi)) = self.valid_range {
            if raw < lo || raw > hi {
                return f32::NAN;
            }
        }
        (raw * self.scale_factor + self.add_offset) as f32
    }
}

/// Decode a raw grid into physical values with NaN as "no data".
pub fn decode(raw: &RawGrid) -> OverlayResult<Grid> {
    let packing = Packing::from_attributes(&raw.attributes);
    debug!(
        scale_factor = packing.scale_factor,
        add_offset = packing.add_offset,
        fill_value = ?packing.fill_value,
        valid_range = ?packing.valid_range,
        "Decoding packed grid"
    );
    let data = raw.values.iter().map(|v| packing.unpack(*v)).collect();
    Grid::new(data, raw.width, raw.height)
}
