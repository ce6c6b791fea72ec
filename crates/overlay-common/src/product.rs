//! Product catalog.
//!
//! Every supported satellite product is a variant of [`Product`]; its static
//! configuration lives in a [`ProductDefinition`]. Catalog order matters:
//! filename detection tries products in [`Product::ALL`] order and the first
//! match wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Static configuration for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefinition {
    /// Catalog key, used by the batch product filter
    pub key: &'static str,
    /// Overlay id, used for output paths and the manifest
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Physical units of the decoded values
    pub units: &'static str,
    /// Short name that starts the granule filename (`<PREFIX>.AYYYYDDD.`)
    pub filename_prefix: &'static str,
    /// Variable path handed to the converter when set
    pub variable: Option<&'static str>,
    /// Variable paths tried, in order, when resolving the dataset to read
    pub candidates: &'static [&'static str],
    /// Explicit normalization bounds
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Extension of the source container
    pub extension: &'static str,
}

/// Definition used when a filename matches no catalog entry.
pub static GENERIC_PRODUCT: ProductDefinition = ProductDefinition {
    key: "overlay",
    id: "overlay",
    name: "Overlay",
    units: "",
    filename_prefix: "",
    variable: None,
    candidates: &[],
    min: None,
    max: None,
    extension: "",
};

static VIIRS_NDVI: ProductDefinition = ProductDefinition {
    key: "viirs_ndvi",
    id: "viirs_ndvi",
    name: "VIIRS NDVI",
    units: "unitless",
    filename_prefix: "VNP13C2",
    variable: None,
    candidates: &[
        "HDFEOS/GRIDS/VIIRS_Grid_monthly_VI_CMG/Data_Fields/CMG_0.05_Deg_Monthly_NDVI",
        "HDFEOS/GRIDS/VNP_Grid_16Day_1km_VI/Data Fields/NDVI",
    ],
    min: None,
    max: None,
    extension: ".h5",
};

static MODIS_SNOW: ProductDefinition = ProductDefinition {
    key: "modis_snow",
    id: "modis_snow",
    name: "MODIS Snow Cover",
    units: "%",
    filename_prefix: "MOD10C1",
    variable: Some("MOD_Grid_Snow_5km/Data Fields/NDSI_Snow_Cover"),
    candidates: &["MOD_Grid_Snow_5km/Data Fields/NDSI_Snow_Cover"],
    min: Some(0.0),
    max: Some(100.0),
    extension: ".hdf",
};

static MODIS_ALBEDO: ProductDefinition = ProductDefinition {
    key: "modis_albedo",
    id: "modis_albedo_sw",
    name: "MODIS Albedo (Shortwave WSA)",
    units: "albedo (0–1)",
    filename_prefix: "MCD43C3",
    variable: Some("MCD_CMG_BRDF/Data Fields/Albedo_WSA_shortwave"),
    candidates: &["MCD_CMG_BRDF/Data Fields/Albedo_WSA_shortwave"],
    min: Some(0.0),
    max: Some(1.0),
    extension: ".hdf",
};

static MODIS_NBAR: ProductDefinition = ProductDefinition {
    key: "modis_nbar",
    id: "modis_nbar_band1",
    name: "MODIS NBAR Band1",
    units: "reflectance (0–1)",
    filename_prefix: "MCD43C4",
    variable: Some("MCD_CMG_Nbar/Data Fields/Nadir_Reflectance_Band1"),
    candidates: &[
        "MCD_CMG_Nbar/Data Fields/Nadir_Reflectance_Band1",
        "MCD_CMG_BRDF/Data Fields/Nadir_Reflectance_Band1",
    ],
    min: Some(0.0),
    max: Some(0.4),
    extension: ".hdf",
};

static MODIS_LST: ProductDefinition = ProductDefinition {
    key: "modis_lst",
    id: "modis_lst",
    name: "MODIS Land Surface Temperature",
    units: "Kelvin",
    filename_prefix: "MOD11C3",
    variable: Some("LST_Day_CMG"),
    candidates: &["LST_Day_CMG"],
    min: Some(230.0),
    max: Some(330.0),
    extension: ".hdf",
};

/// Supported satellite products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    /// VIIRS monthly vegetation index CMG (VNP13C2)
    ViirsNdvi,
    /// MODIS daily snow cover CMG (MOD10C1)
    ModisSnow,
    /// MODIS BRDF/albedo CMG (MCD43C3)
    ModisAlbedo,
    /// MODIS nadir BRDF-adjusted reflectance CMG (MCD43C4)
    ModisNbar,
    /// MODIS monthly land surface temperature CMG (MOD11C3)
    ModisLst,
}

impl Product {
    /// All products in detection order.
    pub const ALL: [Product; 5] = [
        Product::ViirsNdvi,
        Product::ModisSnow,
        Product::ModisAlbedo,
        Product::ModisNbar,
        Product::ModisLst,
    ];

    pub fn definition(&self) -> &'static ProductDefinition {
        match self {
            Product::ViirsNdvi => &VIIRS_NDVI,
            Product::ModisSnow => &MODIS_SNOW,
            Product::ModisAlbedo => &MODIS_ALBEDO,
            Product::ModisNbar => &MODIS_NBAR,
            Product::ModisLst => &MODIS_LST,
        }
    }

    pub fn key(&self) -> &'static str {
        self.definition().key
    }

    pub fn id(&self) -> &'static str {
        self.definition().id
    }

    pub fn name(&self) -> &'static str {
        self.definition().name
    }

    /// Look up a product by its catalog key (`modis_albedo`).
    pub fn from_key(key: &str) -> Option<Product> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Look up a product by its overlay id (`modis_albedo_sw`).
    pub fn from_id(id: &str) -> Option<Product> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Infer the product from the start of a granule filename.
    pub fn from_filename(filename: &str) -> Option<Product> {
        Self::ALL
            .into_iter()
            .find(|p| filename.starts_with(p.definition().filename_prefix))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Product {
    type Err = OverlayError;

    /// Accepts either the catalog key or the overlay id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::from_key(s)
            .or_else(|| Product::from_id(s))
            .ok_or_else(|| OverlayError::UnknownProduct(s.to_string()))
    }
}
