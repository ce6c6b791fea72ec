//! Grid reader for satellite granules.
//!
//! Reads a single 2-D variable, plus its attributes, out of HDF5 (`.h5`,
//! `.hdf5`) and HDF4 (`.hdf`) containers. Reading is two-phase: without a
//! variable name the reader lists what the file holds, and the caller picks
//! one (see [`select_variable`]) before fetching data.
//!
//! Both containers go through libnetcdf. HDF5 variables are addressed by
//! their full group path (`MOD_Grid/Data Fields/NDVI`); HDF4 scientific
//! datasets are flat and addressed by name.

pub mod attributes;
pub mod error;
pub mod memory;
pub mod native;
pub mod select;

use std::path::Path;

pub use attributes::{AttrValue, Attributes};
pub use error::{GridReadError, GridReadResult};
pub use memory::MemorySource;
pub use native::{open, silence_hdf5_errors, NetcdfSource};
pub use select::{select_variable, Selection, Strategy};

/// Container format of a granule, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Hdf5,
    Hdf4,
}

impl ContainerKind {
    /// `.h5`/`.hdf5` are HDF5, `.hdf` is HDF4. Case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "h5" | "hdf5" => Some(ContainerKind::Hdf5),
            "hdf" => Some(ContainerKind::Hdf4),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::Hdf5 => f.write_str("HDF5"),
            ContainerKind::Hdf4 => f.write_str("HDF4"),
        }
    }
}

/// A variable's packed values, widened to f64, with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGrid {
    /// Row-major values in the container's packed units
    pub values: Vec<f64>,
    pub width: usize,
    pub height: usize,
    pub attributes: Attributes,
}

impl RawGrid {
    pub fn new(values: Vec<f64>, width: usize, height: usize, attributes: Attributes) -> Self {
        Self {
            values,
            width,
            height,
            attributes,
        }
    }
}

/// Outcome of [`read`]: data when a variable was named, otherwise the list
/// of readable variables.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Data(RawGrid),
    Variables(Vec<String>),
}

/// Anything that can list and fetch gridded variables.
pub trait GridSource {
    /// Readable variable names, in container order.
    fn list_variables(&self) -> GridReadResult<Vec<String>>;

    /// Fetch one variable.
    fn read_variable(&self, name: &str) -> GridReadResult<RawGrid>;
}

/// Two-phase read against an open source.
pub fn read(source: &dyn GridSource, variable: Option<&str>) -> GridReadResult<ReadOutcome> {
    match variable {
        Some(name) => Ok(ReadOutcome::Data(source.read_variable(name)?)),
        None => Ok(ReadOutcome::Variables(source.list_variables()?)),
    }
}

/// Open `path` and perform a two-phase read.
pub fn read_file(path: &Path, variable: Option<&str>) -> GridReadResult<ReadOutcome> {
    let source = open(path)?;
    read(source.as_ref(), variable)
}

/// Reduce a variable shape to `(width, height)`.
///
/// Leading length-1 dimensions (a single time step, a single band) are
/// dropped. Whatever remains must be exactly two dimensions, rows then
/// columns.
pub fn grid_dims(variable: &str, shape: &[usize]) -> GridReadResult<(usize, usize)> {
    let mut dims = shape;
    while dims.len() > 2 && dims[0] == 1 {
        dims = &dims[1..];
    }
    match dims {
        [rows, cols] => Ok((*cols, *rows)),
        _ => Err(GridReadError::InvalidShape {
            variable: variable.to_string(),
            shape: shape.to_vec(),
        }),
    }
}
