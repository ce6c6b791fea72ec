//! Native container access through the netcdf library.
//!
//! libnetcdf opens HDF5 files directly and, when built with HDF4 support,
//! HDF4 scientific datasets as well. Values are read in packed units: the
//! library does not apply `scale_factor`/`add_offset`, which is left to the
//! decoder.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::debug;

use crate::attributes::{AttrValue, Attributes};
use crate::error::{GridReadError, GridReadResult};
use crate::{grid_dims, ContainerKind, GridSource, RawGrid};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully (e.g. when probing for optional attributes or
/// opening groups that are not netCDF-4 compliant), producing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Call early in `main()`, before any container is opened. Safe to call
/// more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Open a granule, choosing the container kind by extension.
pub fn open(path: &Path) -> GridReadResult<Box<dyn GridSource>> {
    let kind = ContainerKind::from_path(path)
        .ok_or_else(|| GridReadError::UnsupportedContainer(path.display().to_string()))?;
    Ok(Box::new(NetcdfSource::open(path, kind)?))
}

/// A granule opened through libnetcdf.
pub struct NetcdfSource {
    file: netcdf::File,
    kind: ContainerKind,
    path: PathBuf,
}

impl NetcdfSource {
    pub fn open(path: &Path, kind: ContainerKind) -> GridReadResult<Self> {
        silence_hdf5_errors();

        if !path.exists() {
            return Err(GridReadError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let file = netcdf::open(path).map_err(|e| GridReadError::Open {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(path = %path.display(), kind = %kind, "Opened container");

        Ok(Self {
            file,
            kind,
            path: path.to_path_buf(),
        })
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GridSource for NetcdfSource {
    fn list_variables(&self) -> GridReadResult<Vec<String>> {
        let mut names: Vec<String> = self.file.variables().map(|v| v.name()).collect();

        // HDF4 scientific datasets are flat; only HDF5 has groups to walk.
        if self.kind == ContainerKind::Hdf5 {
            let groups = self.file.groups().map_err(|e| GridReadError::Open {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;
            for group in groups {
                collect_group_variables(&group, &group.name(), &mut names);
            }
        }

        Ok(names)
    }

    fn read_variable(&self, name: &str) -> GridReadResult<RawGrid> {
        let name = name.trim_start_matches('/');
        let parts: Vec<&str> = name.split('/').collect();

        let found = match parts.as_slice() {
            [] => None,
            [single] => match self.file.variable(single) {
                Some(var) => Some(read_netcdf_variable(&var, name)?),
                None => None,
            },
            [first, rest @ ..] => {
                let group = self.file.group(first).map_err(|e| GridReadError::Read {
                    variable: name.to_string(),
                    message: e.to_string(),
                })?;
                match group {
                    Some(group) => read_in_group(&group, rest, name)?,
                    None => None,
                }
            }
        };

        found.ok_or_else(|| GridReadError::VariableNotFound(name.to_string()))
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

fn collect_group_variables(group: &netcdf::Group, prefix: &str, names: &mut Vec<String>) {
    for var in group.variables() {
        names.push(format!("{}/{}", prefix, var.name()));
    }
    for child in group.groups() {
        let path = format!("{}/{}", prefix, child.name());
        collect_group_variables(&child, &path, names);
    }
}

/// Descend `parts` below `group`; the last part names the variable.
fn read_in_group(
    group: &netcdf::Group,
    parts: &[&str],
    full_name: &str,
) -> GridReadResult<Option<RawGrid>> {
    match parts {
        [] => Ok(None),
        [leaf] => match group.variable(leaf) {
            Some(var) => Ok(Some(read_netcdf_variable(&var, full_name)?)),
            None => Ok(None),
        },
        [next, rest @ ..] => match group.group(next) {
            Some(child) => read_in_group(&child, rest, full_name),
            None => Ok(None),
        },
    }
}

fn read_netcdf_variable(var: &netcdf::Variable, full_name: &str) -> GridReadResult<RawGrid> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let (width, height) = grid_dims(full_name, &shape)?;

    let values: Vec<f64> = var.get_values(..).map_err(|e| GridReadError::Read {
        variable: full_name.to_string(),
        message: e.to_string(),
    })?;

    if values.len() != width * height {
        return Err(GridReadError::InvalidShape {
            variable: full_name.to_string(),
            shape,
        });
    }

    let attributes = read_attributes(var);
    debug!(
        variable = %full_name,
        width,
        height,
        attributes = attributes.len(),
        "Read variable"
    );

    Ok(RawGrid::new(values, width, height, attributes))
}

/// Convert every readable attribute. Unreadable ones are skipped.
fn read_attributes(var: &netcdf::Variable) -> Attributes {
    let mut attrs = Attributes::new();
    for attr in var.attributes() {
        let name = attr.name().to_string();
        match attr.value() {
            Ok(value) => {
                if let Some(value) = convert_attribute(value) {
                    attrs.insert(name, value);
                }
            }
            Err(e) => debug!(attribute = %name, error = %e, "Skipping unreadable attribute"),
        }
    }
    attrs
}

fn numbers<T: Into<f64>>(values: Vec<T>) -> AttrValue {
    AttrValue::Numbers(values.into_iter().map(Into::into).collect())
}

fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttrValue> {
    use netcdf::AttributeValue as V;

    let converted = match value {
        V::Uchar(v) => AttrValue::Number(v.into()),
        V::Uchars(v) => numbers(v),
        V::Schar(v) => AttrValue::Number(v.into()),
        V::Schars(v) => numbers(v),
        V::Ushort(v) => AttrValue::Number(v.into()),
        V::Ushorts(v) => numbers(v),
        V::Short(v) => AttrValue::Number(v.into()),
        V::Shorts(v) => numbers(v),
        V::Uint(v) => AttrValue::Number(v.into()),
        V::Uints(v) => numbers(v),
        V::Int(v) => AttrValue::Number(v.into()),
        V::Ints(v) => numbers(v),
        V::Ulonglong(v) => AttrValue::Number(v as f64),
        V::Ulonglongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        V::Longlong(v) => AttrValue::Number(v as f64),
        V::Longlongs(v) => AttrValue::Numbers(v.into_iter().map(|x| x as f64).collect()),
        V::Float(v) => AttrValue::Number(v.into()),
        V::Floats(v) => numbers(v),
        V::Double(v) => AttrValue::Number(v),
        V::Doubles(v) => AttrValue::Numbers(v),
        V::Str(s) => AttrValue::Text(s),
        V::Strs(s) => AttrValue::Text(s.join(",")),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_idempotent() {
        silence_hdf5_errors();
        silence_hdf5_errors();
    }

    #[test]
    fn test_open_rejects_unknown_extension() {
        let err = open(Path::new("granule.nc4")).err().unwrap();
        assert!(matches!(err, GridReadError::UnsupportedContainer(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = open(&dir.path().join("VNP13C2.A2025213.002.h5")).err().unwrap();
        assert!(matches!(err, GridReadError::IoError(_)));
    }

    #[test]
    fn test_open_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MOD10C1.A2025213.061.hdf");
        std::fs::write(&path, b"not an hdf file").unwrap();
        assert!(open(&path).is_err());
    }

    #[test]
    fn test_convert_attribute_types() {
        use netcdf::AttributeValue as V;
        assert_eq!(convert_attribute(V::Short(-3000)), Some(AttrValue::Number(-3000.0)));
        assert_eq!(
            convert_attribute(V::Shorts(vec![-2000, 10000])),
            Some(AttrValue::Numbers(vec![-2000.0, 10000.0]))
        );
        assert_eq!(convert_attribute(V::Double(0.0001)), Some(AttrValue::Number(0.0001)));
        assert_eq!(
            convert_attribute(V::Str("NDVI".to_string())),
            Some(AttrValue::Text("NDVI".to_string()))
        );
    }
}
