//! Cumulative overlay index (`manifest.json`).
//!
//! The manifest is owned by the batch process: it is read once, merged in
//! memory and rewritten in full after every worker has finished. Writes go
//! through a sibling temp file and an atomic rename, and are serialized
//! across processes with an exclusive lock file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use overlay_common::{Product, ProductDefinition};

use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const LOCK_FILE: &str = "manifest.json.lock";

/// Placeholder legend: a 1x1 PNG.
pub const LEGEND_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8/x8AAwMBe6Xk6XkAAAAASUVORK5CYII=";

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A lock file older than this is left over from a killed process.
pub const STALE_LOCK_AGE: Duration = Duration::from_secs(600);

/// Mode of a freshly created manifest, readable by downstream viewers.
#[cfg(unix)]
const MANIFEST_MODE: u32 = 0o644;

/// One product's entry in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub legend: String,
    #[serde(default)]
    pub dates: BTreeSet<NaiveDate>,
    /// Fields written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OverlayRecord {
    fn new(definition: &ProductDefinition) -> Self {
        Self {
            id: definition.id.to_string(),
            name: definition.name.to_string(),
            units: definition.units.to_string(),
            legend: LEGEND_DATA_URI.to_string(),
            dates: BTreeSet::new(),
            extra: Map::new(),
        }
    }
}

/// The whole manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub overlays: Vec<OverlayRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Read `path`; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, id: &str) -> Option<&OverlayRecord> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Union `dates` into the record for `definition.id`.
    ///
    /// An existing record keeps its name, units and legend; a new record is
    /// appended with the catalog's.
    pub fn merge<I>(&mut self, definition: &ProductDefinition, dates: I)
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let index = match self.overlays.iter().position(|o| o.id == definition.id) {
            Some(index) => index,
            None => {
                self.overlays.push(OverlayRecord::new(definition));
                self.overlays.len() - 1
            }
        };
        self.overlays[index].dates.extend(dates);
    }

    /// Write the manifest atomically as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        // Temp files start out 0600; keep the manifest world-readable.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = match std::fs::metadata(path) {
                Ok(meta) => meta.permissions(),
                Err(_) => std::fs::Permissions::from_mode(MANIFEST_MODE),
            };
            tmp.as_file().set_permissions(permissions).map_err(io_err)?;
        }
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

/// Exclusive lock on a manifest, released on drop.
#[derive(Debug)]
pub struct ManifestLock {
    path: PathBuf,
}

impl ManifestLock {
    /// Create `path` exclusively, retrying until `wait` has elapsed.
    pub fn acquire(path: &Path, wait: Duration) -> Result<Self, ManifestError> {
        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    debug!(lock = %path.display(), "Acquired manifest lock");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if let Some(age) = lock_age(path) {
                        if age >= STALE_LOCK_AGE {
                            warn!(
                                lock = %path.display(),
                                age_secs = age.as_secs(),
                                "Removing stale manifest lock"
                            );
                            match std::fs::remove_file(path) {
                                Ok(()) => continue,
                                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                                Err(source) => {
                                    return Err(ManifestError::Io {
                                        path: path.to_path_buf(),
                                        source,
                                    })
                                }
                            }
                        }
                    }
                    if started.elapsed() >= wait {
                        return Err(ManifestError::LockTimeout {
                            path: path.to_path_buf(),
                            waited_ms: started.elapsed().as_millis(),
                        });
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(source) => {
                    return Err(ManifestError::Io {
                        path: path.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }
}

/// Time since the lock file was last modified, if it can be read.
fn lock_age(path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    modified.elapsed().ok()
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "Failed to remove manifest lock");
        }
    }
}

/// Merge successful dates into `{out_root}/manifest.json`.
///
/// Products with no dates are left alone. A manifest that does not parse is
/// reported and left untouched. Returns the manifest path.
#[instrument(skip(dates), fields(out_root = %out_root.display(), products = dates.len()))]
pub fn update_manifest(
    out_root: &Path,
    dates: &BTreeMap<Product, BTreeSet<NaiveDate>>,
    lock_wait: Duration,
) -> Result<PathBuf, ManifestError> {
    std::fs::create_dir_all(out_root).map_err(|source| ManifestError::Io {
        path: out_root.to_path_buf(),
        source,
    })?;

    let path = out_root.join(MANIFEST_FILE);
    let _lock = ManifestLock::acquire(&out_root.join(LOCK_FILE), lock_wait)?;

    let mut manifest = Manifest::load(&path)?;
    for (product, product_dates) in dates {
        if product_dates.is_empty() {
            continue;
        }
        manifest.merge(product.definition(), product_dates.iter().copied());
        info!(product = %product, dates = product_dates.len(), "Merged dates into manifest");
    }
    manifest.save(&path)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates_of(manifest: &Manifest, id: &str) -> Vec<NaiveDate> {
        manifest.get(id).unwrap().dates.iter().copied().collect()
    }

    #[test]
    fn test_merge_new_record() {
        let mut manifest = Manifest::default();
        manifest.merge(Product::ModisAlbedo.definition(), [ymd(2025, 9, 26)]);

        let record = manifest.get("modis_albedo_sw").unwrap();
        assert_eq!(record.name, "MODIS Albedo (Shortwave WSA)");
        assert_eq!(record.legend, LEGEND_DATA_URI);
        assert_eq!(dates_of(&manifest, "modis_albedo_sw"), vec![ymd(2025, 9, 26)]);
    }

    #[test]
    fn test_merge_keeps_existing_metadata() {
        let mut manifest = Manifest::default();
        manifest.merge(Product::ModisLst.definition(), [ymd(2025, 7, 1)]);
        manifest.overlays[0].name = "Custom".to_string();

        manifest.merge(Product::ModisLst.definition(), [ymd(2025, 8, 1), ymd(2025, 7, 1)]);
        assert_eq!(manifest.overlays.len(), 1);
        assert_eq!(manifest.overlays[0].name, "Custom");
        assert_eq!(
            dates_of(&manifest, "modis_lst"),
            vec![ymd(2025, 7, 1), ymd(2025, 8, 1)]
        );
    }

    #[test]
    fn test_dates_serialize_sorted_iso() {
        let mut manifest = Manifest::default();
        manifest.merge(Product::ViirsNdvi.definition(), [ymd(2025, 9, 1), ymd(2025, 8, 1)]);
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json["overlays"][0]["dates"],
            serde_json::json!(["2025-08-01", "2025-09-01"])
        );
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(&dir.path().join(MANIFEST_FILE)).unwrap();
        assert!(manifest.overlays.is_empty());
    }

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join(LOCK_FILE);

        let lock = ManifestLock::acquire(&lock_path, Duration::ZERO).unwrap();
        assert!(matches!(
            ManifestLock::acquire(&lock_path, Duration::from_millis(150)),
            Err(ManifestError::LockTimeout { .. })
        ));

        drop(lock);
        assert!(!lock_path.exists());
        assert!(ManifestLock::acquire(&lock_path, Duration::ZERO).is_ok());
    }
}
