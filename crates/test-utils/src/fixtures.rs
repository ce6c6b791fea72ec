//! Common test fixtures for overlay tests.

/// Real-world granule filenames, one per supported product.
pub mod granules {
    pub const VIIRS_NDVI: &str = "VNP13C2.A2025213.002.2025245093052.h5";
    pub const MODIS_SNOW: &str = "MOD10C1.A2025213.061.2025215041602.hdf";
    pub const MODIS_ALBEDO: &str = "MCD43C3.A2025213.061.2025222043317.hdf";
    pub const MODIS_NBAR: &str = "MCD43C4.A2025213.061.2025222043317.hdf";
    pub const MODIS_LST: &str = "MOD11C3.A2025182.061.2025213150130.hdf";

    /// Acquisition date of the 2025213 granules above
    pub const AUG_1_2025: &str = "2025-08-01";

    /// Build a granule filename for an arbitrary product/date.
    pub fn granule_name(prefix: &str, year: i32, day_of_year: u32, ext: &str) -> String {
        format!("{}.A{:04}{:03}.061.2025000000000{}", prefix, year, day_of_year, ext)
    }
}

/// Packing attributes as they appear in CMG granules.
pub mod packing {
    /// VIIRS NDVI: int16, 0.0001 scale, -3000 fill
    pub const NDVI_SCALE: f64 = 0.0001;
    pub const NDVI_FILL: f64 = -3000.0;
    pub const NDVI_VALID_RANGE: [f64; 2] = [-2000.0, 10000.0];

    /// MODIS LST: uint16, 0.02 scale, 0 fill
    pub const LST_SCALE: f64 = 0.02;
    pub const LST_FILL: f64 = 0.0;
    pub const LST_VALID_RANGE: [f64; 2] = [7500.0, 65535.0];
}

/// Output dimensions used in tests (small stand-ins for 4096x2048).
pub mod dims {
    pub const SMALL_WIDTH: usize = 16;
    pub const SMALL_HEIGHT: usize = 8;
    pub const DEFAULT_WIDTH: usize = 4096;
    pub const DEFAULT_HEIGHT: usize = 2048;
}

/// Create an empty file named `name` inside `dir`, returning its path.
pub fn touch(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"").expect("Failed to create fixture file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granule_name() {
        assert_eq!(
            granules::granule_name("MOD10C1", 2024, 5, ".hdf"),
            "MOD10C1.A2024005.061.2025000000000.hdf"
        );
    }

    #[test]
    fn test_touch() {
        let dir = tempfile::tempdir().unwrap();
        let path = touch(dir.path(), granules::MODIS_SNOW);
        assert!(path.exists());
    }
}
