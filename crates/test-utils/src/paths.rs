//! Locating optional real granules for tests.
//!
//! Sample HDF files are large and not checked in. Tests that need one look
//! in a few well-known places and skip when nothing is there.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or(manifest_dir)
}

/// `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Find a sample file by name.
///
/// Searched in order: `$TEST_DATA_DIR`, `crates/grid-reader/testdata`,
/// `crates/pipeline/testdata`, `testdata/` and `datasets/` at the workspace
/// root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    let mut dirs: Vec<PathBuf> = std::env::var_os("TEST_DATA_DIR")
        .map(PathBuf::from)
        .into_iter()
        .collect();
    dirs.extend([
        crate_testdata_dir("grid-reader"),
        crate_testdata_dir("pipeline"),
        root.join("testdata"),
        root.join("datasets"),
    ]);

    dirs.into_iter().map(|d| d.join(name)).find(|p| p.exists())
}

/// Temporary output directory, removed on drop.
pub fn temp_test_dir(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}
