//! Processing status of a dataset/overlay directory pair.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::manifest::{Manifest, MANIFEST_FILE};

/// Overall progress from downloaded granules to overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    /// No granules in the dataset directory
    NoDownloads,
    /// Granules present, no overlays yet
    NotProcessed,
    Partial { done: usize, total: usize },
    Complete,
}

/// What the manifest says, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestSummary {
    Missing,
    /// `(name, date count)` per record
    Present(Vec<(String, usize)>),
    Invalid(String),
}

/// Snapshot of the dataset and overlay directories.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub datasets_dir: PathBuf,
    pub overlays_dir: PathBuf,
    /// Files ending in `.hdf`
    pub hdf_files: usize,
    /// Files ending in `.h5`
    pub h5_files: usize,
    /// Date directories per overlay product directory, sorted
    pub overlays: BTreeMap<String, Vec<String>>,
    pub manifest: ManifestSummary,
}

impl StatusReport {
    /// Inspect `datasets_dir` and `overlays_dir`. Missing directories count
    /// as empty.
    pub fn collect(datasets_dir: &Path, overlays_dir: &Path) -> Self {
        Self {
            datasets_dir: datasets_dir.to_path_buf(),
            overlays_dir: overlays_dir.to_path_buf(),
            hdf_files: count_with_suffix(datasets_dir, ".hdf"),
            h5_files: count_with_suffix(datasets_dir, ".h5"),
            overlays: processed_overlays(overlays_dir),
            manifest: summarize_manifest(&overlays_dir.join(MANIFEST_FILE)),
        }
    }

    pub fn downloaded(&self) -> usize {
        self.hdf_files + self.h5_files
    }

    pub fn total_overlays(&self) -> usize {
        self.overlays.values().map(Vec::len).sum()
    }

    pub fn state(&self) -> ProcessingState {
        let downloaded = self.downloaded();
        let done = self.total_overlays();
        if downloaded == 0 {
            ProcessingState::NoDownloads
        } else if done == 0 {
            ProcessingState::NotProcessed
        } else if done < downloaded {
            ProcessingState::Partial {
                done,
                total: downloaded,
            }
        } else {
            ProcessingState::Complete
        }
    }
}

fn entries(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
}

fn count_with_suffix(dir: &Path, suffix: &str) -> usize {
    entries(dir)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .count()
}

fn processed_overlays(dir: &Path) -> BTreeMap<String, Vec<String>> {
    entries(dir)
        .filter(|e| e.file_type().is_dir())
        .map(|product| {
            let dates = entries(product.path())
                .filter(|e| e.file_type().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            (product.file_name().to_string_lossy().into_owned(), dates)
        })
        .collect()
}

fn summarize_manifest(path: &Path) -> ManifestSummary {
    if !path.exists() {
        return ManifestSummary::Missing;
    }
    match Manifest::load(path) {
        Ok(manifest) => ManifestSummary::Present(
            manifest
                .overlays
                .iter()
                .map(|o| (o.name.clone(), o.dates.len()))
                .collect(),
        ),
        Err(e) => ManifestSummary::Invalid(e.to_string()),
    }
}
