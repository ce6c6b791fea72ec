//! Satellite granule to web map overlay pipeline.
//!
//! - [`detect`]: product and acquisition date from granule filenames
//! - [`decode`]: packed integer storage to physical values
//! - [`convert`]: one granule to one overlay directory
//! - [`writer`]: overlay artifacts (`overlay_color.png`, `overlay_raw.bin`, `meta.json`)
//! - [`batch`]: folder scan and bounded fan-out to isolated workers
//! - [`manifest`]: cumulative `manifest.json` index
//! - [`status`]: processing progress of a dataset/overlay directory pair
//! - [`config`]: layered configuration

pub mod batch;
pub mod config;
pub mod convert;
pub mod decode;
pub mod detect;
pub mod error;
pub mod manifest;
pub mod status;
pub mod writer;

pub use batch::{
    run_batch, scan_folder, BatchOptions, BatchReport, ConversionJob, JobOutcome, ScanResult,
    SubprocessWorker, Worker,
};
pub use config::OverlayConfig;
pub use convert::{convert, convert_source, ConvertOptions, ConvertSummary};
pub use decode::{decode, Packing};
pub use detect::{detect_product, is_grid_file, SourceFile};
pub use error::{BatchError, ConfigError, ConvertError, ConvertResult, ManifestError};
pub use manifest::{update_manifest, Manifest, OverlayRecord};
pub use status::{ManifestSummary, ProcessingState, StatusReport};
pub use writer::{overlay_dir, write_overlay, OverlayMeta};
