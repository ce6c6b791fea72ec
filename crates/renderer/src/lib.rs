//! Image rendering for satellite overlays.
//!
//! - Mask-aware bilinear resampling of physical grids
//! - Percentile normalization and the viridis color ramp
//! - PNG encoding of the resulting RGBA image

pub mod colormap;
pub mod error;
pub mod png;
pub mod resample;

pub use colormap::{colorize, normalization_bounds, normalize, percentile, Color, VIRIDIS};
pub use error::{RenderError, RenderResult};
pub use png::create_png;
pub use resample::resample_masked;
