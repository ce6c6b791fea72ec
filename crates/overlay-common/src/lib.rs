//! Common types shared across the overlay conversion crates.
//!
//! - [`product`]: the compiled-in product catalog
//! - [`time`]: ordinal (`YYYYDDD`) acquisition dates
//! - [`grid`]: row-major float grids with NaN as "no data"

pub mod error;
pub mod grid;
pub mod product;
pub mod time;

pub use error::{OverlayError, OverlayResult};
pub use grid::Grid;
pub use product::{Product, ProductDefinition, GENERIC_PRODUCT};
pub use time::{format_date, ordinal_code, parse_date, parse_ordinal_date, ORDINAL_CODE_LEN};
