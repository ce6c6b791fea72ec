//! Subcommand implementations.

pub mod batch;
pub mod convert;
pub mod status;

/// Horizontal rule used in console reports.
pub(crate) fn rule() -> String {
    "=".repeat(60)
}
