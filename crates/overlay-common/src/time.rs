//! Acquisition date handling.
//!
//! Satellite granule names embed the acquisition date as a 7-digit ordinal
//! code `YYYYDDD` where `DDD` is the 1-based day of year (e.g. `A2025213`).
//! Overlays are keyed by the calendar date formatted as `YYYY-MM-DD`.

use chrono::{Datelike, NaiveDate};

use crate::error::{OverlayError, OverlayResult};

/// Length of an ordinal date code (`YYYYDDD`).
pub const ORDINAL_CODE_LEN: usize = 7;

/// Parse a `YYYYDDD` ordinal code into a calendar date.
///
/// The date is January 1 of `YYYY` advanced by `DDD - 1` days. Day 0 and days
/// past the end of the year are rejected rather than rolled into a
/// neighbouring year.
pub fn parse_ordinal_date(code: &str) -> Option<NaiveDate> {
    if code.len() != ORDINAL_CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = code[0..4].parse().ok()?;
    let day_of_year: u32 = code[4..7].parse().ok()?;

    NaiveDate::from_yo_opt(year, day_of_year)
}

/// Inverse of [`parse_ordinal_date`].
pub fn ordinal_code(date: NaiveDate) -> String {
    format!("{:04}{:03}", date.year(), date.ordinal())
}

/// Format a date the way overlay paths and metadata expect it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> OverlayResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| OverlayError::InvalidDate(s.to_string()))
}
