//! `overlay convert`: one granule to one overlay.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Args;
use tracing::error;

use overlay_common::parse_date;
use pipeline::{ConvertOptions, OverlayConfig};

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input HDF4/HDF5 granule
    #[arg(long = "in", value_name = "FILE")]
    pub input: PathBuf,

    /// Variable path to read (resolved from the product catalog when omitted)
    #[arg(long)]
    pub var: Option<String>,

    /// Overlay id (defaults to the detected product's id)
    #[arg(long)]
    pub id: Option<String>,

    /// Acquisition date, YYYY-MM-DD
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Output root (defaults to the configured root)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Output width in pixels
    #[arg(long)]
    pub width: Option<usize>,

    /// Output height in pixels
    #[arg(long)]
    pub height: Option<usize>,

    /// Lower normalization bound (2nd percentile when omitted)
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Upper normalization bound (98th percentile when omitted)
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
}

impl ConvertArgs {
    fn into_options(self, config: &OverlayConfig) -> ConvertOptions {
        ConvertOptions {
            input: self.input,
            variable: self.var,
            id: self.id,
            date: self.date,
            out_root: self.out.unwrap_or_else(|| config.out_root.clone()),
            width: self.width.unwrap_or(config.width),
            height: self.height.unwrap_or(config.height),
            min: self.min,
            max: self.max,
        }
    }
}

pub async fn run(args: ConvertArgs, config: &OverlayConfig) -> ExitCode {
    let opts = args.into_options(config);

    match tokio::task::spawn_blocking(move || pipeline::convert(&opts)).await {
        Ok(Ok(summary)) => {
            println!("[i] Selected variable: {}", summary.variable);
            println!("[OK] Wrote {}", summary.out_dir.display());
            println!(
                "  min={}, max={}, nan%={:.2}%",
                summary.min,
                summary.max,
                summary.nan_fraction * 100.0
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = %e, "Conversion failed");
            eprintln!("Error: {}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
        Err(e) => {
            eprintln!("Error: conversion task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
