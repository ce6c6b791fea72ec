//! Satellite overlay converter.
//!
//! Turns NASA HDF4/HDF5 CMG granules into web map overlays (`convert`),
//! processes whole download folders with a worker pool (`batch`) and reports
//! what has been processed so far (`status`).

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use logging::LogFormat;
use pipeline::OverlayConfig;

#[derive(Parser, Debug)]
#[command(name = "overlay")]
#[command(about = "Convert satellite HDF granules into web map overlays")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one granule into an overlay directory
    Convert(commands::convert::ConvertArgs),

    /// Convert every recognized granule in a folder and update the manifest
    Batch(commands::batch::BatchArgs),

    /// Show what has been downloaded and processed
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format);
    grid_reader::silence_hdf5_errors();

    let config =
        OverlayConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(?config, "Loaded configuration");

    let code = match cli.command {
        Commands::Convert(args) => commands::convert::run(args, &config).await,
        Commands::Batch(args) => commands::batch::run(args, &config, cli.config.as_deref()).await?,
        Commands::Status(args) => commands::status::run(args, &config),
    };

    Ok(code)
}
