//! `overlay batch`: convert a folder of granules and update the manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info};

use overlay_common::{format_date, Product};
use pipeline::{
    run_batch, scan_folder, update_manifest, BatchOptions, ConversionJob, JobOutcome,
    OverlayConfig, ScanResult, SubprocessWorker,
};

use super::rule;

/// Exit status when the folder holds no matching granules.
pub const EXIT_NO_FILES: u8 = 3;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Folder containing HDF/HDF5 granules
    #[arg(long)]
    pub folder: PathBuf,

    /// Output root for overlays and the manifest (defaults to the configured root)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Process only one product (e.g. modis_snow)
    #[arg(long)]
    pub product: Option<Product>,

    /// Number of concurrent conversions
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Show what would be processed without processing
    #[arg(long)]
    pub dry_run: bool,

    /// Deadline for one conversion, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

fn print_scan(scan: &ScanResult) {
    for path in &scan.skipped {
        let name = path.file_name().unwrap_or(path.as_os_str());
        println!("[!] Unknown product: {} (skipping)", name.to_string_lossy());
    }
    if scan.is_empty() {
        return;
    }

    println!(
        "\n[*] Found {} files across {} product(s):",
        scan.total_files(),
        scan.groups.len()
    );
    for (product, files) in &scan.groups {
        if let Some((first, last)) = scan.date_range(*product) {
            println!(
                "  - {}: {} files ({} to {})",
                product.name(),
                files.len(),
                format_date(first),
                format_date(last)
            );
        }
    }
}

/// Progress line for one finished job.
fn progress_line(index: usize, total: usize, outcome: &JobOutcome) -> String {
    let status = if outcome.succeeded() { "[OK]" } else { "[FAIL]" };
    let mut line = format!(
        "[{}/{}] {} {} - {}",
        index,
        total,
        status,
        outcome.job.product().name(),
        format_date(outcome.job.date())
    );
    if let Some(snippet) = outcome.error_snippet() {
        line.push_str(&format!("\n    Error: {}", snippet));
    }
    line
}

/// Worker that re-invokes this binary, forwarding the config file.
fn subprocess_worker(config_path: Option<&Path>) -> Result<SubprocessWorker> {
    let program = std::env::current_exe().context("Failed to locate the overlay binary")?;
    let mut worker = SubprocessWorker::new(program).with_args(["--log-level", "error"]);
    if let Some(path) = config_path {
        worker = worker.with_args([PathBuf::from("--config"), path.to_path_buf()]);
    }
    Ok(worker)
}

pub async fn run(
    args: BatchArgs,
    config: &OverlayConfig,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    let out_root = args.out.unwrap_or_else(|| config.out_root.clone());
    let opts = BatchOptions {
        workers: args.parallel.unwrap_or(config.workers).max(1),
        timeout: args
            .timeout_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or_else(|| config.timeout()),
    };

    println!("\n[*] Scanning folder: {}", args.folder.display());
    let scan = scan_folder(&args.folder, args.product)?;
    print_scan(&scan);

    if scan.is_empty() {
        println!("[!] No matching files found!");
        return Ok(ExitCode::from(EXIT_NO_FILES));
    }

    if args.dry_run {
        println!("\n[*] Dry run - nothing processed");
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n[*] Processing with {} worker(s)...\n", opts.workers);
    let worker = subprocess_worker(config_path)?;
    let jobs = ConversionJob::from_scan(&scan, &out_root);
    let report = run_batch(jobs, &worker, &opts, |i, total, outcome| {
        println!("{}", progress_line(i, total, outcome));
    })
    .await;

    println!("\n[*] Updating manifest...");
    let dates = report.successful_dates();
    let mut manifest_failed = false;
    if dates.is_empty() {
        println!("[!] No successful conversions, manifest unchanged");
    } else {
        let lock_wait = config.lock_wait();
        let root = out_root.clone();
        let result =
            tokio::task::spawn_blocking(move || update_manifest(&root, &dates, lock_wait)).await?;
        match result {
            Ok(path) => println!("[+] Updated manifest: {}", path.display()),
            Err(e) => {
                error!(error = %e, "Manifest update failed");
                println!("[!] Manifest update failed: {}", e);
                manifest_failed = true;
            }
        }
    }

    println!("\n{}", rule());
    println!("[+] Success: {}", report.succeeded());
    println!("[-] Failed:  {}", report.failed());
    println!("{}\n", rule());

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        out_root = %out_root.display(),
        "Batch complete"
    );

    if report.failed() > 0 || manifest_failed {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
