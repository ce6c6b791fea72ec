//! `overlay status`: what has been downloaded and processed.

use std::fmt::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use pipeline::{ManifestSummary, OverlayConfig, ProcessingState, StatusReport};

use super::rule;

/// Overlay products with at most this many dates list them individually.
const MAX_LISTED_DATES: usize = 5;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Folder with downloaded granules
    #[arg(long, default_value = "datasets")]
    pub datasets: PathBuf,

    /// Overlay root (defaults to the configured root)
    #[arg(long)]
    pub overlays: Option<PathBuf>,
}

/// Render the report as console text.
fn render(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &StatusReport) -> std::fmt::Result {
    writeln!(out, "\n{}\nDATA PROCESSING STATUS\n{}\n", rule(), rule())?;

    writeln!(out, "DOWNLOADED FILES (raw HDF/HDF5):")?;
    writeln!(out, "  HDF4 files (.hdf): {}", report.hdf_files)?;
    writeln!(out, "  HDF5 files (.h5):  {}", report.h5_files)?;
    writeln!(out, "  Total:             {}", report.downloaded())?;

    if report.downloaded() == 0 {
        writeln!(out, "\n  [!] No files found in {}", report.datasets_dir.display())?;
        writeln!(out, "      Download HDF files there first!\n")?;
        return Ok(());
    }
    writeln!(out)?;

    writeln!(out, "PROCESSED OVERLAYS:")?;
    if report.overlays.is_empty() {
        writeln!(out, "  [!] No overlays processed yet")?;
        writeln!(out, "      Run `overlay batch` to create overlays\n")?;
        return Ok(());
    }
    for (product, dates) in &report.overlays {
        writeln!(out, "  {}: {} dates", product, dates.len())?;
        if dates.len() <= MAX_LISTED_DATES {
            for date in dates {
                writeln!(out, "    - {}", date)?;
            }
        } else if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            writeln!(out, "    - {} to {}", first, last)?;
        }
    }
    writeln!(out, "  Total overlays: {}\n", report.total_overlays())?;

    writeln!(out, "MANIFEST:")?;
    match &report.manifest {
        ManifestSummary::Present(records) => {
            writeln!(out, "  [+] manifest.json exists")?;
            writeln!(out, "  Products: {}", records.len())?;
            for (name, count) in records {
                writeln!(out, "    - {}: {} dates", name, count)?;
            }
        }
        ManifestSummary::Missing => {
            writeln!(out, "  [!] manifest.json not found")?;
            writeln!(out, "      Will be created when you run `overlay batch`")?;
        }
        ManifestSummary::Invalid(e) => {
            writeln!(out, "  [!] manifest.json is invalid: {}", e)?;
        }
    }

    writeln!(out, "\n{}\nSUMMARY\n{}", rule(), rule())?;
    match report.state() {
        ProcessingState::NoDownloads => writeln!(out, "\n[!] Status: Nothing downloaded")?,
        ProcessingState::NotProcessed => writeln!(out, "\n[+] Status: Downloaded, NOT processed")?,
        ProcessingState::Partial { done, total } => {
            writeln!(out, "\n[~] Status: Partially processed ({}/{})", done, total)?
        }
        ProcessingState::Complete => writeln!(out, "\n[+] Status: ALL PROCESSED!")?,
    }
    Ok(())
}

pub fn run(args: StatusArgs, config: &OverlayConfig) -> ExitCode {
    let overlays = args.overlays.unwrap_or_else(|| config.out_root.clone());
    let report = StatusReport::collect(&args.datasets, &overlays);
    print!("{}", render(&report));
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_without_downloads() {
        let dir = TempDir::new().unwrap();
        let text = render(&StatusReport::collect(dir.path(), dir.path()));
        assert!(text.contains("Total:             0"));
        assert!(text.contains("[!] No files found in"));
        assert!(!text.contains("SUMMARY"));
    }

    #[test]
    fn test_render_partial_with_date_range() {
        let dir = TempDir::new().unwrap();
        let datasets = dir.path().join("datasets");
        let overlays = dir.path().join("overlays");
        std::fs::create_dir_all(&datasets).unwrap();
        for i in 0..8 {
            std::fs::write(datasets.join(format!("g{}.hdf", i)), b"").unwrap();
            std::fs::create_dir_all(overlays.join("modis_snow").join(format!("2025-01-0{}", i + 1)))
                .unwrap();
        }
        std::fs::create_dir_all(overlays.join("modis_lst/2025-07-01")).unwrap();
        std::fs::write(datasets.join("extra.h5"), b"").unwrap();
        std::fs::write(datasets.join("extra2.h5"), b"").unwrap();

        let text = render(&StatusReport::collect(&datasets, &overlays));
        assert!(text.contains("  modis_snow: 8 dates\n    - 2025-01-01 to 2025-01-08\n"));
        assert!(text.contains("  modis_lst: 1 dates\n    - 2025-07-01\n"));
        assert!(text.contains("  [!] manifest.json not found"));
        assert!(text.contains("[~] Status: Partially processed (9/10)"));
    }
}
