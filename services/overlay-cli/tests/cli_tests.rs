//! Tests that drive the `overlay` binary.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn overlay(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_overlay"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("OVERLAY_CONFIG")
        .env_remove("OVERLAY_OUT")
        .output()
        .expect("failed to run overlay")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_batch_on_empty_folder_exits_3() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("in")).unwrap();

    let output = overlay(&["batch", "--folder", "in", "--out", "out"], dir.path());
    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).contains("[!] No matching files found!"));
    assert!(!dir.path().join("out/manifest.json").exists());
}

#[test]
fn test_dry_run_lists_products() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    for name in [
        "MOD10C1.A2025001.061.2025003000000.hdf",
        "MOD10C1.A2025005.061.2025007000000.hdf",
        "mystery.h5",
    ] {
        std::fs::write(input.join(name), b"").unwrap();
    }

    let output = overlay(&["batch", "--folder", "in", "--out", "out", "--dry-run"], dir.path());
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    assert!(text.contains("[!] Unknown product: mystery.h5 (skipping)"));
    assert!(text.contains("[*] Found 2 files across 1 product(s):"));
    assert!(text.contains("  - MODIS Snow Cover: 2 files (2025-01-01 to 2025-01-05)"));
    assert!(text.contains("[*] Dry run - nothing processed"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_batch_reports_unreadable_granules() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    std::fs::write(input.join("MOD11C3.A2025182.061.2025213150130.hdf"), b"not hdf").unwrap();

    let output = overlay(&["batch", "--folder", "in", "--out", "out"], dir.path());
    assert_eq!(output.status.code(), Some(1));

    let text = stdout(&output);
    assert!(text.contains("[1/1] [FAIL] MODIS Land Surface Temperature - 2025-07-01"));
    assert!(text.contains("    Error: "));
    assert!(text.contains("[+] Success: 0"));
    assert!(text.contains("[-] Failed:  1"));
    assert!(!dir.path().join("out/manifest.json").exists());
}

#[test]
fn test_convert_missing_input_exits_1() {
    let dir = TempDir::new().unwrap();
    let output = overlay(
        &["convert", "--in", "absent.h5", "--date", "2025-08-01", "--out", "out"],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_status_without_downloads() {
    let dir = TempDir::new().unwrap();
    let output = overlay(&["status", "--datasets", "datasets", "--overlays", "overlays"], dir.path());
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("DATA PROCESSING STATUS"));
    assert!(stdout(&output).contains("[!] No files found in datasets"));
}
