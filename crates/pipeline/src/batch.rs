//! Batch orchestration.
//!
//! A folder is scanned for granules, each classified granule becomes a
//! [`ConversionJob`], and jobs are dispatched to a [`Worker`] with bounded
//! concurrency and a per-job deadline. A failing job never aborts the batch.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use overlay_common::{format_date, Product};

use crate::detect::{is_grid_file, SourceFile};
use crate::error::BatchError;

/// Characters of a failure message shown in progress output.
pub const ERROR_SNIPPET_LEN: usize = 100;

/// Classified granules of one folder.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Files per product in catalog order, each sorted by date
    pub groups: BTreeMap<Product, Vec<SourceFile>>,
    /// Grid files that matched no product
    pub skipped: Vec<PathBuf>,
}

impl ScanResult {
    pub fn total_files(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// First and last date of a product's files.
    pub fn date_range(&self, product: Product) -> Option<(NaiveDate, NaiveDate)> {
        let files = self.groups.get(&product)?;
        Some((files.first()?.date, files.last()?.date))
    }
}

/// Scan `folder` (non-recursively) for granules.
///
/// Symlinked granules are followed. Grid files with no recognizable product
/// and entries that cannot be read are skipped with a warning. When `filter`
/// is set, other products are ignored.
pub fn scan_folder(folder: &Path, filter: Option<Product>) -> Result<ScanResult, BatchError> {
    if !folder.is_dir() {
        return Err(BatchError::Scan {
            path: folder.to_path_buf(),
            message: "not a readable directory".to_string(),
        });
    }
    let mut result = ScanResult::default();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "Unreadable entry, skipping");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !is_grid_file(path) {
            continue;
        }

        let Some(source) = SourceFile::from_path(path) else {
            warn!(file = %path.display(), "Unknown product, skipping");
            result.skipped.push(path.to_path_buf());
            continue;
        };

        if filter.is_some_and(|p| p != source.product) {
            continue;
        }

        result.groups.entry(source.product).or_default().push(source);
    }

    for files in result.groups.values_mut() {
        files.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.path.cmp(&b.path)));
    }

    debug!(
        folder = %folder.display(),
        files = result.total_files(),
        skipped = result.skipped.len(),
        "Scanned folder"
    );
    Ok(result)
}

/// Everything a worker needs to convert one granule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionJob {
    pub source: SourceFile,
    pub id: String,
    pub variable: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub out_root: PathBuf,
}

impl ConversionJob {
    /// Job for `source` with its product's catalog settings.
    pub fn from_source(source: SourceFile, out_root: &Path) -> Self {
        let definition = source.product.definition();
        Self {
            id: definition.id.to_string(),
            variable: definition.variable.map(str::to_string),
            min: definition.min,
            max: definition.max,
            out_root: out_root.to_path_buf(),
            source,
        }
    }

    /// Jobs for every file of a scan, in catalog then date order.
    pub fn from_scan(scan: &ScanResult, out_root: &Path) -> Vec<Self> {
        scan.groups
            .values()
            .flatten()
            .cloned()
            .map(|source| Self::from_source(source, out_root))
            .collect()
    }

    /// Arguments of the `convert` subcommand for this job.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "convert".into(),
            "--in".into(),
            self.source.path.clone().into(),
            "--id".into(),
            self.id.clone().into(),
            "--date".into(),
            format_date(self.source.date).into(),
            "--out".into(),
            self.out_root.clone().into(),
        ];
        if let Some(var) = &self.variable {
            args.push("--var".into());
            args.push(var.into());
        }
        if let Some(min) = self.min {
            args.push("--min".into());
            args.push(min.to_string().into());
        }
        if let Some(max) = self.max {
            args.push("--max".into());
            args.push(max.to_string().into());
        }
        args
    }

    pub fn product(&self) -> Product {
        self.source.product
    }

    pub fn date(&self) -> NaiveDate {
        self.source.date
    }
}

/// Converts one granule in isolation.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Run the conversion, returning a human-readable error on failure.
    async fn convert(&self, job: &ConversionJob) -> Result<(), String>;
}

/// Worker that runs the `convert` subcommand of `program` as a child process.
///
/// The child is killed if the conversion future is dropped, which is how
/// deadlines are enforced.
#[derive(Debug, Clone)]
pub struct SubprocessWorker {
    program: PathBuf,
    extra_args: Vec<OsString>,
}

impl SubprocessWorker {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments placed before the subcommand (global flags).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Error text for a failed child: its last non-empty stderr line, or the
/// exit status when it printed nothing.
fn child_error(stderr: &[u8], status: ExitStatus) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Converter exited with {}", status))
}

#[async_trait]
impl Worker for SubprocessWorker {
    async fn convert(&self, job: &ConversionJob) -> Result<(), String> {
        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(job.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("Failed to start {}: {}", self.program.display(), e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(child_error(&output.stderr, output.status))
        }
    }
}

/// Fan-out settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum concurrent conversions
    pub workers: usize,
    /// Deadline for a single conversion
    pub timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Result of one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: ConversionJob,
    pub result: Result<(), String>,
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Failure message cut to [`ERROR_SNIPPET_LEN`] characters.
    pub fn error_snippet(&self) -> Option<String> {
        self.result
            .as_ref()
            .err()
            .map(|e| truncate_error(e, ERROR_SNIPPET_LEN))
    }
}

/// Outcomes of a batch in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Dates converted successfully, per product.
    pub fn successful_dates(&self) -> BTreeMap<Product, BTreeSet<NaiveDate>> {
        let mut dates: BTreeMap<Product, BTreeSet<NaiveDate>> = BTreeMap::new();
        for outcome in self.outcomes.iter().filter(|o| o.succeeded()) {
            dates
                .entry(outcome.job.product())
                .or_default()
                .insert(outcome.job.date());
        }
        dates
    }
}

/// First `max_chars` characters of `message`.
pub fn truncate_error(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}

async fn run_job<W>(worker: &W, job: ConversionJob, timeout: Duration) -> JobOutcome
where
    W: Worker + ?Sized,
{
    let started = Instant::now();
    let result = match tokio::time::timeout(timeout, worker.convert(&job)).await {
        Ok(result) => result,
        Err(_) => Err(format!("Timed out after {}s", timeout.as_secs())),
    };

    let elapsed = started.elapsed();
    match &result {
        Ok(()) => debug!(
            file = %job.source.path.display(),
            elapsed_ms = elapsed.as_millis(),
            "Conversion succeeded"
        ),
        Err(e) => warn!(
            file = %job.source.path.display(),
            error = %e,
            "Conversion failed"
        ),
    }

    JobOutcome {
        job,
        result,
        elapsed,
    }
}

/// Run every job on `worker`.
///
/// At most `opts.workers` conversions run at once. `on_outcome` is called as
/// each job finishes with its 1-based completion index and the total.
#[instrument(skip_all, fields(jobs = jobs.len(), workers = opts.workers))]
pub async fn run_batch<W, F>(
    jobs: Vec<ConversionJob>,
    worker: &W,
    opts: &BatchOptions,
    mut on_outcome: F,
) -> BatchReport
where
    W: Worker + ?Sized,
    F: FnMut(usize, usize, &JobOutcome),
{
    let total = jobs.len();
    let workers = opts.workers.max(1);
    let timeout = opts.timeout;

    let mut outcomes = stream::iter(jobs)
        .map(|job| run_job(worker, job, timeout))
        .buffer_unordered(workers);
    let mut report = BatchReport {
        outcomes: Vec::with_capacity(total),
    };

    while let Some(outcome) = outcomes.next().await {
        on_outcome(report.outcomes.len() + 1, total, &outcome);
        report.outcomes.push(outcome);
    }

    info!(
        total,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(product: Product, doy: u32) -> ConversionJob {
        let date = NaiveDate::from_yo_opt(2025, doy).unwrap();
        let source = SourceFile {
            path: PathBuf::from(format!("/data/{}.A2025{:03}.hdf", product, doy)),
            product,
            date,
        };
        ConversionJob::from_source(source, Path::new("/out"))
    }

    #[test]
    fn test_job_args_include_catalog_settings() {
        let args = job(Product::ModisSnow, 213).to_args();
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "convert",
                "--in",
                "/data/modis_snow.A2025213.hdf",
                "--id",
                "modis_snow",
                "--date",
                "2025-08-01",
                "--out",
                "/out",
                "--var",
                "MOD_Grid_Snow_5km/Data Fields/NDSI_Snow_Cover",
                "--min",
                "0",
                "--max",
                "100",
            ]
        );
    }

    #[test]
    fn test_job_args_omit_unset_options() {
        let args = job(Product::ViirsNdvi, 213).to_args();
        assert_eq!(args.len(), 9);
        assert!(!args.iter().any(|a| a == "--var" || a == "--min" || a == "--max"));
    }

    #[test]
    fn test_truncate_error() {
        let long = "x".repeat(250);
        assert_eq!(truncate_error(&long, ERROR_SNIPPET_LEN).len(), 100);
        assert_eq!(truncate_error("short", ERROR_SNIPPET_LEN), "short");
        assert_eq!(truncate_error("ééé", 2), "éé");
    }

    #[cfg(unix)]
    #[test]
    fn test_child_error_prefers_last_stderr_line() {
        use std::os::unix::process::ExitStatusExt;
        let status = ExitStatus::from_raw(256);
        assert_eq!(
            child_error(b"WARN something\nError: No datasets found\n\n", status),
            "Error: No datasets found"
        );
        assert!(child_error(b"", status).starts_with("Converter exited with"));
    }

    #[test]
    fn test_successful_dates() {
        let report = BatchReport {
            outcomes: vec![
                JobOutcome {
                    job: job(Product::ModisLst, 182),
                    result: Ok(()),
                    elapsed: Duration::ZERO,
                },
                JobOutcome {
                    job: job(Product::ModisLst, 213),
                    result: Err("boom".to_string()),
                    elapsed: Duration::ZERO,
                },
                JobOutcome {
                    job: job(Product::ModisSnow, 1),
                    result: Err("boom".to_string()),
                    elapsed: Duration::ZERO,
                },
            ],
        };

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        let dates = report.successful_dates();
        assert_eq!(dates.len(), 1);
        assert_eq!(
            dates[&Product::ModisLst].iter().copied().collect::<Vec<_>>(),
            vec![NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()]
        );
    }
}
