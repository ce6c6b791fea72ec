//! Single-granule conversion.
//!
//! read -> decode -> resample -> normalize/colorize -> write. Each call is
//! independent; nothing is shared between conversions.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use grid_reader::select::{match_exact, match_suffix};
use grid_reader::{select_variable, GridReadError, GridSource, RawGrid};
use overlay_common::{Product, ProductDefinition, GENERIC_PRODUCT};
use renderer::colormap::{normalization_bounds, render_rgba};
use renderer::{create_png, resample_masked};

use crate::decode::decode;
use crate::error::{ConvertError, ConvertResult};
use crate::writer::{overlay_dir, write_overlay, OverlayMeta};

/// Inputs to one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// Variable to read; resolved from the product's candidates when unset
    pub variable: Option<String>,
    /// Overlay id override
    pub id: Option<String>,
    pub date: NaiveDate,
    pub out_root: PathBuf,
    pub width: usize,
    pub height: usize,
    /// Explicit normalization bounds; percentiles are used when unset
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// What a conversion produced.
#[derive(Debug, Clone)]
pub struct ConvertSummary {
    pub id: String,
    pub variable: String,
    pub out_dir: PathBuf,
    pub min: f64,
    pub max: f64,
    /// Fraction of output cells with no data
    pub nan_fraction: f64,
}

/// Product definition for a conversion.
///
/// The filename wins; otherwise an `--id` naming a catalog product; otherwise
/// the generic definition.
pub fn resolve_definition(input: &Path, id: Option<&str>) -> &'static ProductDefinition {
    let filename = input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    Product::from_filename(filename)
        .or_else(|| id.and_then(|id| id.parse::<Product>().ok()))
        .map(|p| p.definition())
        .unwrap_or(&GENERIC_PRODUCT)
}

/// Read the requested variable, or resolve one from `candidates`.
///
/// An explicit name that is not present verbatim is matched against the
/// file's variables by exact and leaf-suffix comparison before giving up,
/// since HDF4 lists datasets by bare name.
fn read_grid(
    source: &dyn GridSource,
    input: &Path,
    variable: Option<&str>,
    candidates: &[&str],
) -> ConvertResult<(String, RawGrid)> {
    if let Some(name) = variable {
        match source.read_variable(name) {
            Ok(raw) => return Ok((name.to_string(), raw)),
            Err(GridReadError::VariableNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let available = source.list_variables()?;
        if available.is_empty() {
            return Err(ConvertError::NoVariables(input.to_path_buf()));
        }
        let resolved = match_exact(&[name], &available)
            .or_else(|| match_suffix(&[name], &available))
            .ok_or_else(|| GridReadError::VariableNotFound(name.to_string()))?;
        warn!(requested = %name, resolved = %resolved, "Variable not found verbatim");
        let raw = source.read_variable(&resolved)?;
        return Ok((resolved, raw));
    }

    let available = source.list_variables()?;
    let selection = select_variable(candidates, &available)
        .ok_or_else(|| ConvertError::NoVariables(input.to_path_buf()))?;
    info!(
        variable = %selection.name,
        strategy = %selection.strategy,
        "Selected variable"
    );
    let raw = source.read_variable(&selection.name)?;
    Ok((selection.name, raw))
}

/// Convert a granule already opened as `source`.
#[instrument(skip(source, opts), fields(input = %opts.input.display(), date = %opts.date))]
pub fn convert_source(source: &dyn GridSource, opts: &ConvertOptions) -> ConvertResult<ConvertSummary> {
    let definition = resolve_definition(&opts.input, opts.id.as_deref());
    let id = opts.id.clone().unwrap_or_else(|| definition.id.to_string());

    let (variable, raw) = read_grid(
        source,
        &opts.input,
        opts.variable.as_deref(),
        definition.candidates,
    )?;

    let grid = decode(&raw)?;
    let resampled = resample_masked(&grid, opts.width, opts.height)?;
    let (min, max) = normalization_bounds(&resampled.data, opts.min, opts.max);

    let rgba = render_rgba(&resampled, min, max);
    let png = create_png(&rgba, resampled.width, resampled.height)?;

    let out_dir = overlay_dir(&opts.out_root, &id, opts.date);
    let meta = OverlayMeta::new(
        &id,
        definition.name,
        definition.units,
        opts.date,
        resampled.width,
        resampled.height,
        min,
        max,
    );
    write_overlay(&out_dir, &png, &resampled, &meta)?;

    let nan_fraction = resampled.nan_fraction();
    info!(
        id = %id,
        variable = %variable,
        min,
        max,
        nan_fraction,
        "Converted granule"
    );

    Ok(ConvertSummary {
        id,
        variable,
        out_dir,
        min,
        max,
        nan_fraction,
    })
}

/// Open `opts.input` and convert it.
pub fn convert(opts: &ConvertOptions) -> ConvertResult<ConvertSummary> {
    let source = grid_reader::open(&opts.input)?;
    convert_source(source.as_ref(), opts)
}
