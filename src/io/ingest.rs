//! CSV ingest and normalization.
//!
//! This module turns a force-extension CSV into a clean [`Measurement`] that is
//! safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no fitting logic here
//!
//! Recognised headers (case-insensitive):
//!
//! | column   | aliases                 | unit  |
//! |----------|-------------------------|-------|
//! | distance | `d`, `distance_um`      | µm    |
//! | force    | `f`, `force_pn`         | pN    |
//! | sigma    | `uncertainty`, `err`    | response axis units |
//! | weight   | `w` (read as `1/sigma`) |       |

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{DatasetStats, Measurement};
use crate::error::AppError;

const DISTANCE: &[&str] = &["distance", "d", "distance_um"];
const FORCE: &[&str] = &["force", "f", "force_pn"];
const SIGMA: &[&str] = &["sigma", "uncertainty", "err"];
const WEIGHT: &[&str] = &["weight", "w"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the measurement + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: String,
    pub measurement: Measurement,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// How per-point uncertainty is provided, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Uncertainty {
    None,
    Sigma(usize),
    Weight(usize),
}

/// Load a measurement CSV from disk.
pub fn load_measurement(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("failed to open CSV '{}'", path.display()), e))?;
    read_measurement(file, &path.display().to_string())
}

/// Parse a measurement CSV from any reader. `source` labels messages.
pub fn read_measurement<R: Read>(input: R, source: &str) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::csv(format!("failed to read CSV headers of '{source}'"), e))?
        .clone();
    let header_map = build_header_map(&headers);

    let distance_col = find_column(&header_map, DISTANCE).ok_or_else(|| {
        AppError::Input(format!(
            "'{source}': missing required column `distance` (or {})",
            aliases(DISTANCE)
        ))
    })?;
    let force_col = find_column(&header_map, FORCE).ok_or_else(|| {
        AppError::Input(format!(
            "'{source}': missing required column `force` (or {})",
            aliases(FORCE)
        ))
    })?;
    let uncertainty = match (find_column(&header_map, SIGMA), find_column(&header_map, WEIGHT)) {
        (Some(col), weight) => {
            if weight.is_some() {
                log::warn!("'{source}': both sigma and weight columns present, using sigma");
            }
            Uncertainty::Sigma(col)
        }
        (None, Some(col)) => Uncertainty::Weight(col),
        (None, None) => Uncertainty::None,
    };

    let mut force = Vec::new();
    let mut distance = Vec::new();
    let mut sigma = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 2);

        match parse_row(&record, distance_col, force_col, uncertainty) {
            Ok((d, f, s)) => {
                distance.push(d);
                force.push(f);
                if let Some(s) = s {
                    sigma.push(s);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        log::warn!("'{source}' line {}: {} (row skipped)", err.line, err.message);
    }

    let rows_used = force.len();
    if rows_used == 0 {
        return Err(AppError::Input(format!(
            "'{source}': no valid rows ({rows_read} read, {} rejected)",
            row_errors.len()
        )));
    }

    let mut measurement = Measurement::new(force, distance);
    if uncertainty != Uncertainty::None {
        measurement = measurement.with_sigma(sigma);
    }
    let stats = DatasetStats::from_measurement(&measurement)
        .ok_or_else(|| AppError::Input(format!("'{source}': no finite values")))?;

    log::info!(
        "'{source}': {rows_used} of {rows_read} rows used, force [{:.3}, {:.3}] pN, distance [{:.4}, {:.4}] um",
        stats.force_min,
        stats.force_max,
        stats.distance_min,
        stats.distance_max
    );

    Ok(IngestedData {
        source: source.to_string(),
        measurement,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|n| header_map.get(*n).copied())
}

fn aliases(names: &[&str]) -> String {
    names[1..]
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_row(
    record: &StringRecord,
    distance_col: usize,
    force_col: usize,
    uncertainty: Uncertainty,
) -> Result<(f64, f64, Option<f64>), String> {
    let distance = parse_field(record, distance_col, "distance")?;
    let force = parse_field(record, force_col, "force")?;

    let sigma = match uncertainty {
        Uncertainty::None => None,
        Uncertainty::Sigma(col) => {
            let s = parse_field(record, col, "sigma")?;
            if s <= 0.0 {
                return Err(format!("sigma must be > 0 (got {s})"));
            }
            Some(s)
        }
        Uncertainty::Weight(col) => {
            let w = parse_field(record, col, "weight")?;
            if w <= 0.0 {
                return Err(format!("weight must be > 0 (got {w})"));
            }
            Some(1.0 / w)
        }
    };

    Ok((distance, force, sigma))
}

fn parse_field(record: &StringRecord, col: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(col)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing `{name}` value"))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("invalid `{name}` value '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("non-finite `{name}` value '{raw}'"));
    }
    Ok(value)
}
