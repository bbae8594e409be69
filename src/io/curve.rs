//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted curve:
//! - model name + fitted parameters (with stderr and bounds)
//! - fit statistics
//! - a precomputed grid for quick plotting

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Measurement;
use crate::error::AppError;
use crate::fit::{FitResult, FittedParameter};
use crate::report::GoodnessOfFit;

/// Grid points written to curve files.
pub const GRID_POINTS: usize = 101;

/// Sampled model curve, always as distance/force pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    pub distance_um: Vec<f64>,
    pub force_pn: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub converged: bool,
    pub params: Vec<FittedParameter>,
    pub stats: GoodnessOfFit,
    pub grid: CurveGrid,
}

impl CurveFile {
    pub fn from_fit(result: &FitResult, data: &Measurement) -> Result<Self, AppError> {
        let points = result.sample_curve(data, GRID_POINTS)?;
        let (distance_um, force_pn) = points.into_iter().unzip();
        Ok(Self {
            tool: "wlc".to_string(),
            created_at: Utc::now(),
            model: result.model_name().to_string(),
            converged: result.converged,
            params: result.params.clone(),
            stats: result.stats,
            grid: CurveGrid { distance_um, force_pn },
        })
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, result: &FitResult, data: &Measurement) -> Result<(), AppError> {
    let curve = CurveFile::from_fit(result, data)?;
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("failed to create curve JSON '{}'", path.display()), e))?;
    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::json(format!("failed to write curve JSON '{}'", path.display()), e))?;
    log::info!("wrote curve for '{}' to {}", curve.model, path.display());
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("failed to open curve JSON '{}'", path.display()), e))?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::json(format!("invalid curve JSON '{}'", path.display()), e))?;
    if curve.grid.distance_um.len() != curve.grid.force_pn.len() {
        return Err(AppError::Input(format!(
            "curve JSON '{}': grid columns differ in length ({} vs {})",
            path.display(),
            curve.grid.distance_um.len(),
            curve.grid.force_pn.len()
        )));
    }
    Ok(curve)
}
