//! Synthetic force-extension measurements.
//!
//! Distances follow the Odijk model at known parameters with Gaussian noise,
//! so fits can be checked against ground truth.

use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{Measurement, thermal_energy};
use crate::error::AppError;
use crate::models::{ForceExtensionModel, Odijk};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleConfig {
    /// Contour length [nm].
    pub lc: f64,
    /// Persistence length [nm].
    pub lp: f64,
    /// Stretch modulus [pN].
    pub s: f64,
    /// Thermal energy [pN·nm].
    pub kbt: f64,
    /// Standard deviation of the distance noise [µm].
    pub noise: f64,
    pub points: usize,
    pub f_min: f64,
    pub f_max: f64,
    pub seed: u64,
    /// Draw forces uniformly at random instead of on an even grid.
    pub random_forces: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            lc: 5000.0,
            lp: 50.0,
            s: 1000.0,
            kbt: thermal_energy(25.0),
            noise: 0.005,
            points: 200,
            f_min: 1.0,
            f_max: 50.0,
            seed: 7,
            random_forces: false,
        }
    }
}

impl SampleConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.points < 2 {
            return Err(AppError::Input(format!(
                "sample needs at least 2 points (got {})",
                self.points
            )));
        }
        if !(self.f_min.is_finite() && self.f_max.is_finite() && self.f_min > 0.0 && self.f_max > self.f_min) {
            return Err(AppError::Input(format!(
                "invalid force range for sample generation: [{}, {}] (need 0 < f_min < f_max)",
                self.f_min, self.f_max
            )));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(AppError::Input(format!("noise must be finite and >= 0 (got {})", self.noise)));
        }
        Ok(())
    }
}

/// Generate a seeded Odijk measurement. Points carry `sigma = noise` when
/// noise is non-zero.
pub fn generate_sample(config: &SampleConfig) -> Result<Measurement, AppError> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut force: Vec<f64> = if config.random_forces {
        (0..config.points)
            .map(|_| rng.gen_range(config.f_min..=config.f_max))
            .collect()
    } else {
        let step = (config.f_max - config.f_min) / (config.points as f64 - 1.0);
        (0..config.points)
            .map(|i| config.f_min + step * i as f64)
            .collect()
    };
    force.sort_by(f64::total_cmp);

    let params = [config.kbt, config.lc, config.lp, config.s];
    let mut distance = Odijk.evaluate(&force, &params)?;

    if config.noise == 0.0 {
        return Ok(Measurement::new(force, distance));
    }

    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::Input(format!("noise distribution error: {e}")))?;
    for d in &mut distance {
        *d += normal.sample(&mut rng);
    }
    let sigma = vec![config.noise; force.len()];

    log::debug!(
        "generated {} odijk points (Lc={}, Lp={}, S={}, noise={})",
        force.len(),
        config.lc,
        config.lp,
        config.s,
        config.noise
    );
    Ok(Measurement::new(force, distance).with_sigma(sigma))
}

/// Write a measurement as CSV readable by `io::ingest`.
pub fn write_measurement_csv(path: &Path, data: &Measurement) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::csv(format!("failed to create sample CSV '{}'", path.display()), e))?;
    let csv_err = |e| AppError::csv(format!("failed to write sample CSV '{}'", path.display()), e);

    if data.sigma.is_some() {
        writer.write_record(["distance", "force", "sigma"]).map_err(csv_err)?;
    } else {
        writer.write_record(["distance", "force"]).map_err(csv_err)?;
    }
    for i in 0..data.len() {
        let mut row = vec![data.distance[i].to_string(), data.force[i].to_string()];
        if data.sigma.is_some() {
            row.push(data.sigma_at(i).to_string());
        }
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("failed to flush sample CSV '{}'", path.display()), e))?;
    Ok(())
}
