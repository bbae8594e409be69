//! Shared domain types.
//!
//! Units are fixed across the crate and never converted implicitly:
//!
//! - force: pN
//! - measured distance (end-to-end extension): µm
//! - model length parameters (`Lc`, `Lp`): nm
//! - thermal energy `kBT`: pN·nm
//! - stretch modulus `S`: pN
//!
//! Models that mix µm and nm document the `NM_PER_UM` factor in their formula.

use serde::{Deserialize, Serialize};

/// Boltzmann constant in pN·nm/K.
pub const KB: f64 = 0.013806;

/// Offset between degrees Celsius and Kelvin.
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// Nanometres per micrometre.
pub const NM_PER_UM: f64 = 1000.0;

/// Thermal energy `kBT` [pN·nm] at a temperature given in °C.
pub fn thermal_energy(temperature_c: f64) -> f64 {
    KB * (ZERO_CELSIUS_K + temperature_c)
}

/// One of the two measured quantities of a force-extension experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Applied force [pN].
    Force,
    /// End-to-end distance [µm].
    Distance,
}

impl Axis {
    pub fn label(self) -> &'static str {
        match self {
            Axis::Force => "force",
            Axis::Distance => "distance",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Axis::Force => "pN",
            Axis::Distance => "um",
        }
    }
}

/// Measured force-extension data.
///
/// `force` and `distance` are parallel arrays; `sigma` is an optional
/// per-point uncertainty on the model's response axis. Length and value
/// checks happen in the fit engine so that construction never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub force: Vec<f64>,
    pub distance: Vec<f64>,
    pub sigma: Option<Vec<f64>>,
}

impl Measurement {
    pub fn new(force: Vec<f64>, distance: Vec<f64>) -> Self {
        Self {
            force,
            distance,
            sigma: None,
        }
    }

    /// Attach per-point uncertainties (same length as the data).
    pub fn with_sigma(mut self, sigma: Vec<f64>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Number of data points (length of the force array).
    pub fn len(&self) -> usize {
        self.force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    /// The values recorded on the given axis.
    pub fn axis(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Force => &self.force,
            Axis::Distance => &self.distance,
        }
    }

    /// Uncertainty of point `i`, defaulting to 1 (unweighted least squares).
    pub fn sigma_at(&self, i: usize) -> f64 {
        self.sigma
            .as_ref()
            .and_then(|s| s.get(i).copied())
            .unwrap_or(1.0)
    }

    /// Copy of this measurement with every uncertainty multiplied by `factor`.
    ///
    /// Points without explicit uncertainty are treated as σ = 1.
    pub fn scaled_sigma(&self, factor: f64) -> Self {
        let sigma = (0..self.len()).map(|i| self.sigma_at(i) * factor).collect();
        Self {
            force: self.force.clone(),
            distance: self.distance.clone(),
            sigma: Some(sigma),
        }
    }
}

/// Summary stats about a measurement (for CLI output).
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_points: usize,
    pub force_min: f64,
    pub force_max: f64,
    pub distance_min: f64,
    pub distance_max: f64,
    pub weighted: bool,
}

impl DatasetStats {
    pub fn from_measurement(data: &Measurement) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let (force_min, force_max) = min_max(&data.force)?;
        let (distance_min, distance_max) = min_max(&data.distance)?;
        Some(Self {
            n_points: data.len(),
            force_min,
            force_max,
            distance_min,
            distance_max,
            weighted: data.sigma.is_some(),
        })
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo.is_finite() && hi.is_finite() {
        Some((lo, hi))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thermal_energy_at_room_temperature() {
        let kbt = thermal_energy(25.0);
        assert!((kbt - 4.116259).abs() < 1e-5, "got {kbt}");
    }

    #[test]
    fn sigma_defaults_to_one() {
        let data = Measurement::new(vec![1.0, 2.0], vec![0.5, 0.6]);
        assert_eq!(data.sigma_at(0), 1.0);
        assert_eq!(data.sigma_at(1), 1.0);

        let scaled = data.scaled_sigma(3.0);
        assert_eq!(scaled.sigma, Some(vec![3.0, 3.0]));
    }

    #[test]
    fn stats_cover_both_axes() {
        let data = Measurement::new(vec![3.0, 1.0, 2.0], vec![0.4, 0.6, 0.5]);
        let stats = DatasetStats::from_measurement(&data).unwrap();
        assert_eq!(stats.n_points, 3);
        assert_eq!((stats.force_min, stats.force_max), (1.0, 3.0));
        assert_eq!((stats.distance_min, stats.distance_max), (0.4, 0.6));
        assert!(!stats.weighted);
    }
}
