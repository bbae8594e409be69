//! Fit a compiled model to a measurement.
//!
//! Given:
//! - a [`CompiledModel`] (model variant + frozen parameter snapshot)
//! - a [`Measurement`] (force, distance, optional σ)
//! - a [`SolverConfig`]
//!
//! we:
//! - check the preconditions before touching the solver
//! - build the weighted residual `rᵢ = (yᵢ − f(xᵢ; p)) / σᵢ` on the model's
//!   own axes
//! - minimise `Σ rᵢ²` with Levenberg-Marquardt in bound-transformed
//!   coordinates
//! - package best-fit values, standard errors, correlations and statistics
//!   into an immutable [`FitResult`]

use std::cell::Cell;
use std::sync::Arc;

use levenberg_marquardt::LevenbergMarquardt;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::{Axis, Measurement, min_max};
use crate::error::FitError;
use crate::fit::problem::{ProblemData, WlcProblem};
use crate::fit::FitObserver;
use crate::math::{correlation, normal_inverse};
use crate::models::ForceExtensionModel;
use crate::params::{Bound, CompiledModel, deserialize_lower, deserialize_upper, serialize_bound};
use crate::report::GoodnessOfFit;

/// MINPACK's default tolerance, `sqrt(f64::EPSILON)`.
pub const DEFAULT_TOL: f64 = 1.490_116_119_384_765_6e-8;

/// Minimisation algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Levenberg-Marquardt (MINPACK `lmder` semantics).
    #[default]
    LeastSq,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::LeastSq => "leastsq",
        }
    }
}

/// Convergence controls for one fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub method: Method,
    /// Relative reduction of the sum of squares below which the solver stops.
    pub ftol: f64,
    /// Relative change of the parameters below which the solver stops.
    pub xtol: f64,
    /// Orthogonality of residuals and Jacobian columns below which the solver stops.
    pub gtol: f64,
    /// Caps solver iterations; the solver gives up after
    /// `max_iters·(n_free + 1)` residual evaluations.
    pub max_iters: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: Method::LeastSq,
            ftol: DEFAULT_TOL,
            xtol: DEFAULT_TOL,
            gtol: 0.0,
            max_iters: 200,
        }
    }
}

impl SolverConfig {
    /// `min_delta` and `max_iters` as named by the programmatic surface.
    pub fn new(min_delta: f64, max_iters: usize) -> Self {
        Self {
            ftol: min_delta,
            max_iters,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), FitError> {
        if self.max_iters == 0 {
            return Err(FitError::precondition("max_iters must be at least 1"));
        }
        for (name, tol) in [("ftol", self.ftol), ("xtol", self.xtol), ("gtol", self.gtol)] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(FitError::precondition(format!(
                    "{name} must be finite and >= 0 (got {tol})"
                )));
            }
        }
        Ok(())
    }
}

/// One parameter after a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParameter {
    pub name: String,
    pub value: f64,
    pub init: f64,
    /// `None` for fixed parameters or when the covariance is unavailable.
    pub stderr: Option<f64>,
    pub vary: bool,
    #[serde(serialize_with = "serialize_bound", deserialize_with = "deserialize_lower")]
    pub min: f64,
    #[serde(serialize_with = "serialize_bound", deserialize_with = "deserialize_upper")]
    pub max: f64,
    pub units: String,
}

impl FittedParameter {
    /// `true` when the value sits on (or numerically at) one of its bounds.
    ///
    /// The bound transforms only approach a bound asymptotically, so "at" means
    /// within a millionth of the allowed range.
    pub fn at_bound(&self) -> bool {
        let span = self.max - self.min;
        let tol = if span.is_finite() {
            1e-6 * span
        } else {
            1e-6 * self.value.abs().max(1.0)
        };
        self.value - self.min <= tol || self.max - self.value <= tol
    }
}

/// Outcome of one fit. Immutable once produced.
#[derive(Debug, Clone)]
pub struct FitResult {
    model: Arc<dyn ForceExtensionModel>,
    pub method: Method,
    pub params: Vec<FittedParameter>,
    /// Names of the free parameters, in covariance row order.
    pub var_names: Vec<String>,
    pub covariance: Option<DMatrix<f64>>,
    pub correlation: Option<DMatrix<f64>>,
    pub nfev: usize,
    pub stats: GoodnessOfFit,
    pub converged: bool,
    pub message: String,
    /// Weighted residuals at the best fit.
    pub residual: Vec<f64>,
    /// Model response at the measured independent values.
    pub best_fit: Vec<f64>,
}

impl FitResult {
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    pub fn independent(&self) -> Axis {
        self.model.independent()
    }

    pub fn response(&self) -> Axis {
        self.model.response()
    }

    pub fn get(&self, name: &str) -> Option<&FittedParameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Best-fit value of `name`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(|p| p.value)
    }

    /// All best-fit values in declaration order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    /// Re-evaluate the model at the best-fit values.
    pub fn curve(&self, x: &[f64]) -> Result<Vec<f64>, FitError> {
        Ok(self.model.evaluate(x, &self.values())?)
    }

    /// `n` evenly spaced model points spanning the data's independent range,
    /// as `(distance, force)` pairs.
    ///
    /// Force grids start at the smallest positive measured force so that
    /// models singular at `F = 0` stay in their domain.
    pub fn sample_curve(&self, data: &Measurement, n: usize) -> Result<Vec<(f64, f64)>, FitError> {
        let independent = self.independent();
        let values = data.axis(independent);
        let range = match independent {
            Axis::Force => {
                let positive: Vec<f64> = values.iter().copied().filter(|&f| f > 0.0).collect();
                min_max(&positive)
            }
            Axis::Distance => min_max(values),
        };
        let (lo, hi) = range.ok_or_else(|| {
            FitError::precondition(format!("no usable {} values to sample", independent.label()))
        })?;

        let n = n.max(2);
        let x: Vec<f64> = (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n as f64 - 1.0))
            .collect();
        let y = self.curve(&x)?;
        Ok(match independent {
            Axis::Force => y.into_iter().zip(x).collect(),
            Axis::Distance => x.into_iter().zip(y).collect(),
        })
    }

    /// Correlation between two free parameters.
    pub fn correl(&self, a: &str, b: &str) -> Option<f64> {
        let corr = self.correlation.as_ref()?;
        let i = self.var_names.iter().position(|n| n == a)?;
        let j = self.var_names.iter().position(|n| n == b)?;
        Some(corr[(i, j)])
    }
}

/// Run one fit. `observer` only sees progress; it never alters the result.
pub fn fit(
    model: &CompiledModel,
    data: &Measurement,
    config: &SolverConfig,
    observer: Option<&dyn FitObserver>,
) -> Result<FitResult, FitError> {
    config.validate()?;
    check_measurement(data)?;

    let variant = model.model();
    let params = model.params();
    let free = params.free_indices();
    if free.is_empty() {
        return Err(FitError::precondition("no free parameters to fit"));
    }
    if data.len() < free.len() {
        return Err(FitError::precondition(format!(
            "{} data points are fewer than the {} free parameters",
            data.len(),
            free.len()
        )));
    }

    let x = data.axis(variant.independent());
    let y = data.axis(variant.response());
    let weights: Vec<f64> = (0..data.len()).map(|i| 1.0 / data.sigma_at(i)).collect();
    let bounds: Vec<Bound> = free
        .iter()
        .map(|&i| Bound::new(params[i].min, params[i].max))
        .collect();

    // Fail on domain errors at the starting point before the solver runs.
    let start = params.values();
    variant.evaluate(x, &start)?;

    log::debug!(
        "fitting '{}' to {} points ({} free: {})",
        variant.name(),
        data.len(),
        free.len(),
        free.iter()
            .map(|&i| params[i].name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let evaluations = Cell::new(0);
    let problem_data = ProblemData {
        model: &**variant,
        x,
        y,
        weights: &weights,
        free: &free,
        bounds: &bounds,
        evaluations: &evaluations,
        observer,
    };
    let problem = WlcProblem::new(&problem_data, start);

    let solver = match config.method {
        Method::LeastSq => LevenbergMarquardt::new()
            .with_ftol(config.ftol)
            .with_xtol(config.xtol)
            .with_gtol(config.gtol)
            .with_patience(config.max_iters),
    };
    let (mut problem, report) = solver.minimize(problem);
    problem.restore_best();

    let Some(residual) = problem.residual_vector().map(|r| r.iter().cloned().collect::<Vec<f64>>())
    else {
        // Unreachable in practice: the starting point was evaluated successfully.
        return Err(FitError::precondition("model could not be evaluated at any point"));
    };
    let converged = report.termination.was_successful();
    let message = format!("{:?}", report.termination);
    let nfev = report.number_of_evaluations;

    if let Some(observer) = observer {
        observer.on_finish(nfev, converged);
    }
    if !converged {
        log::warn!("fit of '{}' did not converge: {message}", variant.name());
    }

    let stats = GoodnessOfFit::compute(&residual, y, &weights, free.len());
    let external = problem.external().to_vec();
    let best_fit = variant.evaluate(x, &external)?;

    let covariance = problem_covariance(&problem, stats.redchi);
    let correlation = covariance.as_ref().and_then(correlation);

    let mut fitted: Vec<FittedParameter> = params
        .iter()
        .zip(&external)
        .map(|(p, &value)| FittedParameter {
            name: p.name.clone(),
            value,
            init: p.init,
            stderr: None,
            vary: p.vary,
            min: p.min,
            max: p.max,
            units: p.units.clone(),
        })
        .collect();
    if let Some(cov) = &covariance {
        for (k, &idx) in free.iter().enumerate() {
            let var = cov[(k, k)];
            fitted[idx].stderr = (var >= 0.0 && var.is_finite()).then(|| var.sqrt());
        }
    }

    for p in fitted.iter().filter(|p| p.vary && p.at_bound()) {
        log::warn!("parameter '{}' = {} is at its bound [{}, {}]", p.name, p.value, p.min, p.max);
    }

    Ok(FitResult {
        model: Arc::clone(variant),
        method: config.method,
        var_names: free.iter().map(|&i| params[i].name.clone()).collect(),
        params: fitted,
        covariance,
        correlation,
        nfev,
        stats,
        converged,
        message,
        residual,
        best_fit,
    })
}

/// `G·(JᵀJ)⁻¹·G·redchi` with `G = diag(dp/du)`.
fn problem_covariance(problem: &WlcProblem<'_>, redchi: f64) -> Option<DMatrix<f64>> {
    use levenberg_marquardt::LeastSquaresProblem;

    let jac = problem.jacobian()?;
    let inverse = normal_inverse(&jac)?;
    let chain = problem.transform_derivatives();
    let n = chain.len();
    Some(DMatrix::from_fn(n, n, |i, j| {
        chain[i] * inverse[(i, j)] * chain[j] * redchi
    }))
}

fn check_measurement(data: &Measurement) -> Result<(), FitError> {
    let n = data.force.len();
    if data.distance.len() != n {
        return Err(FitError::precondition(format!(
            "force has {n} values but distance has {}",
            data.distance.len()
        )));
    }
    if n == 0 {
        return Err(FitError::precondition("measurement is empty"));
    }
    for (label, values) in [("force", &data.force), ("distance", &data.distance)] {
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(FitError::precondition(format!(
                "{label}[{i}] is not finite ({})",
                values[i]
            )));
        }
    }
    if let Some(sigma) = &data.sigma {
        if sigma.len() != n {
            return Err(FitError::precondition(format!(
                "sigma has {} values but the measurement has {n}",
                sigma.len()
            )));
        }
        if let Some(i) = sigma.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(FitError::precondition(format!(
                "sigma[{i}] must be finite and > 0 (got {})",
                sigma[i]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::thermal_energy;
    use crate::models::lookup;
    use crate::params::{Overrides, ParamOverride, compile};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const LC: f64 = 5576.19;
    const LP: f64 = 60.04;
    const S: f64 = 1073.45;
    const KBT: f64 = 4.185289;

    fn odijk_data(n: usize, noise: f64, seed: u64) -> Measurement {
        let model = lookup("odijk").unwrap();
        let force: Vec<f64> = (0..n).map(|i| 1.0 + 49.0 * i as f64 / (n - 1) as f64).collect();
        let mut distance = model.evaluate(&force, &[KBT, LC, LP, S]).unwrap();
        if noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(seed);
            let normal = Normal::new(0.0, noise).unwrap();
            for d in &mut distance {
                *d += normal.sample(&mut rng);
            }
        }
        Measurement::new(force, distance)
    }

    fn compiled_odijk() -> CompiledModel {
        let overrides = Overrides::new().set(KBT_NAME, ParamOverride::value(KBT));
        compile(lookup("odijk").unwrap(), &overrides).unwrap()
    }

    const KBT_NAME: &str = crate::params::KBT;

    #[test]
    fn recovers_parameters_from_noise_free_data() {
        let data = odijk_data(200, 0.0, 0);
        let result = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();
        assert!(result.converged, "{}", result.message);
        for (name, truth) in [("Lc", LC), ("Lp", LP), ("S", S)] {
            let got = result.value(name).unwrap();
            assert!(((got - truth) / truth).abs() < 1e-4, "{name}: {got} vs {truth}");
        }
        assert!(result.stats.chisqr < 1e-10);
    }

    #[test]
    fn recovers_parameters_within_standard_errors() {
        let data = odijk_data(1000, 0.01, 42);
        let result = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();
        assert!(result.converged, "{}", result.message);
        assert_eq!(result.stats.nvarys, 3);
        assert_eq!(result.stats.ndata, 1000);
        assert_eq!(result.stats.nfree, 997);
        for (name, truth) in [("Lc", LC), ("Lp", LP), ("S", S)] {
            let p = result.get(name).unwrap();
            let stderr = p.stderr.expect("stderr available");
            assert!(stderr > 0.0);
            assert!((p.value - truth).abs() <= 4.0 * stderr, "{name}: {} +/- {stderr} vs {truth}", p.value);
        }
        assert!(result.stats.rsquared > 0.99);
        assert_eq!(result.best_fit.len(), 1000);
    }

    #[test]
    fn fixed_parameters_are_untouched() {
        let data = odijk_data(100, 0.005, 3);
        let result = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();
        let kbt = result.get(KBT_NAME).unwrap();
        assert_eq!(kbt.value, KBT);
        assert!(!kbt.vary);
        assert!(kbt.stderr.is_none());
        assert!(result.var_names.iter().all(|n| n != KBT_NAME));
    }

    #[test]
    fn fitted_values_respect_bounds() {
        let overrides = Overrides::new()
            .set(KBT_NAME, ParamOverride::value(KBT))
            .set("Lp", ParamOverride::value(30.0).bounds(10.0, 40.0));
        let model = compile(lookup("odijk").unwrap(), &overrides).unwrap();
        let result = fit(&model, &odijk_data(200, 0.0, 0), &SolverConfig::default(), None).unwrap();
        let lp = result.get("Lp").unwrap();
        assert!(lp.value >= 10.0 && lp.value <= 40.0);
    }

    #[test]
    fn compiled_snapshot_is_not_mutated() {
        let model = compiled_odijk();
        let before = model.params().clone();
        let _ = fit(&model, &odijk_data(50, 0.0, 0), &SolverConfig::default(), None).unwrap();
        assert_eq!(model.params(), &before);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let data = Measurement::new(vec![1.0, 2.0, 3.0], vec![1.0, 2.0]);
        let err = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap_err();
        assert!(matches!(err, FitError::Precondition(_)));
    }

    #[test]
    fn rejects_empty_data() {
        let data = Measurement::new(vec![], vec![]);
        assert!(matches!(
            fit(&compiled_odijk(), &data, &SolverConfig::default(), None),
            Err(FitError::Precondition(_))
        ));
    }

    #[test]
    fn rejects_too_few_points() {
        let data = odijk_data(2, 0.0, 0);
        match fit(&compiled_odijk(), &data, &SolverConfig::default(), None) {
            Err(FitError::Precondition(msg)) => assert!(msg.contains("fewer")),
            other => panic!("expected Precondition, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_free_parameters() {
        let overrides = ["Lc", "Lp", "S"]
            .into_iter()
            .fold(Overrides::new(), |o, name| o.set(name, ParamOverride::default().vary(false)));
        let model = compile(lookup("odijk").unwrap(), &overrides).unwrap();
        assert!(matches!(
            fit(&model, &odijk_data(20, 0.0, 0), &SolverConfig::default(), None),
            Err(FitError::Precondition(_))
        ));
    }

    #[test]
    fn rejects_bad_sigma_and_settings() {
        let data = odijk_data(10, 0.0, 0).with_sigma(vec![0.0; 10]);
        assert!(matches!(
            fit(&compiled_odijk(), &data, &SolverConfig::default(), None),
            Err(FitError::Precondition(_))
        ));

        let config = SolverConfig::new(1e-8, 0);
        assert!(matches!(
            fit(&compiled_odijk(), &odijk_data(10, 0.0, 0), &config, None),
            Err(FitError::Precondition(_))
        ));

        let config = SolverConfig::new(-1.0, 10);
        assert!(matches!(
            fit(&compiled_odijk(), &odijk_data(10, 0.0, 0), &config, None),
            Err(FitError::Precondition(_))
        ));
    }

    #[test]
    fn domain_error_at_start_is_reported() {
        let mut data = odijk_data(10, 0.0, 0);
        data.force[4] = 0.0;
        assert!(matches!(
            fit(&compiled_odijk(), &data, &SolverConfig::default(), None),
            Err(FitError::Model(_))
        ));
    }

    #[test]
    fn exhausted_iterations_are_flagged_not_failed() {
        let data = odijk_data(200, 0.01, 7);
        let config = SolverConfig::new(DEFAULT_TOL, 1);
        let result = fit(&compiled_odijk(), &data, &config, None).unwrap();
        assert!(!result.converged);
        assert!(!result.message.is_empty());
    }

    #[test]
    fn sigma_rescaling_keeps_estimates_and_rsquared() {
        let data = odijk_data(300, 0.01, 11).with_sigma(vec![0.01; 300]);
        let a = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();
        let b = fit(&compiled_odijk(), &data.scaled_sigma(10.0), &SolverConfig::default(), None).unwrap();

        approx::assert_relative_eq!(a.stats.rsquared, b.stats.rsquared, max_relative = 1e-6);
        for name in ["Lc", "Lp", "S"] {
            approx::assert_relative_eq!(a.value(name).unwrap(), b.value(name).unwrap(), max_relative = 1e-5);
            approx::assert_relative_eq!(
                a.get(name).unwrap().stderr.unwrap(),
                b.get(name).unwrap().stderr.unwrap(),
                max_relative = 1e-3
            );
        }
        approx::assert_relative_eq!(a.stats.chisqr / b.stats.chisqr, 100.0, max_relative = 1e-4);
        approx::assert_relative_eq!(a.stats.redchi / b.stats.redchi, 100.0, max_relative = 1e-4);
    }

    #[test]
    fn fits_marko_siggia_on_distance_axis() {
        let model = lookup("WLC").unwrap();
        let truth = [thermal_energy(25.0), 3000.0, 45.0];
        let distance: Vec<f64> = (1..=80).map(|i| 2.4 * i as f64 / 80.0).collect();
        let force = model.evaluate(&distance, &truth).unwrap();
        let overrides = Overrides::new().set("Lc", ParamOverride::value(3500.0));
        let compiled = compile(model, &overrides).unwrap();
        let result = fit(&compiled, &Measurement::new(force, distance), &SolverConfig::default(), None).unwrap();
        assert!(result.converged, "{}", result.message);
        approx::assert_relative_eq!(result.value("Lc").unwrap(), 3000.0, max_relative = 1e-4);
        approx::assert_relative_eq!(result.value("Lp").unwrap(), 45.0, max_relative = 1e-4);
    }

    #[test]
    fn marko_siggia_fits_near_full_extension_from_any_start() {
        let truth_lc = 3000.0;
        let distance: Vec<f64> = (1..=60).map(|i| 0.96 * truth_lc / 1000.0 * i as f64 / 60.0).collect();
        for name in ["WLC", "bouchiat"] {
            let model = lookup(name).unwrap();
            let force = model.evaluate(&distance, &[thermal_energy(25.0), truth_lc, 45.0]).unwrap();
            let data = Measurement::new(force, distance.clone());
            for init in [3500.0, 5000.0, 8000.0] {
                let overrides = Overrides::new().set("Lc", ParamOverride::value(init));
                let compiled = compile(model.clone(), &overrides).unwrap();
                let result = fit(&compiled, &data, &SolverConfig::default(), None).unwrap();
                assert!(result.converged, "{name} from Lc = {init}: {}", result.message);
                approx::assert_relative_eq!(result.value("Lc").unwrap(), truth_lc, max_relative = 1e-4);
                approx::assert_relative_eq!(result.value("Lp").unwrap(), 45.0, max_relative = 1e-3);
            }
        }
    }

    #[test]
    fn start_on_a_bound_still_finds_the_optimum() {
        let overrides = Overrides::new()
            .set(KBT_NAME, ParamOverride::value(KBT))
            .set("Lp", ParamOverride::value(1.0));
        let model = compile(lookup("odijk").unwrap(), &overrides).unwrap();
        assert_eq!(model.params().get("Lp").unwrap().min, 1.0);

        let result = fit(&model, &odijk_data(200, 0.0, 0), &SolverConfig::default(), None).unwrap();
        assert!(result.converged, "{}", result.message);
        approx::assert_relative_eq!(result.value("Lp").unwrap(), LP, max_relative = 1e-4);
        assert!(result.stats.chisqr < 1e-10);
        assert_eq!(result.get("Lp").unwrap().init, 1.0);
    }

    #[derive(Default)]
    struct Recorder {
        evaluations: AtomicUsize,
        finished: AtomicBool,
    }

    impl FitObserver for Recorder {
        fn on_evaluation(&self, evaluations: usize, _chisqr: f64) {
            self.evaluations.store(evaluations, Ordering::SeqCst);
        }

        fn on_finish(&self, _evaluations: usize, _converged: bool) {
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn observer_sees_progress_without_changing_numbers() {
        let data = odijk_data(150, 0.01, 5);
        let recorder = Recorder::default();
        let watched = fit(&compiled_odijk(), &data, &SolverConfig::default(), Some(&recorder)).unwrap();
        let quiet = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();

        assert!(recorder.evaluations.load(Ordering::SeqCst) > 0);
        assert!(recorder.finished.load(Ordering::SeqCst));
        assert_eq!(watched.values(), quiet.values());
        assert_eq!(watched.nfev, quiet.nfev);
    }

    #[test]
    fn correlations_are_symmetric() {
        let result = fit(&compiled_odijk(), &odijk_data(300, 0.01, 9), &SolverConfig::default(), None).unwrap();
        let c = result.correl("Lc", "S").unwrap();
        assert_eq!(Some(c), result.correl("S", "Lc"));
        assert!(c.abs() <= 1.0);
        assert_eq!(result.correl("Lc", "Lc"), Some(1.0));
        assert!(result.correl("kBT", "Lc").is_none());
    }

    #[test]
    fn sampled_curve_spans_the_force_range() {
        let data = odijk_data(50, 0.0, 0);
        let result = fit(&compiled_odijk(), &data, &SolverConfig::default(), None).unwrap();
        let curve = result.sample_curve(&data, 11).unwrap();
        assert_eq!(curve.len(), 11);
        assert_eq!(curve[0].1, 1.0);
        assert_eq!(curve[10].1, 50.0);
        assert!(curve.windows(2).all(|w| w[1].0 > w[0].0));
    }
}
