//! Stateful programmatic surface around the fit engine.
//!
//! ```no_run
//! use wlc_fit::domain::Measurement;
//! use wlc_fit::params::Overrides;
//! use wlc_fit::session::WormLikeChain;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = Measurement::new(vec![1.0, 2.0, 5.0, 10.0], vec![4.2, 4.4, 4.6, 4.7]);
//! let mut wlc = WormLikeChain::new("odijk")?;
//! wlc.compile(&Overrides::new().temperature(24.0))?;
//! wlc.fit(&data, 1e-8, 200, false)?;
//! println!("{}", wlc.stats()?);
//! println!("{}", wlc.plot(&data, 80, 20)?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::domain::Measurement;
use crate::error::{CompileError, FitError, ModelError};
use crate::fit::{
    FitObserver, FitResult, ProgressLogger, RefineConfig, RefineRound, SolverConfig, fit, refine,
};
use crate::models::{ForceExtensionModel, lookup};
use crate::params::{CompiledModel, Overrides, ParameterSet, compile};
use crate::plot::{render_fit_plot, render_residual_plot};

/// Samples per plot column for the fitted curve.
const CURVE_SAMPLES_PER_COLUMN: usize = 2;

/// One model, its compiled parameters and its latest fit.
#[derive(Debug, Clone)]
pub struct WormLikeChain {
    model: Arc<dyn ForceExtensionModel>,
    defaults: ParameterSet,
    compiled: Option<CompiledModel>,
    result: Option<FitResult>,
    history: Vec<RefineRound>,
}

impl WormLikeChain {
    /// Look up `name` in the model registry and load its default parameters.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        let model = lookup(name)?;
        let defaults = model.parameters();
        Ok(Self {
            model,
            defaults,
            compiled: None,
            result: None,
            history: Vec::new(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn model(&self) -> &Arc<dyn ForceExtensionModel> {
        &self.model
    }

    /// Compiled parameters if available, otherwise the model defaults.
    pub fn params(&self) -> &ParameterSet {
        self.compiled
            .as_ref()
            .map_or(&self.defaults, |compiled| compiled.params())
    }

    pub fn compiled(&self) -> Option<&CompiledModel> {
        self.compiled.as_ref()
    }

    /// Freeze the parameter snapshot used by subsequent fits. Clears any
    /// previous result.
    pub fn compile(&mut self, overrides: &Overrides) -> Result<&CompiledModel, CompileError> {
        let compiled = compile(self.model.clone(), overrides)?;
        self.result = None;
        self.history.clear();
        Ok(self.compiled.insert(compiled))
    }

    /// Fit with `min_delta` as the chi-square tolerance and at most
    /// `max_iters` solver iterations. `verbose` logs progress.
    pub fn fit(
        &mut self,
        data: &Measurement,
        min_delta: f64,
        max_iters: usize,
        verbose: bool,
    ) -> Result<&FitResult, FitError> {
        let config = SolverConfig::new(min_delta, max_iters);
        let logger = verbose.then(|| ProgressLogger::new(self.name()));
        self.fit_with(data, &config, logger.as_ref().map(|l| l as &dyn FitObserver))
    }

    /// Fit with an explicit solver configuration and optional observer.
    pub fn fit_with(
        &mut self,
        data: &Measurement,
        config: &SolverConfig,
        observer: Option<&dyn FitObserver>,
    ) -> Result<&FitResult, FitError> {
        let compiled = self.compiled.as_ref().ok_or(FitError::NotCompiled(self.model.name()))?;
        let result = fit(compiled, data, config, observer)?;
        self.history.clear();
        Ok(self.result.insert(result))
    }

    /// Iterative Lp refinement; keeps the round history and the best result.
    pub fn refine(
        &mut self,
        data: &Measurement,
        config: &RefineConfig,
        verbose: bool,
    ) -> Result<&FitResult, FitError> {
        let compiled = self.compiled.as_ref().ok_or(FitError::NotCompiled(self.model.name()))?;
        let logger = verbose.then(|| ProgressLogger::new(self.model.name()));
        let outcome = refine(compiled, data, config, logger.as_ref().map(|l| l as &dyn FitObserver))?;
        let best = outcome.best().clone();
        self.history = outcome.rounds;
        Ok(self.result.insert(best))
    }

    pub fn result(&self) -> Result<&FitResult, FitError> {
        self.result.as_ref().ok_or(FitError::NoResult(self.model.name()))
    }

    /// Rounds of the last `refine` call (empty after a plain fit).
    pub fn history(&self) -> &[RefineRound] {
        &self.history
    }

    /// Text report of the latest fit.
    pub fn stats(&self) -> Result<String, FitError> {
        Ok(self.result()?.report())
    }

    /// Data overlaid with the fitted curve.
    pub fn plot(&self, data: &Measurement, width: usize, height: usize) -> Result<String, FitError> {
        let result = self.result()?;
        let curve = result.sample_curve(data, width.max(10) * CURVE_SAMPLES_PER_COLUMN)?;
        Ok(render_fit_plot(data, &curve, width, height))
    }

    /// Weighted residuals of the latest fit against the model's independent axis.
    pub fn plot_residuals(&self, data: &Measurement, width: usize, height: usize) -> Result<String, FitError> {
        let result = self.result()?;
        if data.len() != result.residual.len() {
            return Err(FitError::precondition(format!(
                "measurement has {} points but the fit used {}",
                data.len(),
                result.residual.len()
            )));
        }
        let x = data.axis(result.independent());
        Ok(render_residual_plot(x, &result.residual, result.independent(), width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamOverride;

    fn data() -> Measurement {
        let model = lookup("odijk").unwrap();
        let force: Vec<f64> = (0..80).map(|i| 1.0 + 0.5 * i as f64).collect();
        let distance = model.evaluate(&force, &[4.116259, 4800.0, 48.0, 950.0]).unwrap();
        Measurement::new(force, distance)
    }

    #[test]
    fn unknown_model_fails_on_construction() {
        assert!(matches!(
            WormLikeChain::new("eWLC"),
            Err(ModelError::UnknownModel { .. })
        ));
    }

    #[test]
    fn fit_requires_compile_and_report_requires_fit() {
        let mut wlc = WormLikeChain::new("odijk").unwrap();
        assert_eq!(wlc.params().len(), 4);
        assert_eq!(
            wlc.fit(&data(), 1e-8, 200, false).unwrap_err(),
            FitError::NotCompiled("odijk")
        );
        wlc.compile(&Overrides::new()).unwrap();
        assert_eq!(wlc.stats().unwrap_err(), FitError::NoResult("odijk"));
        assert!(wlc.plot(&data(), 40, 10).is_err());
    }

    #[test]
    fn full_session_flow() {
        let data = data();
        let mut wlc = WormLikeChain::new("Odijk").unwrap();
        wlc.compile(&Overrides::new().temperature(25.0)).unwrap();
        let result = wlc.fit(&data, 1e-10, 200, true).unwrap();
        assert!(result.converged, "{}", result.message);
        assert!((result.value("Lc").unwrap() - 4800.0).abs() < 1.0);

        let report = wlc.stats().unwrap();
        assert!(report.starts_with("[[Model]]\n    Model(odijk)\n"));

        let plot = wlc.plot(&data, 40, 10).unwrap();
        assert_eq!(plot.lines().count(), 11);
        let residuals = wlc.plot_residuals(&data, 40, 10).unwrap();
        assert!(residuals.starts_with("Plot: force="));
        assert!(wlc.history().is_empty());
    }

    #[test]
    fn recompiling_clears_the_result() {
        let mut wlc = WormLikeChain::new("odijk").unwrap();
        wlc.compile(&Overrides::new()).unwrap();
        wlc.fit(&data(), 1e-8, 200, false).unwrap();
        assert!(wlc.result().is_ok());

        let compiled = wlc
            .compile(&Overrides::new().set("S", ParamOverride::value(950.0).vary(false)))
            .unwrap();
        assert!(!compiled.params().get("S").unwrap().vary);
        assert!(wlc.result().is_err());
        assert_eq!(wlc.params().get("S").unwrap().value, 950.0);
    }

    #[test]
    fn refine_keeps_history() {
        let mut wlc = WormLikeChain::new("odijk").unwrap();
        wlc.compile(&Overrides::new()).unwrap();
        let config = RefineConfig {
            min_delta_lp: 1e-2,
            ..RefineConfig::default()
        };
        wlc.refine(&data(), &config, false).unwrap();
        assert!(!wlc.history().is_empty());
        assert!((wlc.result().unwrap().value("Lp").unwrap() - 48.0).abs() < 0.1);
    }

    #[test]
    fn residual_plot_rejects_mismatched_data() {
        let mut wlc = WormLikeChain::new("odijk").unwrap();
        wlc.compile(&Overrides::new()).unwrap();
        wlc.fit(&data(), 1e-8, 200, false).unwrap();
        let short = Measurement::new(vec![1.0], vec![4.0]);
        assert!(matches!(
            wlc.plot_residuals(&short, 40, 10),
            Err(FitError::Precondition(_))
        ));
    }
}
