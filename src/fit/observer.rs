//! Progress observation for running fits.

use std::sync::Mutex;
use std::time::Instant;

/// Receives progress notifications from the fit engine.
///
/// Observers see the numbers but cannot change them: they are called with
/// shared references and nothing they return feeds back into the solver.
pub trait FitObserver: Send + Sync {
    /// Called after every residual evaluation, with the running evaluation
    /// count and the chi-square at the evaluated point (`NaN` when the model
    /// could not be evaluated there).
    fn on_evaluation(&self, evaluations: usize, chisqr: f64);

    /// Called once when the solver returns.
    fn on_finish(&self, evaluations: usize, converged: bool) {
        let _ = (evaluations, converged);
    }
}

/// Logs evaluation count and rate at `info` level.
#[derive(Debug)]
pub struct ProgressLogger {
    label: String,
    every: usize,
    started: Mutex<Option<Instant>>,
}

impl ProgressLogger {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            every: 25,
            started: Mutex::new(None),
        }
    }

    /// Log every `every` evaluations instead of the default 25.
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    fn elapsed_secs(&self) -> f64 {
        let mut started = match self.started.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        started.get_or_insert_with(Instant::now).elapsed().as_secs_f64()
    }
}

impl FitObserver for ProgressLogger {
    fn on_evaluation(&self, evaluations: usize, chisqr: f64) {
        let elapsed = self.elapsed_secs();
        if evaluations % self.every != 0 {
            return;
        }
        let rate = if elapsed > 0.0 {
            evaluations as f64 / elapsed
        } else {
            0.0
        };
        log::info!(
            "[{}] {evaluations} evaluations ({rate:.0}/s), chi-square = {chisqr:.6e}",
            self.label
        );
    }

    fn on_finish(&self, evaluations: usize, converged: bool) {
        let elapsed = self.elapsed_secs();
        log::info!(
            "[{}] finished after {evaluations} evaluations in {elapsed:.3}s (converged = {converged})",
            self.label
        );
    }
}
