//! The least-squares problem handed to the Levenberg-Marquardt solver.
//!
//! The solver only sees the internal (unbounded) coordinates of the free
//! parameters. Fixed parameters keep their compiled value; free parameters are
//! mapped back through their [`Bound`] before every model evaluation.
//!
//! A trial point outside the model's domain (e.g. `d ≥ Lc` for the
//! Marko-Siggia family) is answered with a uniform penalty residual whose norm
//! exceeds every norm seen so far, so the solver rejects the step and shrinks
//! its trust region.

use std::cell::Cell;

use levenberg_marquardt::LeastSquaresProblem;
use nalgebra::{DMatrix, DVector, Dyn, Owned};

use crate::fit::FitObserver;
use crate::models::ForceExtensionModel;
use crate::params::Bound;

/// Penalty norm as a multiple of `1 + ‖r_best‖`.
const INFEASIBLE_PENALTY: f64 = 1.0e3;

/// Borrowed inputs shared by every clone of the problem.
pub(crate) struct ProblemData<'a> {
    pub model: &'a dyn ForceExtensionModel,
    /// Independent-axis values.
    pub x: &'a [f64],
    /// Measured response.
    pub y: &'a [f64],
    /// `1/σᵢ`.
    pub weights: &'a [f64],
    /// Positions of the free parameters in the full parameter vector.
    pub free: &'a [usize],
    /// One bound per free parameter.
    pub bounds: &'a [Bound],
    pub evaluations: &'a Cell<usize>,
    pub observer: Option<&'a dyn FitObserver>,
}

#[derive(Clone)]
pub(crate) struct WlcProblem<'a> {
    data: &'a ProblemData<'a>,
    internal: DVector<f64>,
    external: Vec<f64>,
    residuals: Option<DVector<f64>>,
    best: Option<(f64, DVector<f64>)>,
}

impl<'a> WlcProblem<'a> {
    /// Problem positioned at the compiled values `external`.
    pub fn new(data: &'a ProblemData<'a>, external: Vec<f64>) -> Self {
        let internal = DVector::from_iterator(
            data.free.len(),
            data.free
                .iter()
                .zip(data.bounds)
                .map(|(&idx, bound)| bound.start(external[idx])),
        );
        let mut problem = Self {
            data,
            internal: internal.clone(),
            external,
            residuals: None,
            best: None,
        };
        problem.move_to(&internal);
        problem
    }

    /// Full parameter vector at the current point, in declaration order.
    pub fn external(&self) -> &[f64] {
        &self.external
    }

    pub fn residual_vector(&self) -> Option<&DVector<f64>> {
        self.residuals.as_ref()
    }

    /// Chi-square at the current point, `None` when it lies outside the
    /// model's domain.
    pub fn chisqr(&self) -> Option<f64> {
        self.residuals.as_ref().map(|r| r.norm_squared())
    }

    /// Residuals reported for a point the model rejected.
    fn penalty(&self) -> DVector<f64> {
        let n = self.data.y.len();
        let best = self.best.as_ref().map_or(0.0, |(chisqr, _)| chisqr.sqrt());
        let norm = INFEASIBLE_PENALTY * (1.0 + best);
        DVector::from_element(n, norm / (n as f64).sqrt())
    }

    /// `dx/du` of every free parameter at the current point.
    pub fn transform_derivatives(&self) -> Vec<f64> {
        self.data
            .bounds
            .iter()
            .zip(self.internal.iter())
            .map(|(bound, &u)| bound.derivative(u))
            .collect()
    }

    /// Jump back to the lowest chi-square point evaluated so far.
    pub fn restore_best(&mut self) {
        if let Some((_, internal)) = self.best.take() {
            self.move_to(&internal);
        }
    }

    fn move_to(&mut self, internal: &DVector<f64>) {
        self.internal.copy_from(internal);
        for ((&idx, bound), &u) in self.data.free.iter().zip(self.data.bounds).zip(internal.iter()) {
            self.external[idx] = bound.to_external(u);
        }
        self.residuals = self.evaluate_residuals();

        if let Some(chisqr) = self.chisqr() {
            let improved = self.best.as_ref().is_none_or(|(best, _)| chisqr < *best);
            if improved {
                self.best = Some((chisqr, internal.clone()));
            }
        }
    }

    fn evaluate_residuals(&self) -> Option<DVector<f64>> {
        let d = self.data;
        let predicted = match d.model.evaluate(d.x, &self.external) {
            Ok(p) => p,
            Err(err) => {
                log::debug!("trial point rejected: {err}");
                return None;
            }
        };
        let r = DVector::from_iterator(
            d.y.len(),
            d.y.iter()
                .zip(&predicted)
                .zip(d.weights)
                .map(|((y, f), w)| (y - f) * w),
        );
        r.iter().all(|v| v.is_finite()).then_some(r)
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for WlcProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.move_to(x);
        let n = self.data.evaluations.get() + 1;
        self.data.evaluations.set(n);
        if let Some(observer) = self.data.observer {
            observer.on_evaluation(n, self.chisqr().unwrap_or(f64::NAN));
        }
    }

    fn params(&self) -> DVector<f64> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(self.residuals.clone().unwrap_or_else(|| self.penalty()))
    }

    /// `∂rᵢ/∂uₖ = −wᵢ · ∂fᵢ/∂pₖ · dpₖ/duₖ`
    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let d = self.data;
        let partials = d.model.partials(d.x, &self.external).ok()?;
        let chain = self.transform_derivatives();

        let jac = DMatrix::from_fn(d.x.len(), d.free.len(), |i, k| {
            -d.weights[i] * partials[(i, d.free[k])] * chain[k]
        });
        jac.iter().all(|v| v.is_finite()).then_some(jac)
    }
}
