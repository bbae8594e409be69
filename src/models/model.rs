//! The model abstraction and the name registry.
//!
//! The fitter relies on two primitive operations:
//! - evaluate the response at a batch of independent-axis values
//! - the partial derivatives of the response with respect to each parameter
//!   (for the Jacobian)
//!
//! Parameter values are passed as a slice in the declaration order of
//! [`ForceExtensionModel::parameters`].

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::domain::Axis;
use crate::error::ModelError;
use crate::models::{MarkoSiggia, Odijk};
use crate::params::ParameterSet;

/// A closed-form force-extension relation.
pub trait ForceExtensionModel: std::fmt::Debug + Send + Sync {
    /// Registry name, e.g. `odijk`.
    fn name(&self) -> &'static str;

    /// Formula, units and literature reference.
    fn description(&self) -> &'static str;

    /// Axis of the values passed to [`evaluate`](Self::evaluate).
    fn independent(&self) -> Axis;

    /// Axis of the values returned by [`evaluate`](Self::evaluate).
    fn response(&self) -> Axis;

    /// Default parameters with literature-reasonable values and bounds.
    fn parameters(&self) -> ParameterSet;

    /// Predicted response at every `x`.
    fn evaluate(&self, x: &[f64], params: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// `∂response/∂param`: one row per `x`, one column per parameter.
    ///
    /// Defaults to forward differences; variants with a cheap closed form
    /// should override it.
    fn partials(&self, x: &[f64], params: &[f64]) -> Result<DMatrix<f64>, ModelError> {
        forward_difference(|p| self.evaluate(x, p), x.len(), params)
    }
}

/// Forward-difference partials of `f` around `params`.
pub fn forward_difference<F>(f: F, n_points: usize, params: &[f64]) -> Result<DMatrix<f64>, ModelError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, ModelError>,
{
    let base = f(params)?;
    let mut out = DMatrix::<f64>::zeros(n_points, params.len());
    let mut shifted = params.to_vec();

    for j in 0..params.len() {
        let h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
        shifted[j] = params[j] + h;
        let moved = f(&shifted)?;
        shifted[j] = params[j];
        for i in 0..n_points {
            out[(i, j)] = (moved[i] - base[i]) / h;
        }
    }

    Ok(out)
}

type Constructor = fn() -> Arc<dyn ForceExtensionModel>;

/// Registered model variants. Adding a model means adding one line here.
const REGISTRY: &[(&str, Constructor)] = &[
    ("odijk", odijk),
    ("WLC", wlc),
    ("bouchiat", bouchiat),
];

fn odijk() -> Arc<dyn ForceExtensionModel> {
    Arc::new(Odijk)
}

fn wlc() -> Arc<dyn ForceExtensionModel> {
    Arc::new(MarkoSiggia::wlc())
}

fn bouchiat() -> Arc<dyn ForceExtensionModel> {
    Arc::new(MarkoSiggia::bouchiat())
}

/// Names of every registered model, in registration order.
pub fn available() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Instances of every registered model, in registration order.
pub fn registry() -> Vec<Arc<dyn ForceExtensionModel>> {
    REGISTRY.iter().map(|(_, ctor)| ctor()).collect()
}

/// Look up a model by name (case-insensitive).
pub fn lookup(name: &str) -> Result<Arc<dyn ForceExtensionModel>, ModelError> {
    REGISTRY
        .iter()
        .find(|(registered, _)| registered.eq_ignore_ascii_case(name.trim()))
        .map(|(_, ctor)| ctor())
        .ok_or_else(|| ModelError::UnknownModel {
            name: name.to_string(),
            available: available().join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("ODIJK").unwrap().name(), "odijk");
        assert_eq!(lookup("wlc").unwrap().name(), "WLC");
        assert_eq!(lookup(" Bouchiat ").unwrap().name(), "bouchiat");
    }

    #[test]
    fn lookup_unknown_lists_available() {
        match lookup("twistable") {
            Err(ModelError::UnknownModel { available, .. }) => {
                assert!(available.contains("odijk"));
                assert!(available.contains("bouchiat"));
            }
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn registry_names_match_models() {
        for (name, model) in available().into_iter().zip(registry()) {
            assert_eq!(name, model.name());
            assert_ne!(model.independent(), model.response());
        }
    }

    #[test]
    fn forward_difference_of_a_line() {
        let f = |p: &[f64]| Ok(vec![p[0] * 2.0 + p[1], p[0] - 3.0 * p[1]]);
        let jac = forward_difference(f, 2, &[1.0, 2.0]).unwrap();
        assert!((jac[(0, 0)] - 2.0).abs() < 1e-6);
        assert!((jac[(0, 1)] - 1.0).abs() < 1e-6);
        assert!((jac[(1, 0)] - 1.0).abs() < 1e-6);
        assert!((jac[(1, 1)] + 3.0).abs() < 1e-6);
    }
}
