//! Independent fits of many datasets on the rayon pool.

use rayon::prelude::*;

use crate::domain::Measurement;
use crate::error::FitError;
use crate::fit::{FitResult, SolverConfig, fit};
use crate::params::CompiledModel;

/// Fit every dataset against the same compiled model.
///
/// Each fit works on its own copy of the parameter snapshot; results come back
/// in input order regardless of completion order.
pub fn fit_batch(
    model: &CompiledModel,
    datasets: &[Measurement],
    config: &SolverConfig,
) -> Vec<Result<FitResult, FitError>> {
    log::debug!(
        "batch fit of {} datasets with '{}' on {} threads",
        datasets.len(),
        model.name(),
        rayon::current_num_threads()
    );
    datasets
        .par_iter()
        .map(|data| fit(model, data, config, None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lookup;
    use crate::params::{Overrides, compile};

    #[test]
    fn results_follow_input_order() {
        let variant = lookup("odijk").unwrap();
        let model = compile(variant.clone(), &Overrides::new()).unwrap();
        let force: Vec<f64> = (1..=60).map(|i| i as f64 * 0.8).collect();
        let lcs = [3000.0, 4500.0, 6000.0, 7500.0];
        let mut datasets: Vec<Measurement> = lcs
            .iter()
            .map(|&lc| {
                let d = variant.evaluate(&force, &[4.116, lc, 50.0, 1000.0]).unwrap();
                Measurement::new(force.clone(), d)
            })
            .collect();
        datasets.push(Measurement::new(vec![1.0], vec![]));

        let results = fit_batch(&model, &datasets, &SolverConfig::default());
        assert_eq!(results.len(), 5);
        for (result, lc) in results.iter().zip(lcs) {
            let fitted = result.as_ref().unwrap().value("Lc").unwrap();
            assert!((fitted - lc).abs() / lc < 1e-3, "{fitted} vs {lc}");
        }
        assert!(matches!(results[4], Err(FitError::Precondition(_))));
    }
}
