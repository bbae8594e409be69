//! Odijk extensible worm-like chain.
//!
//! ```text
//! d(F) = Lc · (1 − ½·sqrt(kBT / (F·Lp)) + F/S) / NM_PER_UM
//! ```
//!
//! Force `F` in pN, `Lc`/`Lp` in nm, `S` in pN, `kBT` in pN·nm; the predicted
//! distance is returned in µm (hence the division by `NM_PER_UM`).
//!
//! Odijk, T. *Stiff Chains and Filaments under Tension*. Macromolecules 28 (20),
//! 7016–7018 (1995). doi:10.1021/ma00124a044

use nalgebra::DMatrix;

use crate::domain::{Axis, NM_PER_UM, thermal_energy};
use crate::error::ModelError;
use crate::models::ForceExtensionModel;
use crate::params::{Parameter, ParameterSet};

const NAME: &str = "odijk";

const KBT: usize = 0;
const LC: usize = 1;
const LP: usize = 2;
const S: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct Odijk;

impl Odijk {
    fn check_params(params: &[f64]) -> Result<(), ModelError> {
        let domain = |value, reason| ModelError::Domain {
            model: NAME,
            index: 0,
            value,
            reason,
        };
        if !(params[KBT] >= 0.0) {
            return Err(domain(params[KBT], "kBT must be >= 0"));
        }
        if !(params[LP] > 0.0) {
            return Err(domain(params[LP], "persistence length must be > 0"));
        }
        if params[S] == 0.0 || !params[S].is_finite() {
            return Err(domain(params[S], "stretch modulus must be finite and non-zero"));
        }
        Ok(())
    }

    /// `sqrt(kBT / (F·Lp))` at point `index`, or a domain error for `F <= 0`.
    fn entropic_term(index: usize, force: f64, kbt: f64, lp: f64) -> Result<f64, ModelError> {
        if !(force > 0.0) {
            return Err(ModelError::Domain {
                model: NAME,
                index,
                value: force,
                reason: "force must be > 0",
            });
        }
        Ok((kbt / (force * lp)).sqrt())
    }
}

impl ForceExtensionModel for Odijk {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Odijk extensible worm-like chain: d = Lc*(1 - 0.5*sqrt(kBT/(F*Lp)) + F/S) [um], \
         F in pN, Lc/Lp in nm, S in pN, kBT in pN*nm. \
         Odijk, Macromolecules 28 (1995) 7016-7018"
    }

    fn independent(&self) -> Axis {
        Axis::Force
    }

    fn response(&self) -> Axis {
        Axis::Distance
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new(vec![
            Parameter::fixed("kBT", thermal_energy(25.0), "pN*nm"),
            Parameter::free("Lc", 5000.0, "nm", 100.0, 1.0e5),
            Parameter::free("Lp", 50.0, "nm", 1.0, 1000.0),
            Parameter::free("S", 1000.0, "pN", 10.0, 1.0e5),
        ])
    }

    fn evaluate(&self, x: &[f64], params: &[f64]) -> Result<Vec<f64>, ModelError> {
        Self::check_params(params)?;
        let (kbt, lc, lp, s) = (params[KBT], params[LC], params[LP], params[S]);

        x.iter()
            .enumerate()
            .map(|(i, &force)| {
                let root = Self::entropic_term(i, force, kbt, lp)?;
                Ok(lc * (1.0 - 0.5 * root + force / s) / NM_PER_UM)
            })
            .collect()
    }

    fn partials(&self, x: &[f64], params: &[f64]) -> Result<DMatrix<f64>, ModelError> {
        Self::check_params(params)?;
        let (kbt, lc, lp, s) = (params[KBT], params[LC], params[LP], params[S]);
        let mut out = DMatrix::<f64>::zeros(x.len(), params.len());

        for (i, &force) in x.iter().enumerate() {
            let root = Self::entropic_term(i, force, kbt, lp)?;
            // ∂root/∂kBT = root / (2 kBT), ∂root/∂Lp = −root / (2 Lp)
            out[(i, KBT)] = if kbt > 0.0 {
                -lc * 0.25 * root / kbt / NM_PER_UM
            } else {
                0.0
            };
            out[(i, LC)] = (1.0 - 0.5 * root + force / s) / NM_PER_UM;
            out[(i, LP)] = lc * 0.25 * root / lp / NM_PER_UM;
            out[(i, S)] = -lc * force / (s * s) / NM_PER_UM;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forward_difference;
    use approx::assert_relative_eq;

    const TRUE: [f64; 4] = [4.185289, 5576.19, 60.04, 1073.45];

    #[test]
    fn high_force_limit_is_independent_of_lp() {
        let f = 1.0e7;
        let stiff = Odijk.evaluate(&[f], &[TRUE[0], TRUE[1], 1000.0, TRUE[3]]).unwrap()[0];
        let floppy = Odijk.evaluate(&[f], &[TRUE[0], TRUE[1], 5.0, TRUE[3]]).unwrap()[0];
        let limit = TRUE[1] * (1.0 + f / TRUE[3]) / NM_PER_UM;
        assert_relative_eq!(stiff, limit, max_relative = 1e-4);
        assert_relative_eq!(floppy, limit, max_relative = 1e-4);
    }

    #[test]
    fn evaluates_known_point() {
        // F = kBT/Lp makes the square root exactly 1.
        let params = [4.0, 1000.0, 2.0, 1.0e9];
        let d = Odijk.evaluate(&[2.0], &params).unwrap()[0];
        let stretch = params[1] * 2.0 / params[3] / NM_PER_UM;
        assert_relative_eq!(d, 0.5 + stretch, max_relative = 1e-12);
    }

    #[test]
    fn zero_force_is_a_domain_error() {
        let err = Odijk.evaluate(&[1.0, 0.0], &TRUE).unwrap_err();
        match err {
            ModelError::Domain { index, value, .. } => {
                assert_eq!(index, 1);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected Domain, got {other:?}"),
        }
    }

    #[test]
    fn negative_force_is_a_domain_error() {
        assert!(Odijk.evaluate(&[-2.0], &TRUE).is_err());
    }

    #[test]
    fn non_positive_persistence_length_is_a_domain_error() {
        assert!(Odijk.evaluate(&[1.0], &[4.1, 5000.0, 0.0, 1000.0]).is_err());
    }

    #[test]
    fn analytic_partials_match_finite_differences() {
        let forces = [0.5, 2.0, 10.0, 45.0];
        let analytic = Odijk.partials(&forces, &TRUE).unwrap();
        let numeric = forward_difference(|p| Odijk.evaluate(&forces, p), forces.len(), &TRUE).unwrap();
        for i in 0..forces.len() {
            for j in 0..TRUE.len() {
                assert_relative_eq!(
                    analytic[(i, j)],
                    numeric[(i, j)],
                    max_relative = 1e-4,
                    epsilon = 1e-9
                );
            }
        }
    }
}
