//! Repeated fitting that re-seeds the persistence length until it settles.
//!
//! Each round fits from the compiled snapshot with `Lp` seeded by the previous
//! round's estimate. The loop stops once `|ΔLp| < min_delta_lp` or after
//! `max_rounds`. Rounds whose `Lc` or `Lp` end on (or past) their bounds are
//! kept in the history but marked as rejected.

use serde::{Deserialize, Serialize};

use crate::domain::Measurement;
use crate::error::FitError;
use crate::fit::{FitObserver, FitResult, SolverConfig, fit};
use crate::params::CompiledModel;

const LC: &str = "Lc";
const LP: &str = "Lp";
const S: &str = "S";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RefineConfig {
    /// Stop once the change in `Lp` between rounds drops below this [nm].
    pub min_delta_lp: f64,
    pub max_rounds: usize,
    pub solver: SolverConfig,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            min_delta_lp: 1e-3,
            max_rounds: 10,
            solver: SolverConfig::default(),
        }
    }
}

/// Summary of one refinement round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineRound {
    /// 1-based round number.
    pub round: usize,
    pub lc: f64,
    pub lp: f64,
    /// Stretch modulus, for models that have one.
    pub s: Option<f64>,
    pub chisqr: f64,
    /// `|Lp − Lp_prev|`; `None` for the first round.
    pub delta_lp: Option<f64>,
    pub converged: bool,
    /// `false` when `Lc` or `Lp` ended on a bound.
    pub accepted: bool,
}

#[derive(Debug, Clone)]
pub struct RefineOutcome {
    pub rounds: Vec<RefineRound>,
    /// Result of the last accepted round, if any round was accepted.
    pub accepted: Option<FitResult>,
    /// Result of the final round, accepted or not.
    pub last: FitResult,
}

impl RefineOutcome {
    /// The last accepted result, falling back to the final round.
    pub fn best(&self) -> &FitResult {
        self.accepted.as_ref().unwrap_or(&self.last)
    }

    pub fn settled(&self) -> bool {
        self.rounds.len() > 1 && self.accepted.is_some()
    }
}

pub fn refine(
    model: &CompiledModel,
    data: &Measurement,
    config: &RefineConfig,
    observer: Option<&dyn FitObserver>,
) -> Result<RefineOutcome, FitError> {
    if !config.min_delta_lp.is_finite() || config.min_delta_lp < 0.0 {
        return Err(FitError::precondition(format!(
            "min_delta_lp must be finite and >= 0 (got {})",
            config.min_delta_lp
        )));
    }
    if config.max_rounds == 0 {
        return Err(FitError::precondition("max_rounds must be at least 1"));
    }
    if model.params().get(LP).is_none() || model.params().get(LC).is_none() {
        return Err(FitError::precondition(format!(
            "model '{}' has no '{LC}'/'{LP}' parameters to refine",
            model.name()
        )));
    }

    let mut seeded = model.clone();
    let mut rounds = Vec::new();
    let mut accepted = None;
    let mut previous_lp: Option<f64> = None;

    for round in 1..=config.max_rounds {
        let result = fit(&seeded, data, &config.solver, observer)?;

        let (Some(lc), Some(lp)) = (result.get(LC), result.get(LP)) else {
            return Err(FitError::precondition("fit result lacks Lc/Lp"));
        };
        let delta_lp = previous_lp.map(|prev| (lp.value - prev).abs());
        let in_bounds = !lc.at_bound() && !lp.at_bound();

        if !in_bounds {
            log::warn!(
                "round {round}: fitted Lc = {} / Lp = {} is on a bound, round rejected",
                lc.value,
                lp.value
            );
        }

        rounds.push(RefineRound {
            round,
            lc: lc.value,
            lp: lp.value,
            s: result.value(S),
            chisqr: result.stats.chisqr,
            delta_lp,
            converged: result.converged,
            accepted: in_bounds,
        });
        log::debug!("round {round}: Lp = {}, dLp = {delta_lp:?}", lp.value);

        let next_lp = lp.value;
        let done = delta_lp.is_some_and(|d| d < config.min_delta_lp) || round == config.max_rounds;

        if in_bounds {
            accepted = Some(result.clone());
        }
        if done {
            if accepted.is_none() {
                log::warn!("no refinement round of '{}' landed inside the bounds", model.name());
            }
            return Ok(RefineOutcome {
                rounds,
                accepted,
                last: result,
            });
        }

        seeded = seeded
            .with_initial(LP, next_lp)
            .map_err(|e| FitError::precondition(e.to_string()))?;
        previous_lp = Some(next_lp);
    }

    Err(FitError::precondition("refinement ran zero rounds"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lookup;
    use crate::params::{Overrides, ParamOverride, compile};

    fn data() -> Measurement {
        let model = lookup("odijk").unwrap();
        let force: Vec<f64> = (0..120).map(|i| 0.5 + 0.4 * i as f64).collect();
        let distance = model.evaluate(&force, &[4.1, 5400.0, 55.0, 1100.0]).unwrap();
        Measurement::new(force, distance)
    }

    #[test]
    fn stops_once_lp_settles() {
        let model = compile(lookup("odijk").unwrap(), &Overrides::new().set("kBT", ParamOverride::value(4.1)))
            .unwrap();
        let config = RefineConfig {
            min_delta_lp: 1e-2,
            max_rounds: 20,
            ..RefineConfig::default()
        };
        let outcome = refine(&model, &data(), &config, None).unwrap();
        assert!(outcome.rounds.len() >= 2);
        assert!(outcome.rounds.len() < 20);
        let last = outcome.rounds.last().unwrap();
        assert!(last.delta_lp.unwrap() < 1e-2);
        assert!(outcome.rounds[0].delta_lp.is_none());
        assert!(outcome.settled());
        assert!((outcome.best().value("Lp").unwrap() - 55.0).abs() < 0.1);
    }

    #[test]
    fn single_round_when_max_rounds_is_one() {
        let model = compile(lookup("odijk").unwrap(), &Overrides::new()).unwrap();
        let config = RefineConfig {
            max_rounds: 1,
            ..RefineConfig::default()
        };
        let outcome = refine(&model, &data(), &config, None).unwrap();
        assert_eq!(outcome.rounds.len(), 1);
        assert!(!outcome.settled());
    }

    #[test]
    fn rounds_on_a_bound_are_rejected() {
        // True Lp (55) lies above the allowed range, so Lp is pinned at 40.
        let overrides = Overrides::new()
            .set("kBT", ParamOverride::value(4.1))
            .set("Lp", ParamOverride::value(30.0).bounds(10.0, 40.0));
        let model = compile(lookup("odijk").unwrap(), &overrides).unwrap();
        let config = RefineConfig {
            max_rounds: 3,
            ..RefineConfig::default()
        };
        let outcome = refine(&model, &data(), &config, None).unwrap();
        assert!(outcome.rounds.iter().all(|r| !r.accepted));
        assert!(outcome.accepted.is_none());
        assert!(outcome.best().value("Lp").unwrap() <= 40.0);
    }

    #[test]
    fn rejects_bad_config() {
        let model = compile(lookup("odijk").unwrap(), &Overrides::new()).unwrap();
        let config = RefineConfig {
            max_rounds: 0,
            ..RefineConfig::default()
        };
        assert!(matches!(
            refine(&model, &data(), &config, None),
            Err(FitError::Precondition(_))
        ));
    }
}
