//! TOML run configuration.
//!
//! A config file provides defaults for a `wlc fit`/`wlc batch` run; CLI flags
//! always win over file values.
//!
//! ```toml
//! model = "odijk"
//! temperature = 24.0
//!
//! [fit]
//! ftol = 1e-10
//! max_iters = 500
//!
//! [refine]
//! min_delta_lp = 0.01
//! max_rounds = 20
//!
//! [params.Lc]
//! value = 5500.0
//! min = 1000.0
//! max = 10000.0
//!
//! [params.S]
//! vary = false
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::fit::{RefineConfig, SolverConfig};
use crate::params::{Overrides, ParamOverride};

/// `[fit]` table. Unset keys keep the solver defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitSection {
    pub ftol: Option<f64>,
    pub xtol: Option<f64>,
    pub gtol: Option<f64>,
    pub max_iters: Option<usize>,
}

/// `[refine]` table. Its presence turns refinement on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefineSection {
    pub min_delta_lp: Option<f64>,
    pub max_rounds: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model: Option<String>,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    #[serde(default)]
    pub fit: FitSection,
    pub refine: Option<RefineSection>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamOverride>,
}

impl ConfigFile {
    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("failed to read config file '{}'", path.display()), e))?;
        let config = Self::parse(&text, &path.display().to_string())?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str, path: &str) -> Result<Self, AppError> {
        toml::from_str(text).map_err(|source| AppError::Config {
            path: path.to_string(),
            source,
        })
    }

    /// Parameter overrides (and temperature) from the file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            temperature: self.temperature,
            params: self.params.clone(),
        }
    }

    /// Solver settings from `[fit]` on top of the defaults.
    pub fn solver(&self) -> SolverConfig {
        let defaults = SolverConfig::default();
        SolverConfig {
            method: defaults.method,
            ftol: self.fit.ftol.unwrap_or(defaults.ftol),
            xtol: self.fit.xtol.unwrap_or(defaults.xtol),
            gtol: self.fit.gtol.unwrap_or(defaults.gtol),
            max_iters: self.fit.max_iters.unwrap_or(defaults.max_iters),
        }
    }

    /// Refinement settings, when the file asks for refinement.
    pub fn refine(&self) -> Option<RefineConfig> {
        let section = self.refine.as_ref()?;
        let defaults = RefineConfig::default();
        Some(RefineConfig {
            min_delta_lp: section.min_delta_lp.unwrap_or(defaults.min_delta_lp),
            max_rounds: section.max_rounds.unwrap_or(defaults.max_rounds),
            solver: self.solver(),
        })
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub min_delta: Option<f64>,
    pub max_iters: Option<usize>,
    pub refine_delta_lp: Option<f64>,
    pub max_rounds: Option<usize>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: String,
    pub overrides: Overrides,
    pub solver: SolverConfig,
    pub refine: Option<RefineConfig>,
}

pub const DEFAULT_MODEL: &str = "odijk";

impl RunConfig {
    /// Merge a config file (if any) with CLI values; CLI wins.
    pub fn resolve(file: Option<&ConfigFile>, cli: &CliOverrides) -> Self {
        let default_file = ConfigFile::default();
        let file = file.unwrap_or(&default_file);

        let model = cli
            .model
            .clone()
            .or_else(|| file.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let overrides = file.overrides().merge(&Overrides {
            temperature: cli.temperature,
            ..Overrides::default()
        });

        let mut solver = file.solver();
        if let Some(min_delta) = cli.min_delta {
            solver.ftol = min_delta;
        }
        if let Some(max_iters) = cli.max_iters {
            solver.max_iters = max_iters;
        }

        let cli_refine = cli.refine_delta_lp.is_some() || cli.max_rounds.is_some();
        let refine = match (file.refine(), cli_refine) {
            (None, false) => None,
            (base, _) => {
                let base = base.unwrap_or_default();
                Some(RefineConfig {
                    min_delta_lp: cli.refine_delta_lp.unwrap_or(base.min_delta_lp),
                    max_rounds: cli.max_rounds.unwrap_or(base.max_rounds),
                    solver,
                })
            }
        };

        Self {
            model,
            overrides,
            solver,
            refine,
        }
    }
}
