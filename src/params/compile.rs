//! `initialize` and `compile`: from a model name to a frozen parameter snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ZERO_CELSIUS_K, thermal_energy};
use crate::error::{CompileError, ModelError};
use crate::models::{ForceExtensionModel, lookup};
use crate::params::ParameterSet;

/// Name of the thermal energy parameter shared by every WLC variant.
pub const KBT: &str = "kBT";

/// Caller-supplied changes to one parameter. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamOverride {
    /// New initial value (also the starting point of the fit).
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub vary: Option<bool>,
}

impl ParamOverride {
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn vary(mut self, vary: bool) -> Self {
        self.vary = Some(vary);
        self
    }
}

/// All overrides applied by `compile`.
///
/// As TOML:
///
/// ```toml
/// temperature = 24.0
///
/// [params.Lc]
/// value = 5500.0
/// min = 1000.0
/// max = 10000.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    /// Temperature in °C; sets `kBT = KB·(273.15 + T)`.
    pub temperature: Option<f64>,
    #[serde(default)]
    pub params: BTreeMap<String, ParamOverride>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, change: ParamOverride) -> Self {
        self.params.insert(name.to_string(), change);
        self
    }

    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(mut self, other: &Overrides) -> Self {
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        for (name, change) in &other.params {
            let entry = self.params.entry(name.clone()).or_default();
            entry.value = change.value.or(entry.value);
            entry.min = change.min.or(entry.min);
            entry.max = change.max.or(entry.max);
            entry.vary = change.vary.or(entry.vary);
        }
        self
    }
}

/// A model variant together with its finalised parameter set.
///
/// Fits read a clone of this snapshot; nothing in the fit engine writes
/// back into it.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    model: Arc<dyn ForceExtensionModel>,
    params: ParameterSet,
}

impl CompiledModel {
    pub fn model(&self) -> &Arc<dyn ForceExtensionModel> {
        &self.model
    }

    pub fn name(&self) -> &'static str {
        self.model.name()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Same model with a different initial value for `name`.
    ///
    /// Used by the refinement loop to seed the next round. The new value is
    /// validated against the parameter's bounds.
    pub fn with_initial(&self, name: &str, value: f64) -> Result<Self, CompileError> {
        let mut params = self.params.clone();
        let param = params
            .get_mut(name)
            .ok_or_else(|| CompileError::UnknownParameter {
                model: self.model.name(),
                name: name.to_string(),
            })?;
        param.value = value;
        param.init = value;
        param.validate()?;
        Ok(Self {
            model: Arc::clone(&self.model),
            params,
        })
    }
}

/// Default parameter set of the model registered under `model_name`.
pub fn initialize(model_name: &str) -> Result<ParameterSet, ModelError> {
    Ok(lookup(model_name)?.parameters())
}

/// Apply `overrides` to the model's defaults and validate the result.
pub fn compile(
    model: Arc<dyn ForceExtensionModel>,
    overrides: &Overrides,
) -> Result<CompiledModel, CompileError> {
    let mut params = model.parameters();

    for (name, change) in &overrides.params {
        let param = params
            .get_mut(name)
            .ok_or_else(|| CompileError::UnknownParameter {
                model: model.name(),
                name: name.clone(),
            })?;
        if let Some(value) = change.value {
            param.value = value;
            param.init = value;
        }
        if let Some(min) = change.min {
            param.min = min;
        }
        if let Some(max) = change.max {
            param.max = max;
        }
        if let Some(vary) = change.vary {
            param.vary = vary;
        }
    }

    if let Some(temperature) = overrides.temperature {
        apply_temperature(&mut params, model.name(), temperature, overrides)?;
    }

    params.validate()?;
    log::debug!(
        "compiled model '{}' with {} free of {} parameters",
        model.name(),
        params.n_free(),
        params.len()
    );

    Ok(CompiledModel { model, params })
}

fn apply_temperature(
    params: &mut ParameterSet,
    model: &'static str,
    temperature: f64,
    overrides: &Overrides,
) -> Result<(), CompileError> {
    if !temperature.is_finite() || temperature <= -ZERO_CELSIUS_K {
        return Err(CompileError::InvalidBounds {
            name: "T".to_string(),
            min: -ZERO_CELSIUS_K,
            init: temperature,
            max: f64::INFINITY,
            reason: "temperature must be finite and above absolute zero",
        });
    }

    let derived = thermal_energy(temperature);
    let explicit = overrides.params.get(KBT).and_then(|o| o.value);
    if let Some(kbt) = explicit {
        let tol = 1e-9 * derived.abs().max(1.0);
        if (kbt - derived).abs() > tol {
            return Err(CompileError::ConflictingThermalEnergy {
                kbt,
                temperature,
                derived,
            });
        }
    }

    let param = params
        .get_mut(KBT)
        .ok_or_else(|| CompileError::UnknownParameter {
            model,
            name: KBT.to_string(),
        })?;
    param.value = derived;
    param.init = derived;
    Ok(())
}
