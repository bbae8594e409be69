//! Named model coefficients.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CompileError;

/// A single model coefficient.
///
/// `init` is the initial guess handed to the solver and `value` the current
/// value (equal to `init` until a fit result overwrites it in a copy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub init: f64,
    /// Informational unit label, e.g. `nm`.
    pub units: String,
    /// `false` means the value is held fixed during optimisation.
    pub vary: bool,
    #[serde(serialize_with = "serialize_bound", deserialize_with = "deserialize_lower")]
    pub min: f64,
    #[serde(serialize_with = "serialize_bound", deserialize_with = "deserialize_upper")]
    pub max: f64,
}

impl Parameter {
    /// A free parameter with the given bounds.
    pub fn free(name: &str, value: f64, units: &str, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init: value,
            units: units.to_string(),
            vary: true,
            min,
            max,
        }
    }

    /// A fixed, unbounded parameter.
    pub fn fixed(name: &str, value: f64, units: &str) -> Self {
        Self {
            name: name.to_string(),
            value,
            init: value,
            units: units.to_string(),
            vary: false,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Check `min <= init <= max` and that every field is usable.
    pub fn validate(&self) -> Result<(), CompileError> {
        let fail = |reason: &'static str| CompileError::InvalidBounds {
            name: self.name.clone(),
            min: self.min,
            init: self.init,
            max: self.max,
            reason,
        };

        if self.min.is_nan() || self.max.is_nan() {
            return Err(fail("bounds must not be NaN"));
        }
        if !self.init.is_finite() || !self.value.is_finite() {
            return Err(fail("initial value must be finite"));
        }
        if self.min > self.max {
            return Err(fail("min > max"));
        }
        if self.init < self.min || self.init > self.max {
            return Err(fail("initial guess outside bounds"));
        }
        Ok(())
    }
}

/// Ordered collection of parameters with unique names.
///
/// The order is the model's declaration order: models receive parameter
/// values as a slice in exactly this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new(params: Vec<Parameter>) -> Self {
        debug_assert!(
            {
                let mut names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "parameter names must be unique"
        );
        Self { params }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    /// Current values in declaration order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    /// Indices of the parameters the solver is allowed to move.
    pub fn free_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.vary.then_some(i))
            .collect()
    }

    pub fn n_free(&self) -> usize {
        self.params.iter().filter(|p| p.vary).count()
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        self.params.iter().try_for_each(Parameter::validate)
    }
}

impl std::ops::Index<usize> for ParameterSet {
    type Output = Parameter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.params[index]
    }
}

/// Bounds are written as `null` when infinite; JSON has no infinity.
pub(crate) fn serialize_bound<S>(bound: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    bound.is_finite().then_some(*bound).serialize(serializer)
}

pub(crate) fn deserialize_lower<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}

pub(crate) fn deserialize_upper<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}
