//! Error types.
//!
//! The library surfaces three families of failures, each raised synchronously
//! at the stage that detects it:
//!
//! - [`ModelError`]: a model was looked up by an unknown name or evaluated
//!   outside its mathematical domain
//! - [`CompileError`]: a parameter override was malformed (raised by `compile`)
//! - [`FitError`]: the data or solver settings cannot produce a well-posed fit
//!   (raised before the solver runs)
//!
//! Solver non-convergence is *not* an error; it is a flag on `FitResult`.
//!
//! [`AppError`] is the binary-level wrapper that maps everything to an exit code.

use thiserror::Error;

/// Failures of a physical model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The model was evaluated where its closed form is singular or undefined.
    #[error("domain error in model '{model}' at point {index}: {reason} (value = {value})")]
    Domain {
        model: &'static str,
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// No model is registered under the requested name.
    #[error("unknown model '{name}'; available models: {available}")]
    UnknownModel { name: String, available: String },
}

/// Failures while finalising a parameter specification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("unknown parameter '{name}' for model '{model}'")]
    UnknownParameter { model: &'static str, name: String },

    #[error("invalid bounds for parameter '{name}': {reason} (min = {min}, init = {init}, max = {max})")]
    InvalidBounds {
        name: String,
        min: f64,
        init: f64,
        max: f64,
        reason: &'static str,
    },

    #[error(
        "contradictory thermal energy: kBT = {kbt} pN*nm but T = {temperature} C implies kBT = {derived} pN*nm; provide one or the other"
    )]
    ConflictingThermalEnergy {
        kbt: f64,
        temperature: f64,
        derived: f64,
    },
}

/// Failures of the fit engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Malformed or insufficient input, detected before the solver runs.
    #[error("fit precondition failed: {0}")]
    Precondition(String),

    /// The model could not be evaluated at the initial guess.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// `fit` was called on a session whose parameters were never compiled.
    #[error("model '{0}' has not been compiled; call compile() before fit()")]
    NotCompiled(&'static str),

    /// A report or curve was requested before any fit was run.
    #[error("no fit result available for model '{0}'; call fit() first")]
    NoResult(&'static str),
}

impl FitError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        FitError::Precondition(message.into())
    }
}

/// Top-level error of the `wlc` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Csv {
        context: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid input data or CLI usage not covered by a more specific variant.
    #[error("{0}")]
    Input(String),
}

impl AppError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn csv(context: impl Into<String>, source: csv::Error) -> Self {
        AppError::Csv {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Json {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// - 2: bad input, config, or parameter overrides
    /// - 3: data insufficient for the requested fit
    /// - 4: numerical / model evaluation failures
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Compile(_)
            | AppError::Io { .. }
            | AppError::Csv { .. }
            | AppError::Config { .. }
            | AppError::Json { .. }
            | AppError::Input(_) => 2,
            AppError::Model(ModelError::UnknownModel { .. }) => 2,
            AppError::Fit(FitError::Precondition(_)) => 3,
            AppError::Fit(FitError::NotCompiled(_) | FitError::NoResult(_)) => 4,
            AppError::Model(ModelError::Domain { .. }) | AppError::Fit(FitError::Model(_)) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_stage() {
        let compile = AppError::from(CompileError::UnknownParameter {
            model: "odijk",
            name: "Q".to_string(),
        });
        assert_eq!(compile.exit_code(), 2);

        let pre = AppError::from(FitError::precondition("too few points"));
        assert_eq!(pre.exit_code(), 3);

        let domain = AppError::from(FitError::Model(ModelError::Domain {
            model: "odijk",
            index: 0,
            value: 0.0,
            reason: "force must be > 0",
        }));
        assert_eq!(domain.exit_code(), 4);
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = CompileError::InvalidBounds {
            name: "Lp".to_string(),
            min: 10.0,
            init: 50.0,
            max: 1.0,
            reason: "min > max",
        };
        let msg = err.to_string();
        assert!(msg.contains("Lp"));
        assert!(msg.contains("min > max"));
    }
}
