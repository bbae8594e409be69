//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the measurement container (`Measurement`)
//! - the measurement axes a model maps between (`Axis`)
//! - physical constants shared by the models and parameter defaults

pub mod types;

pub use types::*;
