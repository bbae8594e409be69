//! Worm-like chain model implementations.
//!
//! Every variant implements [`ForceExtensionModel`] and is registered by name
//! in [`registry`], so the fit engine never needs to know which model it is
//! fitting.

pub mod marko_siggia;
pub mod model;
pub mod odijk;

pub use marko_siggia::*;
pub use model::*;
pub use odijk::*;
