//! Linear algebra helpers for the fit engine.

pub mod covariance;

pub use covariance::*;
