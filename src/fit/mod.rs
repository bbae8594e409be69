//! Fit engine.
//!
//! Responsibilities:
//!
//! - check preconditions and build the weighted residual problem
//! - run Levenberg-Marquardt in bound-transformed coordinates
//! - package the result (values, standard errors, correlations, statistics)
//! - optional Lp refinement loop and parallel batch fitting

pub mod batch;
pub mod engine;
pub mod observer;
mod problem;
pub mod refine;

pub use batch::*;
pub use engine::*;
pub use observer::*;
pub use refine::*;
