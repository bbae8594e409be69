//! Parameter specification.
//!
//! - `parameter`: named coefficients, units, bounds, fixed/free flags
//! - `bounds`: mapping between bounded external values and the unbounded
//!   internal coordinates the solver works in
//! - `compile`: applying caller overrides and freezing a snapshot for fitting

pub mod bounds;
pub mod compile;
pub mod parameter;

pub use bounds::*;
pub use compile::*;
pub use parameter::*;
