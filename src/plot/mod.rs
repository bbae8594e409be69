//! Terminal plots of fits, residuals and saved curves.

pub mod ascii;

pub use ascii::*;
