//! Numerical utilities: rounding and linear least squares.

pub mod ols;
pub mod rounding;

pub use ols::*;
pub use rounding::*;
