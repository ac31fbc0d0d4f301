//! Seasonal exponential smoothing.
//!
//! The fit layer relies on two primitive operations:
//! - fit a model with fixed coefficients to a daily series
//! - forecast the terminal step `h` past the last observation

pub mod holt_winters;
pub mod init;

pub use holt_winters::{FitError, FittedHoltWinters, HoltWintersSpec, InitialState};
