//! Model fitting orchestration.
//!
//! Responsibilities:
//!
//! - build a model spec per signal from the engine configuration
//! - fit both signals (parallel) and keep only their terminal forecasts
//! - map numerical failures to `ModelFitFailure` with the failing signal

pub mod signal;

pub use signal::*;
