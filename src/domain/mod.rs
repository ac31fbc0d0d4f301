//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - request inputs (`Coordinates`, `DateWindow`, `Signal`)
//! - the validated daily history (`HistoricalSeries`)
//! - outputs (`ForecastResult`, `ForecastReport`)
//! - engine and provider configuration

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
