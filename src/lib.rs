//! `wx-outlook` library crate.
//!
//! Long-range point estimates of daily temperature and rain from about ten
//! years of daily history, using additive seasonal exponential smoothing.
//!
//! - `data`: historical providers (Open-Meteo archive, in-memory, synthetic)
//! - `models` / `fit`: Holt-Winters fitting and terminal forecasts
//! - `engine`: date planning and the end-to-end forecast call
//! - `report`: the five-field result and the climatological baseline

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod report;

pub use data::{HistoryProvider, HistoryRequest, InMemoryProvider, OpenMeteoArchive, SyntheticClimate};
pub use domain::{Coordinates, EngineConfig, ForecastReport, ForecastResult, ProviderConfig, Signal};
pub use engine::{ForecastEngine, ForecastTask, spawn_forecast};
pub use error::{ForecastError, Result};
