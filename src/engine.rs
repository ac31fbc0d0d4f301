//! The forecast engine.
//!
//! One call runs the whole pipeline:
//! plan dates -> fetch history -> fit both signals -> derive the result.
//!
//! The engine holds only its provider and configuration; nothing is cached or
//! mutated between calls.

use chrono::{Local, NaiveDate};
use log::info;

use crate::data::{HistoryProvider, HistoryRequest, OpenMeteoArchive, ensure_coverage};
use crate::domain::{Coordinates, EngineConfig, ForecastReport, ForecastResult};
use crate::error::Result;
use crate::fit::fit_signals;
use crate::report::{climatology, derive_result, floor_rain};

pub mod horizon;
pub mod worker;

pub use horizon::{ForecastPlan, forecast_horizon, history_window, last_available_date, plan};
pub use worker::{ForecastTask, spawn_forecast, spawn_forecast_as_of};

pub struct ForecastEngine<P> {
    provider: P,
    config: EngineConfig,
}

impl ForecastEngine<OpenMeteoArchive> {
    /// Open-Meteo archive provider and engine settings from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenMeteoArchive::from_env()?, EngineConfig::from_env()?)
    }
}

impl<P: HistoryProvider> ForecastEngine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    pub fn with_defaults(provider: P) -> Self {
        Self {
            provider,
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Estimate for `target`, taking today's local date as the reference.
    pub fn forecast(&self, latitude: f64, longitude: f64, target: NaiveDate) -> Result<ForecastResult> {
        self.forecast_as_of(today(), latitude, longitude, target)
    }

    /// Estimate for `target` as seen from `today`.
    pub fn forecast_as_of(
        &self,
        today: NaiveDate,
        latitude: f64,
        longitude: f64,
        target: NaiveDate,
    ) -> Result<ForecastResult> {
        self.report_as_of(today, latitude, longitude, target)
            .map(|report| report.result)
    }

    pub fn report(&self, latitude: f64, longitude: f64, target: NaiveDate) -> Result<ForecastReport> {
        self.report_as_of(today(), latitude, longitude, target)
    }

    /// Full pipeline, returning the result with the context it came from.
    pub fn report_as_of(
        &self,
        today: NaiveDate,
        latitude: f64,
        longitude: f64,
        target: NaiveDate,
    ) -> Result<ForecastReport> {
        let coordinates = Coordinates::new(latitude, longitude)?;
        // Bad horizons are rejected here, before any fetch.
        let plan = plan(today, target, &self.config)?;

        let request = HistoryRequest {
            coordinates,
            window: plan.window,
            allow_short_end: self.config.probe_last_available,
        };
        let series = self.provider.fetch(&request)?;
        ensure_coverage(&request, &series)?;

        // Equal to the planned date unless probing accepted a shorter history.
        let last_available = series.end();
        let horizon = forecast_horizon(last_available, target)?;

        let terminals = fit_signals(&series, &self.config, horizon)?;
        let rain = if self.config.floor_negative_rain {
            floor_rain(terminals.rain.terminal)
        } else {
            terminals.rain.terminal
        };
        let result = derive_result(terminals.temperature.terminal, rain);

        info!(
            "forecast {coordinates} for {target}: origin {last_available}, horizon {horizon}d, \
             temperature {:.3}, rain {:.3}",
            terminals.temperature.terminal, terminals.rain.terminal
        );

        Ok(ForecastReport {
            coordinates,
            target_date: target,
            last_available,
            horizon,
            history: series.window(),
            result,
            baseline: climatology(&series, target),
        })
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
