//! Fit one smoothing model per signal and keep the terminal forecast.
//!
//! The two signals share nothing but the (immutable) history, so they are
//! fitted on separate rayon workers.

use log::debug;

use crate::domain::{EngineConfig, HistoricalSeries, Signal};
use crate::error::{ForecastError, Result};
use crate::models::{FitError, HoltWintersSpec};

/// Terminal forecast for a single signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalForecast {
    pub signal: Signal,
    /// Forecast value at exactly `horizon` steps past the last observation.
    pub terminal: f64,
    pub horizon: u32,
    /// In-sample sum of squared one-step errors.
    pub sse: f64,
    pub n_obs: usize,
}

/// Terminal forecasts for both signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminals {
    pub temperature: SignalForecast,
    pub rain: SignalForecast,
}

pub fn model_spec(signal: Signal, config: &EngineConfig) -> HoltWintersSpec {
    HoltWintersSpec {
        period: config.seasonal_period,
        params: config.smoothing(signal),
        trend: config.trend,
        initialization: config.initialization,
    }
}

/// Fit `signal` over the whole series and forecast `horizon` steps ahead.
pub fn fit_signal(
    signal: Signal,
    series: &HistoricalSeries,
    config: &EngineConfig,
    horizon: u32,
) -> Result<SignalForecast> {
    let fail = |e: FitError| ForecastError::ModelFitFailure {
        signal,
        reason: e.to_string(),
    };

    let model = model_spec(signal, config)
        .fit(series.values(signal))
        .map_err(fail)?;

    let terminal = model
        .forecast_at(horizon as usize)
        .ok_or_else(|| fail(FitError::NonFiniteOutput { what: "forecast (zero horizon)" }))?;
    if !terminal.is_finite() {
        return Err(fail(FitError::NonFiniteOutput { what: "forecast" }));
    }

    debug!(
        "{signal}: fitted {} days, sse={:.3}, terminal(h={horizon})={terminal:.3} {}",
        model.n_obs(),
        model.sse(),
        signal.unit()
    );

    Ok(SignalForecast {
        signal,
        terminal,
        horizon,
        sse: model.sse(),
        n_obs: model.n_obs(),
    })
}

/// Fit both signals concurrently.
///
/// When both fail, the temperature failure is reported.
pub fn fit_signals(series: &HistoricalSeries, config: &EngineConfig, horizon: u32) -> Result<Terminals> {
    let (temperature, rain) = rayon::join(
        || fit_signal(Signal::TemperatureMean, series, config, horizon),
        || fit_signal(Signal::RainSum, series, config, horizon),
    );
    Ok(Terminals {
        temperature: temperature?,
        rain: rain?,
    })
}
