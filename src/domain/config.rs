//! Engine and provider configuration.
//!
//! Defaults reproduce the hand-tuned behaviour the engine was calibrated with.
//! Every knob can be overridden from the environment (a `.env` file is honoured).

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Signal;
use crate::error::{ForecastError, Result};

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Fixed smoothing coefficients for one signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Level smoothing.
    pub alpha: f64,
    /// Trend smoothing (only used with [`TrendComponent::Additive`]).
    pub beta: f64,
    /// Seasonal smoothing.
    pub gamma: f64,
}

impl SmoothingParams {
    pub const fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub const TEMPERATURE: SmoothingParams = SmoothingParams::new(0.0, 0.2, 0.1);
    pub const RAIN: SmoothingParams = SmoothingParams::new(0.1, 0.3, 0.3);

    fn validate(&self, signal: Signal) -> Result<()> {
        for (name, v) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                return Err(ForecastError::config(
                    format!("{signal}.{name}"),
                    format!("must be within [0, 1], got {v}"),
                ));
            }
        }
        Ok(())
    }
}

/// Whether the model carries a trend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendComponent {
    /// Level + season only; `beta` is ignored.
    #[default]
    None,
    /// Level + additive trend + season.
    Additive,
}

/// How the initial level/trend/season states are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initialization {
    /// Least-squares fit of the initial states given the fixed coefficients.
    #[default]
    Estimated,
    /// First-season mean and deviations.
    Heuristic,
}

/// Forecast engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days between "today" and the newest finalized upstream day.
    pub lag_days: u32,
    /// Length of the fitting window, in calendar years.
    pub history_years: u32,
    /// Seasonal period in daily steps (leap days are not special-cased).
    pub seasonal_period: usize,
    pub temperature: SmoothingParams,
    pub rain: SmoothingParams,
    pub trend: TrendComponent,
    pub initialization: Initialization,
    /// Accept history that ends before the lag-adjusted date (trailing upstream
    /// gaps) and forecast from its real last day instead.
    pub probe_last_available: bool,
    /// Clamp negative rain forecasts to zero before deriving the result.
    #[serde(default)]
    pub floor_negative_rain: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lag_days: 5,
            history_years: 10,
            seasonal_period: 365,
            temperature: SmoothingParams::TEMPERATURE,
            rain: SmoothingParams::RAIN,
            trend: TrendComponent::None,
            initialization: Initialization::Estimated,
            probe_last_available: false,
            floor_negative_rain: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `WX_LAG_DAYS`, `WX_HISTORY_YEARS`,
    /// `WX_PROBE_LAST_AVAILABLE` and `WX_FLOOR_NEGATIVE_RAIN`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(v) = env_parse("WX_LAG_DAYS")? {
            config.lag_days = v;
        }
        if let Some(v) = env_parse("WX_HISTORY_YEARS")? {
            config.history_years = v;
        }
        if let Some(v) = env_parse("WX_PROBE_LAST_AVAILABLE")? {
            config.probe_last_available = v;
        }
        if let Some(v) = env_parse("WX_FLOOR_NEGATIVE_RAIN")? {
            config.floor_negative_rain = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn smoothing(&self, signal: Signal) -> SmoothingParams {
        match signal {
            Signal::TemperatureMean => self.temperature,
            Signal::RainSum => self.rain,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_years == 0 {
            return Err(ForecastError::config("history_years", "must be at least 1"));
        }
        if self.seasonal_period < 2 {
            return Err(ForecastError::config("seasonal_period", "must be at least 2"));
        }
        // Fitting needs two full seasons; a calendar year has at least 365 days.
        let history_days = u64::from(self.history_years) * 365;
        if history_days < 2 * self.seasonal_period as u64 {
            return Err(ForecastError::config(
                "history_years",
                format!(
                    "{} year(s) of history cannot cover two seasons of {} days",
                    self.history_years, self.seasonal_period
                ),
            ));
        }
        self.temperature.validate(Signal::TemperatureMean)?;
        self.rain.validate(Signal::RainSum)?;
        Ok(())
    }
}

/// Historical archive client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub archive_url: String,
    /// How long a cached response stays fresh.
    pub cache_ttl: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_factor × 2^(n−1)` seconds.
    pub backoff_factor: f64,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            cache_ttl: Duration::from_secs(3600),
            max_retries: 5,
            backoff_factor: 0.2,
            timeout: Duration::from_secs(30),
            user_agent: concat!("wx-outlook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProviderConfig {
    /// Defaults overridden by `WX_ARCHIVE_URL`, `WX_CACHE_TTL_SECS`,
    /// `WX_MAX_RETRIES`, `WX_BACKOFF_FACTOR` and `WX_HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("WX_ARCHIVE_URL") {
            config.archive_url = url;
        }
        if let Some(secs) = env_parse::<u64>("WX_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(v) = env_parse("WX_MAX_RETRIES")? {
            config.max_retries = v;
        }
        if let Some(v) = env_parse("WX_BACKOFF_FACTOR")? {
            config.backoff_factor = v;
        }
        if let Some(secs) = env_parse::<u64>("WX_HTTP_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.archive_url.starts_with("http://") || self.archive_url.starts_with("https://")) {
            return Err(ForecastError::config(
                "archive_url",
                format!("expected an http(s) URL, got '{}'", self.archive_url),
            ));
        }
        if !(self.backoff_factor.is_finite() && self.backoff_factor >= 0.0) {
            return Err(ForecastError::config(
                "backoff_factor",
                format!("must be a non-negative number of seconds, got {}", self.backoff_factor),
            ));
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ForecastError::config(key, format!("cannot parse '{raw}': {e}")))
}
