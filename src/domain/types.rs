//! Shared domain types.
//!
//! These types are intentionally kept small and immutable so they can be:
//!
//! - produced by any provider (HTTP, in-memory, synthetic)
//! - consumed by the fit layer without re-validation
//! - handed back to callers as plain values

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// A location on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(ForecastError::InvalidCoordinates { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°N {:.4}°E", self.latitude, self.longitude)
    }
}

/// The two daily signals the engine models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Daily rain sum (mm).
    RainSum,
    /// Daily mean 2 m air temperature (°C).
    TemperatureMean,
}

impl Signal {
    /// Request order used against the upstream archive.
    pub const ALL: [Signal; 2] = [Signal::RainSum, Signal::TemperatureMean];

    /// Daily variable name understood by the archive API.
    pub fn api_name(self) -> &'static str {
        match self {
            Signal::RainSum => "rain_sum",
            Signal::TemperatureMean => "temperature_2m_mean",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Signal::RainSum => "mm",
            Signal::TemperatureMean => "°C",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// A closed calendar-date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ForecastError::data_unavailable(format!(
                "empty date range {start}..={end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days, both ends included.
    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// One calendar day of observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub rain_sum: f64,
    pub temperature_mean: f64,
}

/// A gap-free daily history of both signals.
///
/// Invariants (checked on construction, never bypassed):
/// - one row per calendar day, ascending, no gaps
/// - both signal arrays have the same length as the date axis
/// - every value is finite
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    window: DateWindow,
    rain_sum: Vec<f64>,
    temperature_mean: Vec<f64>,
}

impl HistoricalSeries {
    /// Build a series starting at `start` from per-signal arrays.
    pub fn new(start: NaiveDate, rain_sum: Vec<f64>, temperature_mean: Vec<f64>) -> Result<Self> {
        if rain_sum.is_empty() {
            return Err(ForecastError::data_unavailable("historical series is empty"));
        }
        if rain_sum.len() != temperature_mean.len() {
            return Err(ForecastError::data_unavailable(format!(
                "signal lengths differ: {} rain_sum rows vs {} temperature_2m_mean rows",
                rain_sum.len(),
                temperature_mean.len()
            )));
        }
        for (signal, values) in [
            (Signal::RainSum, &rain_sum),
            (Signal::TemperatureMean, &temperature_mean),
        ] {
            if let Some(i) = values.iter().position(|v| !v.is_finite()) {
                let date = start + Days::new(i as u64);
                return Err(ForecastError::data_unavailable(format!(
                    "{signal} has no value for {date}"
                )));
            }
        }

        let end = start
            .checked_add_days(Days::new(rain_sum.len() as u64 - 1))
            .ok_or_else(|| ForecastError::data_unavailable("historical series overflows the calendar"))?;

        Ok(Self {
            window: DateWindow { start, end },
            rain_sum,
            temperature_mean,
        })
    }

    /// Build a series from dated rows, rejecting gaps and disorder.
    pub fn from_records(records: &[DailyRecord]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| ForecastError::data_unavailable("historical series is empty"))?;

        for pair in records.windows(2) {
            if pair[0].date.succ_opt() != Some(pair[1].date) {
                return Err(ForecastError::data_unavailable(format!(
                    "daily rows are not contiguous: {} is followed by {}",
                    pair[0].date, pair[1].date
                )));
            }
        }

        let rain_sum = records.iter().map(|r| r.rain_sum).collect();
        let temperature_mean = records.iter().map(|r| r.temperature_mean).collect();
        Self::new(first.date, rain_sum, temperature_mean)
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn start(&self) -> NaiveDate {
        self.window.start
    }

    pub fn end(&self) -> NaiveDate {
        self.window.end
    }

    pub fn len(&self) -> usize {
        self.rain_sum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rain_sum.is_empty()
    }

    pub fn values(&self, signal: Signal) -> &[f64] {
        match signal {
            Signal::RainSum => &self.rain_sum,
            Signal::TemperatureMean => &self.temperature_mean,
        }
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.window.start + Days::new(index as u64)
    }

    pub fn records(&self) -> impl Iterator<Item = DailyRecord> + '_ {
        self.rain_sum
            .iter()
            .zip(&self.temperature_mean)
            .enumerate()
            .map(|(i, (&rain_sum, &temperature_mean))| DailyRecord {
                date: self.date_at(i),
                rain_sum,
                temperature_mean,
            })
    }

    /// Sub-series for `window`, or `None` when it is not fully covered.
    pub fn slice(&self, window: DateWindow) -> Option<Self> {
        if window.start < self.window.start || window.end > self.window.end {
            return None;
        }
        let from = (window.start - self.window.start).num_days() as usize;
        let to = from + window.len_days();
        Some(Self {
            window,
            rain_sum: self.rain_sum[from..to].to_vec(),
            temperature_mean: self.temperature_mean[from..to].to_vec(),
        })
    }
}

/// The five estimates returned for a target date.
///
/// All values come from the terminal step of the forecast. Max and min
/// temperature repeat the mean estimate: there is no diurnal-range model at
/// this horizon.
///
/// `chance_of_rain` is an ad hoc scaling of the rain-sum estimate
/// (`min(R × 10, 100)`), not a calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Rainfall")]
    pub rainfall: f64,
    #[serde(rename = "Chance of Rain")]
    pub chance_of_rain: f64,
    #[serde(rename = "Max Temperature of Day")]
    pub max_temperature: f64,
    #[serde(rename = "Min Temperature of Day")]
    pub min_temperature: f64,
}

impl ForecastResult {
    pub const TEMPERATURE: &'static str = "Temperature";
    pub const RAINFALL: &'static str = "Rainfall";
    pub const CHANCE_OF_RAIN: &'static str = "Chance of Rain";
    pub const MAX_TEMPERATURE: &'static str = "Max Temperature of Day";
    pub const MIN_TEMPERATURE: &'static str = "Min Temperature of Day";

    pub const KEYS: [&'static str; 5] = [
        Self::TEMPERATURE,
        Self::RAINFALL,
        Self::CHANCE_OF_RAIN,
        Self::MAX_TEMPERATURE,
        Self::MIN_TEMPERATURE,
    ];

    /// The result as a name → value mapping with exactly [`Self::KEYS`].
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        Self::KEYS
            .iter()
            .filter_map(|&key| self.get(key).map(|v| (key, v)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            Self::TEMPERATURE => Some(self.temperature),
            Self::RAINFALL => Some(self.rainfall),
            Self::CHANCE_OF_RAIN => Some(self.chance_of_rain),
            Self::MAX_TEMPERATURE => Some(self.max_temperature),
            Self::MIN_TEMPERATURE => Some(self.min_temperature),
            _ => None,
        }
    }
}

/// Mean historical values for one calendar day (month/day) across years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climatology {
    pub temperature_mean: f64,
    pub rain_sum: f64,
    /// Number of years that had a row for this calendar day.
    pub years: usize,
}

/// A forecast together with the context it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub coordinates: Coordinates,
    pub target_date: NaiveDate,
    /// Forecast origin: the last day of history the models were fitted on.
    pub last_available: NaiveDate,
    pub horizon: u32,
    pub history: DateWindow,
    pub result: ForecastResult,
    /// Historical mean for the target's calendar day, when any year has one.
    pub baseline: Option<Climatology>,
}
