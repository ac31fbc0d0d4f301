//! Seeded synthetic climate history.
//!
//! Produces a plausible daily series without touching the network: an annual
//! temperature cycle whose mean and amplitude depend on latitude, Gaussian
//! day-to-day noise, and rain as seasonal wet-day occurrence with exponential
//! amounts.
//!
//! Each day draws from its own RNG seeded by `(seed, coordinates, date)`, so a
//! given day has the same values no matter which window it is requested in.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal};

use crate::data::{HistoryProvider, HistoryRequest};
use crate::domain::{Coordinates, DailyRecord, HistoricalSeries};
use crate::error::{ForecastError, Result};

/// Day of year with the coldest climatological temperature (northern hemisphere).
const COLDEST_DAY_NORTH: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticClimate {
    pub seed: u64,
    /// Day-to-day temperature noise (°C, standard deviation).
    pub temperature_noise: f64,
    /// Average share of wet days over the year.
    pub wet_day_share: f64,
    /// Mean rain on a wet day (mm).
    pub wet_day_mean_mm: f64,
}

impl Default for SyntheticClimate {
    fn default() -> Self {
        Self {
            seed: 42,
            temperature_noise: 2.5,
            wet_day_share: 0.35,
            wet_day_mean_mm: 4.0,
        }
    }
}

impl SyntheticClimate {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Noise-free climatological temperature for `date`.
    pub fn normal_temperature(&self, coordinates: Coordinates, date: NaiveDate) -> f64 {
        let lat = coordinates.latitude.abs();
        let mean = 28.0 - 0.45 * lat;
        let amplitude = 0.22 * lat;
        mean - amplitude * annual_phase(coordinates, date).cos()
    }

    /// Probability of a wet day on `date`; higher in the local cold season.
    pub fn wet_probability(&self, coordinates: Coordinates, date: NaiveDate) -> f64 {
        let winter = annual_phase(coordinates, date).cos();
        (self.wet_day_share * (1.0 + 0.3 * winter)).clamp(0.0, 1.0)
    }

    /// Reject parameters the samplers cannot use.
    pub fn validate(&self) -> Result<()> {
        if !(self.wet_day_share.is_finite() && (0.0..=1.0).contains(&self.wet_day_share)) {
            return Err(ForecastError::config(
                "wet_day_share",
                format!("must be within [0, 1], got {}", self.wet_day_share),
            ));
        }
        Ok(())
    }

    fn day(&self, coordinates: Coordinates, date: NaiveDate) -> Result<DailyRecord> {
        let mut rng = StdRng::seed_from_u64(self.day_seed(coordinates, date));
        let noise = Normal::new(0.0, self.temperature_noise)
            .map_err(|e| ForecastError::config("temperature_noise", e.to_string()))?;
        let amount = Exp::new(1.0 / self.wet_day_mean_mm)
            .map_err(|e| ForecastError::config("wet_day_mean_mm", e.to_string()))?;

        let temperature_mean = self.normal_temperature(coordinates, date) + rng.sample(noise);
        let rain_sum = if rng.gen_bool(self.wet_probability(coordinates, date)) {
            // Archive rain sums are reported to 0.1 mm.
            (rng.sample(amount) * 10.0).round() / 10.0
        } else {
            0.0
        };

        Ok(DailyRecord {
            date,
            rain_sum,
            temperature_mean,
        })
    }

    fn day_seed(&self, coordinates: Coordinates, date: NaiveDate) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        coordinates.latitude.to_bits().hash(&mut hasher);
        coordinates.longitude.to_bits().hash(&mut hasher);
        date.num_days_from_ce().hash(&mut hasher);
        hasher.finish()
    }
}

/// Angle through the year, zero on the climatologically coldest day.
fn annual_phase(coordinates: Coordinates, date: NaiveDate) -> f64 {
    let coldest = if coordinates.latitude >= 0.0 {
        COLDEST_DAY_NORTH
    } else {
        COLDEST_DAY_NORTH + 182.5
    };
    2.0 * PI * (f64::from(date.ordinal()) - coldest) / 365.25
}

impl HistoryProvider for SyntheticClimate {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        self.validate()?;
        let records = request
            .window
            .start
            .iter_days()
            .take(request.window.len_days())
            .map(|date| self.day(request.coordinates, date))
            .collect::<Result<Vec<_>>>()?;
        HistoricalSeries::from_records(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateWindow, Signal};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn request(start: NaiveDate, end: NaiveDate) -> HistoryRequest {
        HistoryRequest::new(
            Coordinates::new(52.52, 13.41).unwrap(),
            DateWindow::new(start, end).unwrap(),
        )
    }

    #[test]
    fn same_day_same_values_across_windows() {
        let climate = SyntheticClimate::default();
        let a = climate.fetch(&request(d(2020, 1, 1), d(2020, 3, 31))).unwrap();
        let b = climate.fetch(&request(d(2020, 3, 1), d(2020, 3, 31))).unwrap();
        let march = a.slice(b.window()).unwrap();
        assert_eq!(march, b);
    }

    #[test]
    fn seed_changes_the_draws() {
        let r = request(d(2020, 1, 1), d(2020, 1, 31));
        let a = SyntheticClimate::with_seed(1).fetch(&r).unwrap();
        let b = SyntheticClimate::with_seed(2).fetch(&r).unwrap();
        assert_ne!(a.values(Signal::TemperatureMean), b.values(Signal::TemperatureMean));
    }

    #[test]
    fn northern_summer_is_warmer_than_winter() {
        let climate = SyntheticClimate::default();
        let berlin = Coordinates::new(52.52, 13.41).unwrap();
        let sydney = Coordinates::new(-33.87, 151.21).unwrap();
        let jan = d(2021, 1, 15);
        let jul = d(2021, 7, 15);
        assert!(climate.normal_temperature(berlin, jul) > climate.normal_temperature(berlin, jan) + 10.0);
        assert!(climate.normal_temperature(sydney, jan) > climate.normal_temperature(sydney, jul));
    }

    #[test]
    fn nan_wet_day_share_is_a_config_error() {
        let climate = SyntheticClimate {
            wet_day_share: f64::NAN,
            ..SyntheticClimate::default()
        };
        let err = climate.fetch(&request(d(2024, 1, 1), d(2024, 1, 10))).unwrap_err();
        assert!(matches!(err, ForecastError::Config { .. }), "{err}");
        assert!(err.to_string().contains("wet_day_share"), "{err}");
    }

    #[test]
    fn rain_is_never_negative() {
        let s = SyntheticClimate::default()
            .fetch(&request(d(2019, 1, 1), d(2019, 12, 31)))
            .unwrap();
        let rain = s.values(Signal::RainSum);
        assert_eq!(rain.len(), 365);
        assert!(rain.iter().all(|&r| r >= 0.0));
        assert!(rain.iter().any(|&r| r > 0.0));
    }
}
