//! Date arithmetic for the forecast origin, history window and horizon.

use chrono::{Days, Months, NaiveDate};

use crate::domain::{DateWindow, EngineConfig};
use crate::error::{ForecastError, Result};

/// Dates fixed before anything is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastPlan {
    pub today: NaiveDate,
    pub target: NaiveDate,
    /// `today − lag_days`: the newest day assumed to be finalized upstream.
    pub last_available: NaiveDate,
    /// `[last_available − history_years, last_available]`.
    pub window: DateWindow,
    /// Days from `last_available` to `target`, at least 1.
    pub horizon: u32,
}

pub fn last_available_date(today: NaiveDate, lag_days: u32) -> Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(u64::from(lag_days)))
        .ok_or_else(|| ForecastError::config("lag_days", format!("{today} minus {lag_days} days is out of range")))
}

/// Window of `years` calendar years ending at `last_available`.
///
/// A 29 February end date maps to 28 February `years` earlier.
pub fn history_window(last_available: NaiveDate, years: u32) -> Result<DateWindow> {
    let start = last_available
        .checked_sub_months(Months::new(years.saturating_mul(12)))
        .ok_or_else(|| {
            ForecastError::config("history_years", format!("{years} years before {last_available} is out of range"))
        })?;
    DateWindow::new(start, last_available)
}

/// Whole days from `last_available` to `target`; fails unless positive.
pub fn forecast_horizon(last_available: NaiveDate, target: NaiveDate) -> Result<u32> {
    let days = (target - last_available).num_days();
    if days < 1 {
        return Err(ForecastError::InvalidHorizon {
            target,
            last_available,
        });
    }
    u32::try_from(days).map_err(|_| ForecastError::InvalidHorizon {
        target,
        last_available,
    })
}

pub fn plan(today: NaiveDate, target: NaiveDate, config: &EngineConfig) -> Result<ForecastPlan> {
    let last_available = last_available_date(today, config.lag_days)?;
    let horizon = forecast_horizon(last_available, target)?;
    let window = history_window(last_available, config.history_years)?;
    Ok(ForecastPlan {
        today,
        target,
        last_available,
        window,
        horizon,
    })
}
