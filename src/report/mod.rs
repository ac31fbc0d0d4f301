//! Reporting utilities: result derivation and climatological baselines.

use crate::domain::ForecastResult;
use crate::math::round_to;

pub mod baseline;

pub use baseline::climatology;

/// Rain-sum magnitude (mm) mapped to 100 "chance of rain".
pub const CHANCE_OF_RAIN_PER_MM: f64 = 10.0;

/// Build the five-field result from the terminal temperature and rain forecasts.
///
/// Values pass through as forecast: a negative rain estimate yields a negative
/// `Rainfall` and `Chance of Rain`. See [`floor_rain`] for the opt-in clamp.
pub fn derive_result(temperature: f64, rain: f64) -> ForecastResult {
    let temperature = round_to(temperature, 3);

    ForecastResult {
        temperature,
        rainfall: round_to(rain, 0),
        chance_of_rain: round_to((rain * CHANCE_OF_RAIN_PER_MM).min(100.0), 3),
        max_temperature: temperature,
        min_temperature: temperature,
    }
}

/// Clamp a negative rain forecast to zero.
pub fn floor_rain(rain: f64) -> f64 {
    if rain > 0.0 { rain } else { 0.0 }
}
