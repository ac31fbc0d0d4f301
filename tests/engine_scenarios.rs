use std::f64::consts::PI;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use chrono::{Days, NaiveDate};
use wx_outlook::domain::HistoricalSeries;
use wx_outlook::engine::spawn_forecast_as_of;
use wx_outlook::{EngineConfig, ForecastEngine, ForecastError, ForecastResult, InMemoryProvider, SyntheticClimate};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn periodic_temperature(i: usize) -> f64 {
    let phase = 2.0 * PI * (i % 365) as f64 / 365.0;
    9.5 - 9.0 * phase.cos() + 1.5 * (3.0 * phase).sin()
}

fn periodic_rain(i: usize) -> f64 {
    let phase = 2.0 * PI * (i % 365) as f64 / 365.0;
    2.2 + 1.8 * (phase + 0.7).sin()
}

/// Twelve years of an exactly 365-periodic daily series starting 2014-01-01.
fn periodic_provider() -> (NaiveDate, InMemoryProvider) {
    let start = d(2014, 1, 1);
    let days = (d(2025, 12, 31) - start).num_days() as usize + 1;
    let series = HistoricalSeries::new(
        start,
        (0..days).map(periodic_rain).collect(),
        (0..days).map(periodic_temperature).collect(),
    )
    .unwrap();
    (start, InMemoryProvider::new(series))
}

#[test]
fn berlin_twelve_days_ahead() {
    let engine = ForecastEngine::with_defaults(SyntheticClimate::default());
    let today = d(2025, 10, 7);
    let target = today + Days::new(12);

    let report = engine.report_as_of(today, 52.52, 13.41, target).unwrap();
    assert_eq!(report.last_available, d(2025, 10, 2));
    assert_eq!(report.horizon, 17);
    assert_eq!(report.history.start, d(2015, 10, 2));
    assert_eq!(report.history.end, d(2025, 10, 2));
    assert_eq!(report.baseline.map(|b| b.years), Some(10));

    let result = report.result;
    let map = result.to_map();
    assert_eq!(map.len(), 5);
    for key in ForecastResult::KEYS {
        assert!(map.contains_key(key), "missing {key}");
    }

    assert!(result.temperature.is_finite());
    assert!((-30.0..45.0).contains(&result.temperature), "{}", result.temperature);
    assert_eq!(result.max_temperature, result.temperature);
    assert_eq!(result.min_temperature, result.temperature);

    assert_eq!(result.rainfall.fract(), 0.0);
    assert!(result.chance_of_rain <= 100.0);
    // Rainfall is rounded to whole millimetres, the chance to three decimals.
    assert!((result.chance_of_rain - (result.rainfall * 10.0).min(100.0)).abs() <= 5.0 + 1e-9);

    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json.as_object().map(|o| o.len()), Some(5));
    assert!(json.get("Chance of Rain").is_some());
}

#[test]
fn repeated_calls_are_bit_identical() {
    let engine = ForecastEngine::with_defaults(SyntheticClimate::with_seed(7));
    let today = d(2024, 3, 15);
    let target = d(2024, 4, 2);

    let a = engine.forecast_as_of(today, -33.87, 151.21, target).unwrap();
    let b = engine.forecast_as_of(today, -33.87, 151.21, target).unwrap();
    for key in ForecastResult::KEYS {
        let (x, y) = (a.get(key).unwrap(), b.get(key).unwrap());
        assert_eq!(x.to_bits(), y.to_bits(), "{key}: {x} vs {y}");
    }
}

#[test]
fn invalid_horizon_never_fetches() {
    let (_, provider) = periodic_provider();
    let engine = ForecastEngine::new(provider, EngineConfig::default()).unwrap();
    let today = d(2025, 6, 10);

    for target in [d(2025, 6, 5), d(2025, 6, 1), d(2019, 1, 1)] {
        let err = engine.forecast_as_of(today, 48.85, 2.35, target).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidHorizon { .. }), "{err}");
    }
    assert_eq!(engine.provider().fetch_count(), 0);

    assert!(engine.forecast_as_of(today, 48.85, 2.35, d(2025, 6, 6)).is_ok());
    assert_eq!(engine.provider().fetch_count(), 1);
}

#[test]
fn invalid_coordinates_are_rejected() {
    let engine = ForecastEngine::with_defaults(SyntheticClimate::default());
    let today = d(2025, 1, 10);
    let err = engine
        .forecast_as_of(today, 95.0, 0.0, d(2025, 2, 1))
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidCoordinates { .. }), "{err}");
}

#[test]
fn periodic_history_projects_the_same_day_of_cycle() {
    let (start, provider) = periodic_provider();
    let engine = ForecastEngine::new(provider, EngineConfig::default()).unwrap();
    let today = d(2025, 7, 1);
    let target = d(2025, 8, 20);

    let report = engine.report_as_of(today, 40.0, -3.7, target).unwrap();
    assert_eq!(report.horizon, 55);

    let index = (target - start).num_days() as usize;
    let temperature = periodic_temperature(index);
    let rain = periodic_rain(index);

    let r = report.result;
    assert_abs_diff_eq!(r.temperature, temperature, epsilon = 1.5e-3);
    assert!((r.rainfall - rain).abs() <= 0.5 + 1e-6, "{} vs {rain}", r.rainfall);
    assert_abs_diff_eq!(r.chance_of_rain, (rain * 10.0).min(100.0), epsilon = 1e-2);
}

#[test]
fn negative_rain_forecast_is_reported_unless_floored() {
    let start = d(2014, 1, 1);
    let days = (d(2025, 12, 31) - start).num_days() as usize + 1;
    let series = HistoricalSeries::new(
        start,
        (0..days).map(|i| periodic_rain(i) - 4.5).collect(),
        (0..days).map(periodic_temperature).collect(),
    )
    .unwrap();
    let today = d(2025, 7, 1);
    let target = d(2025, 8, 20);
    let rain = periodic_rain((target - start).num_days() as usize) - 4.5;

    let raw = ForecastEngine::new(InMemoryProvider::new(series.clone()), EngineConfig::default())
        .unwrap()
        .forecast_as_of(today, 40.0, -3.7, target)
        .unwrap();
    assert_abs_diff_eq!(raw.chance_of_rain, rain * 10.0, epsilon = 1e-2);
    assert!(raw.rainfall <= 0.0);

    let config = EngineConfig {
        floor_negative_rain: true,
        ..EngineConfig::default()
    };
    let floored = ForecastEngine::new(InMemoryProvider::new(series), config)
        .unwrap()
        .forecast_as_of(today, 40.0, -3.7, target)
        .unwrap();
    assert_eq!(floored.rainfall, 0.0);
    assert_eq!(floored.chance_of_rain, 0.0);
    assert_eq!(floored.temperature, raw.temperature);
}

#[test]
fn short_history_end_moves_the_origin_when_probing() {
    // History stops on 2025-06-30; five days of lag would want 2025-07-05.
    let start = d(2014, 1, 1);
    let days = (d(2025, 6, 30) - start).num_days() as usize + 1;
    let series = HistoricalSeries::new(
        start,
        (0..days).map(periodic_rain).collect(),
        (0..days).map(periodic_temperature).collect(),
    )
    .unwrap();
    let today = d(2025, 7, 10);
    let target = d(2025, 7, 20);

    let strict = ForecastEngine::new(InMemoryProvider::new(series.clone()), EngineConfig::default()).unwrap();
    let err = strict.forecast_as_of(today, 0.0, 0.0, target).unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable { .. }), "{err}");

    let config = EngineConfig {
        probe_last_available: true,
        ..EngineConfig::default()
    };
    let probing = ForecastEngine::new(InMemoryProvider::new(series), config).unwrap();
    let report = probing.report_as_of(today, 0.0, 0.0, target).unwrap();
    assert_eq!(report.last_available, d(2025, 6, 30));
    assert_eq!(report.horizon, 20);
    assert_eq!(report.history.start, d(2015, 7, 5));
}

#[test]
fn background_forecast_matches_direct_call() {
    let engine = Arc::new(ForecastEngine::with_defaults(SyntheticClimate::default()));
    let today = d(2025, 1, 20);
    let target = d(2025, 2, 14);

    let task = spawn_forecast_as_of(Arc::clone(&engine), today, 59.33, 18.07, target);
    let background = task.wait().unwrap();
    let direct = engine.report_as_of(today, 59.33, 18.07, target).unwrap();
    assert_eq!(background, direct);
}
