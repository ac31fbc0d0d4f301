use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate};
use serde_json::json;
use wx_outlook::data::{Cached, ResponseCache, RetryPolicy, Retrying, Transport, TransportError};
use wx_outlook::data::transport::Query;
use wx_outlook::{EngineConfig, ForecastEngine, ForecastError, OpenMeteoArchive};

const URL: &str = "http://archive.test/v1/archive";

#[derive(Clone, Copy)]
enum Behaviour {
    Complete,
    MissingTemperature,
    /// `n` gateway errors before a complete answer.
    Flaky(usize),
    Rejects,
}

/// Archive stand-in that answers from the request's own date range.
struct FakeArchive {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl FakeArchive {
    fn new(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn param<'a>(query: &'a Query, key: &str) -> &'a str {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .unwrap()
}

fn archive_body(query: &Query, with_temperature: bool) -> String {
    let parse = |key| NaiveDate::parse_from_str(param(query, key), "%Y-%m-%d").unwrap();
    let (start, end) = (parse("start_date"), parse("end_date"));
    let offset = 3600;

    let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    let time: Vec<i64> = dates
        .iter()
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp() - offset)
        .collect();
    let rain: Vec<f64> = dates
        .iter()
        .map(|d| f64::from((d.ordinal() * 37) % 11) * 0.4)
        .collect();
    let temperature: Vec<f64> = dates
        .iter()
        .map(|d| 10.0 - 8.0 * (f64::from(d.ordinal()) / 58.0).cos() + f64::from(d.day() % 3))
        .collect();

    let mut daily = json!({ "time": time, "rain_sum": rain });
    if with_temperature {
        daily["temperature_2m_mean"] = json!(temperature);
    }
    json!({
        "latitude": 52.52,
        "longitude": 13.41,
        "utc_offset_seconds": offset,
        "timezone": "Europe/Berlin",
        "daily": daily
    })
    .to_string()
}

impl Transport for FakeArchive {
    fn get(&self, url: &str, query: &Query) -> Result<String, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(param(query, "daily"), "rain_sum,temperature_2m_mean");
        match self.behaviour {
            Behaviour::Complete => Ok(archive_body(query, true)),
            Behaviour::MissingTemperature => Ok(archive_body(query, false)),
            Behaviour::Flaky(failures) if call < failures => Err(TransportError::Status {
                url: url.to_string(),
                status: 503,
                body: String::new(),
            }),
            Behaviour::Flaky(_) => Ok(archive_body(query, true)),
            Behaviour::Rejects => Err(TransportError::Status {
                url: url.to_string(),
                status: 400,
                body: r#"{"error":true,"reason":"Cannot initialize WeatherVariable from invalid String value"}"#
                    .to_string(),
            }),
        }
    }
}

fn no_wait(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_factor: 0.0,
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn missing_variable_is_data_unavailable() {
    let archive = OpenMeteoArchive::with_transport(FakeArchive::new(Behaviour::MissingTemperature), URL);
    let engine = ForecastEngine::with_defaults(archive);
    let today = d(2025, 10, 7);

    let err = engine
        .forecast_as_of(today, 52.52, 13.41, today + Days::new(12))
        .unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable { .. }), "{err}");
    assert!(err.to_string().contains("temperature_2m_mean"), "{err}");
    assert!(!err.is_transient());
}

#[test]
fn transient_failures_are_retried() {
    let transport = Retrying::new(FakeArchive::new(Behaviour::Flaky(2)), no_wait(5));
    let engine = ForecastEngine::with_defaults(OpenMeteoArchive::with_transport(transport, URL));
    let today = d(2025, 10, 7);

    let report = engine
        .report_as_of(today, 52.52, 13.41, today + Days::new(12))
        .unwrap();
    assert_eq!(report.horizon, 17);
    assert_eq!(report.history.len_days(), 3654);
}

#[test]
fn exhausted_retries_surface_as_unavailable() {
    let fake = Arc::new(FakeArchive::new(Behaviour::Flaky(usize::MAX)));
    let transport = Retrying::new(SharedFake(Arc::clone(&fake)), no_wait(5));
    let engine = ForecastEngine::with_defaults(OpenMeteoArchive::with_transport(transport, URL));
    let today = d(2025, 10, 7);

    let err = engine
        .forecast_as_of(today, 52.52, 13.41, today + Days::new(12))
        .unwrap_err();
    assert!(err.is_transient(), "{err}");
    assert_eq!(fake.calls(), 6);
}

#[test]
fn rejected_request_is_not_retried_and_keeps_the_reason() {
    let fake = Arc::new(FakeArchive::new(Behaviour::Rejects));
    let transport = Retrying::new(SharedFake(Arc::clone(&fake)), no_wait(5));
    let engine = ForecastEngine::with_defaults(OpenMeteoArchive::with_transport(transport, URL));
    let today = d(2025, 10, 7);

    let err = engine
        .forecast_as_of(today, 52.52, 13.41, today + Days::new(12))
        .unwrap_err();
    assert!(err.to_string().contains("invalid String value"), "{err}");
    assert_eq!(fake.calls(), 1);
    assert!(!err.is_transient());
}

#[test]
fn identical_requests_are_served_from_cache() {
    let fake = Arc::new(FakeArchive::new(Behaviour::Complete));
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(3600)));
    let transport = Cached::new(SharedFake(Arc::clone(&fake)), Arc::clone(&cache));
    let config = EngineConfig {
        seasonal_period: 7,
        history_years: 1,
        ..EngineConfig::default()
    };
    let engine = ForecastEngine::new(OpenMeteoArchive::with_transport(transport, URL), config).unwrap();
    let today = d(2025, 4, 1);

    let first = engine.forecast_as_of(today, 52.52, 13.41, d(2025, 4, 10)).unwrap();
    let second = engine.forecast_as_of(today, 52.52, 13.41, d(2025, 4, 10)).unwrap();
    assert_eq!(first, second);
    assert_eq!(fake.calls(), 1);
    assert_eq!(cache.len(), 1);

    engine.forecast_as_of(today, 48.85, 2.35, d(2025, 4, 10)).unwrap();
    assert_eq!(fake.calls(), 2);
}

/// Lets a test keep a handle on the fake after handing it to a wrapper.
struct SharedFake(Arc<FakeArchive>);

impl Transport for SharedFake {
    fn get(&self, url: &str, query: &Query) -> Result<String, TransportError> {
        self.0.get(url, query)
    }
}
