//! Open-Meteo archive API integration.
//!
//! Requests daily `rain_sum` and `temperature_2m_mean` with `timezone=auto` and
//! `timeformat=unixtime`. Each daily timestamp marks local midnight expressed
//! in UTC, so shifting it by `utc_offset_seconds` and dropping the time yields
//! the location's naive calendar date.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::data::cache::{Cached, ResponseCache};
use crate::data::transport::{HttpTransport, RetryPolicy, Retrying, Transport, TransportError};
use crate::data::{HistoryProvider, HistoryRequest, ensure_coverage};
use crate::domain::{DailyRecord, HistoricalSeries, ProviderConfig, Signal};
use crate::error::{ForecastError, Result};

/// Cache over retries over reqwest.
pub type ArchiveTransport = Cached<Retrying<HttpTransport>>;

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    utc_offset_seconds: i64,
    #[serde(default)]
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<i64>,
    #[serde(flatten)]
    variables: HashMap<String, Value>,
}

/// Error body returned with 4xx statuses.
#[derive(Debug, Deserialize)]
struct ArchiveError {
    #[serde(default)]
    reason: Option<String>,
}

pub struct OpenMeteoArchive<T = ArchiveTransport> {
    transport: T,
    base_url: String,
}

impl OpenMeteoArchive<ArchiveTransport> {
    /// HTTP client wrapped in the configured retry policy and response cache.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpTransport::new(config)?;
        let retrying = Retrying::new(http, RetryPolicy::from_config(config));
        let cache = Arc::new(ResponseCache::new(config.cache_ttl));
        Ok(Self::with_transport(Cached::new(retrying, cache), &config.archive_url))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&ProviderConfig::from_env()?)
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.transport.cache()
    }
}

impl<T: Transport> OpenMeteoArchive<T> {
    pub fn with_transport(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn query(request: &HistoryRequest) -> Vec<(String, String)> {
        let daily: Vec<&str> = Signal::ALL.iter().map(|s| s.api_name()).collect();
        vec![
            ("latitude".to_string(), request.coordinates.latitude.to_string()),
            ("longitude".to_string(), request.coordinates.longitude.to_string()),
            ("start_date".to_string(), request.window.start.format("%Y-%m-%d").to_string()),
            ("end_date".to_string(), request.window.end.format("%Y-%m-%d").to_string()),
            ("daily".to_string(), daily.join(",")),
            ("timezone".to_string(), "auto".to_string()),
            ("timeformat".to_string(), "unixtime".to_string()),
        ]
    }
}

impl<T: Transport> HistoryProvider for OpenMeteoArchive<T> {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        debug!(
            "archive request {} for {}",
            request.window, request.coordinates
        );
        let body = self
            .transport
            .get(&self.base_url, &Self::query(request))
            .map_err(describe_transport_error)?;
        parse_archive_response(&body, request)
    }
}

fn describe_transport_error(err: TransportError) -> ForecastError {
    if let TransportError::Status { status, body, .. } = &err {
        if let Some(reason) = serde_json::from_str::<ArchiveError>(body)
            .ok()
            .and_then(|e| e.reason)
        {
            return ForecastError::data_unavailable(format!("archive rejected request (HTTP {status}): {reason}"));
        }
    }
    if err.is_retryable() {
        ForecastError::data_unavailable_transient(err.to_string())
    } else {
        ForecastError::data_unavailable(err.to_string())
    }
}

/// Parse an archive JSON body into a series aligned with `request`.
pub fn parse_archive_response(body: &str, request: &HistoryRequest) -> Result<HistoricalSeries> {
    let resp: ArchiveResponse = serde_json::from_str(body)
        .map_err(|e| ForecastError::data_unavailable(format!("malformed archive response: {e}")))?;
    let daily = resp
        .daily
        .ok_or_else(|| ForecastError::data_unavailable("archive response has no daily block"))?;

    let dates = daily
        .time
        .iter()
        .map(|&ts| local_date(ts, resp.utc_offset_seconds))
        .collect::<Result<Vec<_>>>()?;

    let rain = variable(&daily, Signal::RainSum, dates.len())?;
    let temperature = variable(&daily, Signal::TemperatureMean, dates.len())?;

    // Days the archive has not finalized yet come back as trailing nulls.
    let complete = |i: usize| rain[i].is_some() && temperature[i].is_some();
    let mut keep = dates.len();
    while keep > 0 && !complete(keep - 1) {
        keep -= 1;
    }
    if keep < dates.len() {
        if request.allow_short_end {
            let last = keep
                .checked_sub(1)
                .map_or_else(|| "the window start".to_string(), |i| dates[i].to_string());
            warn!(
                "archive has no data after {last}; dropping {} trailing day(s)",
                dates.len() - keep
            );
        } else {
            keep = dates.len();
        }
    }

    let mut records = Vec::with_capacity(keep);
    for i in 0..keep {
        let (Some(rain_sum), Some(temperature_mean)) = (rain[i], temperature[i]) else {
            let missing = if rain[i].is_none() { Signal::RainSum } else { Signal::TemperatureMean };
            return Err(ForecastError::data_unavailable(format!(
                "{missing} has no value for {}",
                dates[i]
            )));
        };
        records.push(DailyRecord {
            date: dates[i],
            rain_sum,
            temperature_mean,
        });
    }

    let series = HistoricalSeries::from_records(&records)?;
    ensure_coverage(request, &series)?;
    Ok(series)
}

fn local_date(timestamp: i64, utc_offset_seconds: i64) -> Result<NaiveDate> {
    timestamp
        .checked_add(utc_offset_seconds)
        .and_then(|local| DateTime::from_timestamp(local, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ForecastError::data_unavailable(format!("invalid daily timestamp {timestamp}")))
}

fn variable(daily: &DailyBlock, signal: Signal, len: usize) -> Result<Vec<Option<f64>>> {
    let raw = daily.variables.get(signal.api_name()).ok_or_else(|| {
        ForecastError::data_unavailable(format!("archive response is missing daily variable {signal}"))
    })?;
    let values: Vec<Option<f64>> = serde_json::from_value(raw.clone()).map_err(|e| {
        ForecastError::data_unavailable(format!("daily variable {signal} is not a numeric array: {e}"))
    })?;
    if values.len() != len {
        return Err(ForecastError::data_unavailable(format!(
            "daily variable {signal} has {} values for {len} days",
            values.len()
        )));
    }
    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}
