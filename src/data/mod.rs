//! Historical daily data providers.
//!
//! - `open_meteo`: the Open-Meteo archive API (HTTP, cached, retried)
//! - `memory`: serve windows of a series already in memory
//! - `synthetic`: seeded, deterministic climate series for offline use
//!
//! Every provider returns a [`HistoricalSeries`] covering exactly the requested
//! window (or, when the request allows it, ending early) and fails with
//! `DataUnavailable` otherwise.

use std::sync::Arc;

use crate::domain::{Coordinates, DateWindow, HistoricalSeries};
use crate::error::{ForecastError, Result};

pub mod cache;
pub mod memory;
pub mod open_meteo;
pub mod synthetic;
pub mod transport;

pub use cache::{Cached, ResponseCache};
pub use memory::InMemoryProvider;
pub use open_meteo::{ArchiveTransport, OpenMeteoArchive, parse_archive_response};
pub use synthetic::SyntheticClimate;
pub use transport::{HttpTransport, RetryPolicy, Retrying, Transport, TransportError};

/// What to fetch: both daily signals for a location over a closed window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRequest {
    pub coordinates: Coordinates,
    pub window: DateWindow,
    /// Accept a series that stops before `window.end` because the newest days
    /// are not published yet.
    pub allow_short_end: bool,
}

impl HistoryRequest {
    pub fn new(coordinates: Coordinates, window: DateWindow) -> Self {
        Self {
            coordinates,
            window,
            allow_short_end: false,
        }
    }
}

/// A source of gap-free daily history.
pub trait HistoryProvider: Send + Sync {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries>;
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for &P {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        (**self).fetch(request)
    }
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for Arc<P> {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        (**self).fetch(request)
    }
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for Box<P> {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        (**self).fetch(request)
    }
}

/// Check that `series` covers what `request` asked for.
pub fn ensure_coverage(request: &HistoryRequest, series: &HistoricalSeries) -> Result<()> {
    let want = request.window;
    let got = series.window();
    if got.start != want.start {
        return Err(ForecastError::data_unavailable(format!(
            "history starts on {} but {} was requested",
            got.start, want.start
        )));
    }
    let short_ok = request.allow_short_end && got.end < want.end;
    if got.end != want.end && !short_ok {
        return Err(ForecastError::data_unavailable(format!(
            "history covers {got} but {want} was requested"
        )));
    }
    Ok(())
}
