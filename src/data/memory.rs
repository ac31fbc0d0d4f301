//! A provider backed by a series already in memory.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;

use crate::data::{HistoryProvider, HistoryRequest, ensure_coverage};
use crate::domain::{DateWindow, HistoricalSeries};
use crate::error::{ForecastError, Result};

/// Serves sub-windows of one stored series, for any coordinates.
///
/// Counts fetches so callers can check whether a request reached the provider.
#[derive(Debug)]
pub struct InMemoryProvider {
    series: HistoricalSeries,
    fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(series: HistoricalSeries) -> Self {
        Self {
            series,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn series(&self) -> &HistoricalSeries {
        &self.series
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn covered_end(&self, request: &HistoryRequest) -> Option<NaiveDate> {
        let want = request.window;
        if want.end <= self.series.end() {
            Some(want.end)
        } else if request.allow_short_end && want.start <= self.series.end() {
            Some(self.series.end())
        } else {
            None
        }
    }
}

impl HistoryProvider for InMemoryProvider {
    fn fetch(&self, request: &HistoryRequest) -> Result<HistoricalSeries> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let unavailable = || {
            ForecastError::data_unavailable(format!(
                "stored history {} does not cover {}",
                self.series.window(),
                request.window
            ))
        };
        let end = self.covered_end(request).ok_or_else(unavailable)?;
        let window = DateWindow::new(request.window.start, end)?;
        let series = self.series.slice(window).ok_or_else(unavailable)?;
        ensure_coverage(request, &series)?;
        Ok(series)
    }
}
