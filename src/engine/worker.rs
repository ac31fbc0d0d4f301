//! Running a forecast off the caller's thread.
//!
//! The pipeline blocks on network I/O. Interactive callers spawn it here and
//! pick the outcome up from a channel when it arrives.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use crossbeam_channel::{Receiver, TryRecvError, bounded};

use crate::data::HistoryProvider;
use crate::domain::ForecastReport;
use crate::engine::ForecastEngine;
use crate::error::{ForecastError, Result};

/// Handle to a forecast running on a background thread.
pub struct ForecastTask {
    rx: Receiver<Result<ForecastReport>>,
}

impl ForecastTask {
    /// Block until the forecast finishes.
    pub fn wait(self) -> Result<ForecastReport> {
        self.rx.recv().unwrap_or(Err(ForecastError::WorkerStopped))
    }

    /// The outcome if it is ready, without blocking.
    pub fn try_take(&self) -> Option<Result<ForecastReport>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ForecastError::WorkerStopped)),
        }
    }

    /// Channel delivering the single outcome, for use with `select!`.
    pub fn receiver(&self) -> &Receiver<Result<ForecastReport>> {
        &self.rx
    }
}

pub fn spawn_forecast<P>(engine: Arc<ForecastEngine<P>>, latitude: f64, longitude: f64, target: NaiveDate) -> ForecastTask
where
    P: HistoryProvider + 'static,
{
    spawn(move || engine.report(latitude, longitude, target))
}

pub fn spawn_forecast_as_of<P>(
    engine: Arc<ForecastEngine<P>>,
    today: NaiveDate,
    latitude: f64,
    longitude: f64,
    target: NaiveDate,
) -> ForecastTask
where
    P: HistoryProvider + 'static,
{
    spawn(move || engine.report_as_of(today, latitude, longitude, target))
}

fn spawn(job: impl FnOnce() -> Result<ForecastReport> + Send + 'static) -> ForecastTask {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        // The receiver may already be gone; nobody is left to tell.
        let _ = tx.send(job());
    });
    ForecastTask { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryProvider;
    use crate::domain::{EngineConfig, HistoricalSeries};

    #[test]
    fn invalid_horizon_comes_back_through_the_channel() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let provider = InMemoryProvider::new(HistoricalSeries::new(start, vec![0.0; 3], vec![0.0; 3]).unwrap());
        let engine = Arc::new(ForecastEngine::new(provider, EngineConfig::default()).unwrap());

        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let task = spawn_forecast_as_of(Arc::clone(&engine), today, 10.0, 10.0, today);
        let err = task.wait().unwrap_err();
        assert!(matches!(err, ForecastError::InvalidHorizon { .. }), "{err}");
        assert_eq!(engine.provider().fetch_count(), 0);
    }
}
