use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Signal;

/// Every way a forecast invocation can fail.
///
/// All variants are terminal for the call that produced them: the engine never
/// returns a partial result and never substitutes defaults.
#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    /// The historical source was unreachable, or answered with an incomplete or
    /// misaligned series, after the provider's retry budget was spent.
    ///
    /// `transient` is set only when the last upstream failure was of a
    /// retryable kind (connection error, 429, 5xx gateway status).
    #[error("historical data unavailable: {reason}")]
    DataUnavailable { reason: String, transient: bool },

    /// The target date is not strictly after the last available date.
    #[error("target date {target} must be after the last available date {last_available}")]
    InvalidHorizon {
        target: NaiveDate,
        last_available: NaiveDate,
    },

    /// The smoothing model could not be fitted or produced non-finite output.
    #[error("{signal} model fit failed: {reason}")]
    ModelFitFailure { signal: Signal, reason: String },

    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    /// A background forecast thread ended without delivering an outcome.
    #[error("forecast worker stopped without a result")]
    WorkerStopped,
}

impl ForecastError {
    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
            transient: false,
        }
    }

    /// Unavailable because upstream failed in a way a later call may not.
    pub fn data_unavailable_transient(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
            transient: true,
        }
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// True only for upstream outages and rate limiting. Malformed or
    /// incomplete archive data, rejected requests and every other variant are
    /// properties of the inputs or the data.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DataUnavailable { transient: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
