//! Additive seasonal exponential smoothing (Holt-Winters).
//!
//! State recursion for an observation `y_t` with season length `m`:
//!
//! ```text
//! ŷ_t = l_{t−1} + b_{t−1} + s_{t−m}
//! l_t = α(y_t − s_{t−m}) + (1−α)(l_{t−1} + b_{t−1})
//! b_t = β(l_t − l_{t−1}) + (1−β) b_{t−1}
//! s_t = γ(y_t − l_{t−1} − b_{t−1}) + (1−γ) s_{t−m}
//! ```
//!
//! Without a trend component `b` stays at zero and `β` is unused. The `h`-step
//! forecast after `n` observations is `l_n + h·b_n` plus the latest seasonal
//! state of the same phase.
//!
//! The smoothing coefficients are fixed inputs; only the initial states are
//! derived from the data (see [`crate::models::init`]).

use thiserror::Error;

use crate::domain::{Initialization, SmoothingParams, TrendComponent};
use crate::models::init;

/// Why a series could not be fitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("need at least {required} observations (two seasons), got {actual}")]
    TooShort { required: usize, actual: usize },
    #[error("observation {index} is not finite")]
    NonFinite { index: usize },
    #[error("series has zero variance")]
    ZeroVariance,
    #[error("initial-state least squares problem is singular")]
    Singular,
    #[error("model produced a non-finite {what}")]
    NonFiniteOutput { what: &'static str },
}

/// Everything needed to fit one model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltWintersSpec {
    pub period: usize,
    pub params: SmoothingParams,
    pub trend: TrendComponent,
    pub initialization: Initialization,
}

/// States at `t = 0`, before the first observation.
///
/// `seasonals[j]` is `s_{j−m}`, i.e. the state consumed by observation `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub level: f64,
    pub trend: f64,
    pub seasonals: Vec<f64>,
}

/// States after the last observation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilterState {
    pub level: f64,
    pub trend: f64,
    /// Ring buffer indexed by `t % m`: the latest seasonal state per phase.
    pub seasonals: Vec<f64>,
}

/// Run the recursion over `y`, reporting each one-step-ahead prediction.
///
/// The map `(y, init) → predictions` is linear, which is what the estimated
/// initialization relies on.
pub(crate) fn filter(
    y: &[f64],
    spec: &HoltWintersSpec,
    init: &InitialState,
    mut on_step: impl FnMut(usize, f64),
) -> FilterState {
    let SmoothingParams { alpha, beta, gamma } = spec.params;
    let m = init.seasonals.len();
    let with_trend = spec.trend == TrendComponent::Additive;

    let mut level = init.level;
    let mut trend = if with_trend { init.trend } else { 0.0 };
    let mut seasonals = init.seasonals.clone();

    for (t, &obs) in y.iter().enumerate() {
        let phase = t % m;
        let season = seasonals[phase];
        on_step(t, level + trend + season);

        let next_level = alpha * (obs - season) + (1.0 - alpha) * (level + trend);
        let next_trend = if with_trend {
            beta * (next_level - level) + (1.0 - beta) * trend
        } else {
            0.0
        };
        seasonals[phase] = gamma * (obs - level - trend) + (1.0 - gamma) * season;
        level = next_level;
        trend = next_trend;
    }

    FilterState {
        level,
        trend,
        seasonals,
    }
}

/// A fitted model, ready to forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedHoltWinters {
    spec: HoltWintersSpec,
    initial: InitialState,
    state: FilterState,
    n_obs: usize,
    sse: f64,
}

impl HoltWintersSpec {
    /// Fit the model to `y`.
    pub fn fit(&self, y: &[f64]) -> Result<FittedHoltWinters, FitError> {
        check_series(y, self.period)?;

        let initial = match self.initialization {
            Initialization::Estimated => init::estimated(y, self)?,
            Initialization::Heuristic => init::heuristic(y, self.period, self.trend),
        };

        let mut sse = 0.0;
        let state = filter(y, self, &initial, |t, pred| {
            let e = y[t] - pred;
            sse += e * e;
        });

        if !(state.level.is_finite() && state.trend.is_finite()) {
            return Err(FitError::NonFiniteOutput { what: "level/trend state" });
        }
        if !state.seasonals.iter().all(|s| s.is_finite()) {
            return Err(FitError::NonFiniteOutput { what: "seasonal state" });
        }

        Ok(FittedHoltWinters {
            spec: *self,
            initial,
            state,
            n_obs: y.len(),
            sse,
        })
    }
}

fn check_series(y: &[f64], period: usize) -> Result<(), FitError> {
    let required = 2 * period;
    if y.len() < required {
        return Err(FitError::TooShort {
            required,
            actual: y.len(),
        });
    }
    if let Some(index) = y.iter().position(|v| !v.is_finite()) {
        return Err(FitError::NonFinite { index });
    }

    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let variance = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if variance <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(FitError::ZeroVariance);
    }
    Ok(())
}

impl FittedHoltWinters {
    pub fn spec(&self) -> &HoltWintersSpec {
        &self.spec
    }

    pub fn initial_state(&self) -> &InitialState {
        &self.initial
    }

    pub fn level(&self) -> f64 {
        self.state.level
    }

    pub fn trend(&self) -> f64 {
        self.state.trend
    }

    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Sum of squared one-step-ahead errors over the fitted history.
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Forecast `h ≥ 1` steps past the last observation.
    pub fn forecast_at(&self, h: usize) -> Option<f64> {
        if h == 0 {
            return None;
        }
        let m = self.state.seasonals.len();
        let phase = (self.n_obs + h - 1) % m;
        Some(self.state.level + h as f64 * self.state.trend + self.state.seasonals[phase])
    }

    /// Forecast steps `1..=steps`.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        (1..=steps).filter_map(|h| self.forecast_at(h)).collect()
    }
}
