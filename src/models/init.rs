//! Initial-state selection for the smoothing recursion.
//!
//! Two strategies:
//!
//! - `heuristic`: level = mean of the first season, seasonals = first-season
//!   deviations, trend = slope between the first two season means.
//! - `estimated`: with the smoothing coefficients fixed, every one-step-ahead
//!   prediction is linear in the initial states, so the states that minimize
//!   the squared one-step errors solve an ordinary least squares problem.
//!
//! Adding `c` to the level and subtracting it from every seasonal state leaves
//! all predictions unchanged. The estimated strategy therefore anchors the
//! level at the first-season mean and solves for the trend and seasonal
//! states only, which makes the design full rank.

use nalgebra::{DMatrix, DVector};

use crate::domain::TrendComponent;
use crate::math::solve_normal_equations;
use crate::models::holt_winters::{FitError, HoltWintersSpec, InitialState, filter};

pub fn heuristic(y: &[f64], period: usize, trend: TrendComponent) -> InitialState {
    let level = mean(&y[..period]);
    let seasonals = y[..period].iter().map(|v| v - level).collect();
    let trend = match trend {
        TrendComponent::None => 0.0,
        TrendComponent::Additive => (mean(&y[period..2 * period]) - level) / period as f64,
    };
    InitialState {
        level,
        trend,
        seasonals,
    }
}

pub fn estimated(y: &[f64], spec: &HoltWintersSpec) -> Result<InitialState, FitError> {
    let m = spec.period;
    let n = y.len();
    let with_trend = spec.trend == TrendComponent::Additive;
    let p = m + usize::from(with_trend);
    let level = mean(&y[..m]);

    // Contribution of the data and the anchored level.
    let anchored = InitialState {
        level,
        trend: 0.0,
        seasonals: vec![0.0; m],
    };
    let mut target = DVector::<f64>::zeros(n);
    filter(y, spec, &anchored, |t, pred| target[t] = y[t] - pred);

    // Response of the predictions to each free initial state.
    let zeros = vec![0.0; n];
    let mut design = DMatrix::<f64>::zeros(n, p);
    for j in 0..p {
        let mut unit = InitialState {
            level: 0.0,
            trend: 0.0,
            seasonals: vec![0.0; m],
        };
        if j < m {
            unit.seasonals[j] = 1.0;
        } else {
            unit.trend = 1.0;
        }
        let mut column = design.column_mut(j);
        filter(&zeros, spec, &unit, |t, pred| column[t] = pred);
    }

    let theta = solve_normal_equations(&design, &target).ok_or(FitError::Singular)?;

    Ok(InitialState {
        level,
        trend: if with_trend { theta[m] } else { 0.0 },
        seasonals: theta.rows(0, m).iter().copied().collect(),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
