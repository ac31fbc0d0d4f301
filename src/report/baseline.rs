//! Climatological baseline: the historical mean for one calendar day.

use chrono::{Datelike, NaiveDate};

use crate::domain::{Climatology, HistoricalSeries};

/// Mean temperature and rain over every year's row for `target`'s month/day.
///
/// Returns `None` when no row matches (e.g. a 29 February target on a history
/// without leap days).
pub fn climatology(series: &HistoricalSeries, target: NaiveDate) -> Option<Climatology> {
    let (mut temperature, mut rain, mut years) = (0.0, 0.0, 0usize);
    for row in series
        .records()
        .filter(|r| r.date.month() == target.month() && r.date.day() == target.day())
    {
        temperature += row.temperature_mean;
        rain += row.rain_sum;
        years += 1;
    }

    if years == 0 {
        return None;
    }
    Some(Climatology {
        temperature_mean: temperature / years as f64,
        rain_sum: rain / years as f64,
        years,
    })
}
