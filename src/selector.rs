//! Nearest-point lookup over one or more year series.
//!
//! The chart renderer converts pixel positions to dates through its own
//! scale; this module resolves those dates to samples.

use crate::types::{DailySample, YearSeries};
use chrono::NaiveDate;

/// Sample closest in time to `target`, by bisection on the ordered
/// date sequence. A tie between two neighbors picks the earlier one;
/// dates outside the window clamp to the first/last sample.
pub fn nearest<'a>(series: &'a YearSeries, target: NaiveDate) -> Option<&'a DailySample> {
    let samples = series.samples();
    if samples.is_empty() {
        return None;
    }

    let idx = samples.partition_point(|s| s.date <= target);
    if idx == 0 {
        return Some(&samples[0]);
    }
    if idx == samples.len() {
        return Some(&samples[samples.len() - 1]);
    }

    let before = &samples[idx - 1];
    let after = &samples[idx];
    let to_before = target - before.date;
    let to_after = after.date - target;
    if to_before <= to_after {
        Some(before)
    } else {
        Some(after)
    }
}

/// Exact calendar-day match across several series, so multi-location
/// tooltips all describe the same visual day. Series without that day
/// contribute nothing.
pub fn cross_series_lookup<'a>(
    series_set: &'a [YearSeries],
    date: NaiveDate,
) -> Vec<(usize, &'a DailySample)> {
    series_set
        .iter()
        .enumerate()
        .filter_map(|(i, series)| {
            let samples = series.samples();
            samples
                .binary_search_by_key(&date, |s| s.date)
                .ok()
                .map(|idx| (i, &samples[idx]))
        })
        .collect()
}

/// Daylight trend over roughly the next month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyProjection {
    pub total_change_minutes: f64,
    /// Actual index distance; shrinks below 30 near the series tail.
    pub days_ahead: usize,
}

/// Compares `series[index]` to the sample 30 days ahead (clamped to the
/// series end).
pub fn monthly_projection(series: &YearSeries, index: usize) -> Option<MonthlyProjection> {
    let samples = series.samples();
    let current = samples.get(index)?;
    let future_index = (index + 30).min(samples.len().checked_sub(1)?);
    let future = &samples[future_index];

    Some(MonthlyProjection {
        total_change_minutes: (future.daylight_hours - current.daylight_hours) * 60.0,
        days_ahead: future_index - index,
    })
}
