//! Presentation text: times, durations, trend wording, tooltip and
//! sheet content, and the CLI table.

use crate::selector::{self, MonthlyProjection};
use crate::types::{DailySample, LocationSeries};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use unicode_width::UnicodeWidthStr;

/// HH:MM wall-clock rendering of an instant shifted by a whole-hour
/// UTC offset.
pub fn format_time(instant: DateTime<Utc>, offset_hours: i32) -> String {
    let local = instant + Duration::hours(offset_hours as i64);
    local.format("%H:%M").to_string()
}

/// Decimal hours as `XhYm`, e.g. 13.37 -> "13h 22m".
pub fn format_duration(hours: f64) -> String {
    let whole = hours.floor();
    let minutes = ((hours - whole) * 60.0).round() as i64;
    // 59.6' rounds up to the next hour.
    if minutes == 60 {
        format!("{}h 0m", whole as i64 + 1)
    } else {
        format!("{}h {}m", whole as i64, minutes)
    }
}

/// Signed per-day change, e.g. "+2.1 min/day".
pub fn format_change(minutes: f64) -> String {
    format!("{:+.1} min/day", minutes)
}

/// Sunrise/sunset cell values with polar wording. On a polar day the
/// sun never sets; on a polar night it never rises.
pub fn sunrise_label(sample: &DailySample, offset_hours: i32) -> String {
    if sample.is_polar_extreme {
        if sample.daylight_hours == 24.0 {
            "Polar Day".to_string()
        } else {
            "No sunrise".to_string()
        }
    } else {
        sample
            .sunrise
            .map(|t| format_time(t, offset_hours))
            .unwrap_or_else(|| "-".to_string())
    }
}

pub fn sunset_label(sample: &DailySample, offset_hours: i32) -> String {
    if sample.is_polar_extreme {
        if sample.daylight_hours == 24.0 {
            "No sunset".to_string()
        } else {
            "Polar Night".to_string()
        }
    } else {
        sample
            .sunset
            .map(|t| format_time(t, offset_hours))
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Stats-card sentence for the 30-day outlook.
pub fn forecast_sentence(projection: &MonthlyProjection) -> String {
    let minutes = projection.total_change_minutes;
    if minutes > 0.0 {
        format!(
            "Gaining {:.0} minutes of daylight over the next {} days",
            minutes.abs(),
            projection.days_ahead
        )
    } else if minutes < 0.0 {
        format!(
            "Losing {:.0} minutes of daylight over the next {} days",
            minutes.abs(),
            projection.days_ahead
        )
    } else {
        format!(
            "Daylight remains stable over the next {} days",
            projection.days_ahead
        )
    }
}

/// Compact trend line used inside tooltips.
fn trend_line(projection: &MonthlyProjection) -> String {
    let minutes = projection.total_change_minutes;
    if minutes > 0.0 {
        format!("Gaining {:.0} min over {} days", minutes.abs(), projection.days_ahead)
    } else if minutes < 0.0 {
        format!("Losing {:.0} min over {} days", minutes.abs(), projection.days_ahead)
    } else {
        format!("Stable over {} days", projection.days_ahead)
    }
}

/// First comma segment of a location name ("New York, NY" -> "New York").
fn short_name(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// Desktop tooltip body for one day across all locations. Locations
/// whose series does not cover the day are omitted; returns `None` when
/// nobody covers it.
pub fn tooltip_text(datasets: &[LocationSeries], date: NaiveDate) -> Option<String> {
    let mut lines = vec![date.format("%b %d").to_string()];
    let mut any = false;

    for dataset in datasets {
        let samples = dataset.series.samples();
        let Ok(index) = samples.binary_search_by_key(&date, |s| s.date) else {
            continue;
        };
        any = true;
        let sample = &samples[index];
        let offset = dataset.location.timezone_offset.unwrap_or(0);
        let marker = if dataset.location.is_primary { "*" } else { "-" };

        if sample.is_polar_extreme {
            let wording = if sample.daylight_hours == 24.0 {
                "Polar Day"
            } else {
                "Polar Night"
            };
            lines.push(format!(
                "{} {}: {}",
                marker,
                short_name(&dataset.location.name),
                wording
            ));
        } else {
            lines.push(format!(
                "{} {}: {} · {}",
                marker,
                short_name(&dataset.location.name),
                sunrise_label(sample, offset),
                sunset_label(sample, offset)
            ));
        }

        let arrow = if sample.change_minutes > 0.0 { "▲" } else { "▼" };
        lines.push(format!(
            "    {}  {} {:.1} min/day",
            format_duration(sample.daylight_hours),
            arrow,
            sample.change_minutes.abs()
        ));

        if let Some(projection) = selector::monthly_projection(&dataset.series, index) {
            lines.push(format!("    {}", trend_line(&projection)));
        }
    }

    any.then(|| lines.join("\n"))
}

/// Mobile bottom-sheet body: the primary location only, matching the
/// stats card's single-location scope.
pub fn sheet_text(primary: &LocationSeries, date: NaiveDate) -> Option<String> {
    let samples = primary.series.samples();
    let index = samples.binary_search_by_key(&date, |s| s.date).ok()?;
    let sample = &samples[index];
    let offset = primary.location.timezone_offset.unwrap_or(0);

    let mut lines = vec![
        format!("{} — {}", short_name(&primary.location.name), date.format("%b %d")),
        format!(
            "Sunrise {}   Sunset {}",
            sunrise_label(sample, offset),
            sunset_label(sample, offset)
        ),
        format!(
            "Daylight {}   {}",
            format_duration(sample.daylight_hours),
            format_change(sample.change_minutes)
        ),
    ];
    if let Some(projection) = selector::monthly_projection(&primary.series, index) {
        lines.push(forecast_sentence(&projection));
    }
    Some(lines.join("\n"))
}

/// Today's stats card for the primary location.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayStats {
    pub location_name: String,
    pub timezone_label: String,
    pub sunrise: String,
    pub sunset: String,
    pub daylight: String,
    pub change: String,
    pub forecast: String,
}

pub fn today_stats(dataset: &LocationSeries) -> Option<TodayStats> {
    let index = dataset.series.today_index()?;
    let sample = &dataset.series.samples()[index];
    let offset = dataset.location.timezone_offset.unwrap_or(0);

    let forecast = selector::monthly_projection(&dataset.series, index)
        .map(|p| forecast_sentence(&p))
        .unwrap_or_default();

    Some(TodayStats {
        location_name: dataset.location.name.clone(),
        timezone_label: dataset
            .location
            .timezone_name
            .clone()
            .unwrap_or_else(|| format!("UTC{:+}", offset)),
        sunrise: sunrise_label(sample, offset),
        sunset: sunset_label(sample, offset),
        daylight: format_duration(sample.daylight_hours),
        change: format_change(sample.change_minutes),
        forecast,
    })
}

/// Left-aligned text table with display-width-aware padding.
fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let pad = widths[i] - cell.width();
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![render_row(header)];
    for row in rows {
        out.push(render_row(row));
    }
    out.join("\n")
}

/// Year table for the CLI: one row every `step_days`, always including
/// the today row.
pub fn render_series_table(dataset: &LocationSeries, step_days: usize) -> String {
    let offset = dataset.location.timezone_offset.unwrap_or(0);
    let header: Vec<String> = ["date", "sunrise", "sunset", "daylight", "change"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let step = step_days.max(1);
    let rows: Vec<Vec<String>> = dataset
        .series
        .samples()
        .iter()
        .enumerate()
        .filter(|(i, s)| i % step == 0 || s.is_today)
        .map(|(_, s)| {
            vec![
                format!("{}{}", s.date.format("%Y-%m-%d"), if s.is_today { " *" } else { "" }),
                sunrise_label(s, offset),
                sunset_label(s, offset),
                format_duration(s.daylight_hours),
                format_change(s.change_minutes),
            ]
        })
        .collect();

    render_table(&header, &rows)
}
