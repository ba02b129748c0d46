//! Core data model for the daylight timeline engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("solar calculation failed for {date}: {message}")]
    Sampler { date: NaiveDate, message: String },
    #[error("series is empty")]
    EmptySeries,
}

/// One calendar day of a location's year series.
///
/// `sunrise`/`sunset` are unset on polar-extreme days; `solar_noon` is
/// always defined. Altitudes are in degrees above the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySample {
    pub date: NaiveDate,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub solar_noon: DateTime<Utc>,
    pub max_altitude: f64,
    pub altitude_9am: f64,
    pub altitude_3pm: f64,
    /// Hours of daylight, clamped to [0, 24].
    pub daylight_hours: f64,
    pub is_polar_extreme: bool,
    pub is_today: bool,
    /// Day-over-day daylight change in minutes. Always populated in a
    /// finished series; index 0 derives it from a synthesized day-before
    /// sample.
    pub change_minutes: f64,
}

/// Ordered 365-day series for one location, one sample per calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSeries {
    pub latitude: f64,
    pub longitude: f64,
    samples: Vec<DailySample>,
}

impl YearSeries {
    pub fn new(latitude: f64, longitude: f64, samples: Vec<DailySample>) -> Self {
        debug_assert!(samples.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            latitude,
            longitude,
            samples,
        }
    }

    pub fn samples(&self) -> &[DailySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn today_index(&self) -> Option<usize> {
        self.samples.iter().position(|s| s.is_today)
    }

    pub fn today(&self) -> Option<&DailySample> {
        self.today_index().map(|i| &self.samples[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimezoneSource {
    Resolved,
    Fallback,
}

/// Resolved timezone for a coordinate: either an IANA zone name or a
/// synthetic `UTC±H` from the longitude fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    pub name: String,
    pub offset_hours: i32,
    pub source: TimezoneSource,
}

impl fmt::Display for TimezoneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (UTC{:+})", self.name, self.offset_hours)
    }
}

/// A named coordinate as supplied by the location directory.
///
/// Serializes to the JSON shape the directory persists under its fixed
/// storage keys; timezone fields are attached after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub color_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone_source: Option<TimezoneSource>,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            is_primary: false,
            color_index: 0,
            timezone_offset: None,
            timezone_name: None,
            timezone_source: None,
        }
    }

    /// Coordinate identity used for deduplication and stale-resolution
    /// checks: exact lat/lng match, as the directory stores them.
    pub fn same_coordinates(&self, lat: f64, lng: f64) -> bool {
        self.lat == lat && self.lng == lng
    }
}

/// One location's series paired with the location it was built for,
/// in directory order. What the chart renderer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSeries {
    pub location: Location,
    pub series: YearSeries,
}

/// Viewport width below which the presenter switches from desktop
/// tooltips to the mobile bottom sheet.
pub const MOBILE_WIDTH_THRESHOLD: f64 = 768.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    Desktop,
    Mobile,
}

impl DeviceMode {
    pub fn from_viewport_width(width: f64) -> Self {
        if width < MOBILE_WIDTH_THRESHOLD {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }
}
