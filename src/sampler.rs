//! Astronomical sampler: the engine's only window onto the astronomy.
//!
//! Wraps the `solar-positioning` SPA implementation behind a small trait
//! so the series builder can be tested against synthetic skies.

use crate::types::EngineError;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use solar_positioning::time::DeltaT;
use solar_positioning::{Horizon, RefractionCorrection, SunriseResult, spa};

/// Sunrise, sunset, and solar noon for one calendar day.
///
/// `sunrise`/`sunset` are `None` on polar days and nights; `transit`
/// (solar noon) exists regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayTimes {
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub transit: DateTime<Utc>,
}

pub trait SolarSampler {
    /// Sun times for `date` interpreted as the local calendar day at the
    /// given coordinate.
    fn times_for(&self, date: NaiveDate, lat: f64, lng: f64) -> Result<DayTimes, EngineError>;

    /// Sun elevation above the horizon in degrees at an exact instant.
    fn altitude_at(&self, instant: DateTime<Utc>, lat: f64, lng: f64)
    -> Result<f64, EngineError>;
}

/// Production sampler backed by the NREL SPA algorithm.
#[derive(Debug, Clone)]
pub struct SpaSampler {
    elevation: f64,
    refraction: Option<RefractionCorrection>,
}

impl SpaSampler {
    pub fn new() -> Self {
        Self {
            elevation: 0.0,
            refraction: Some(RefractionCorrection::standard()),
        }
    }
}

impl Default for SpaSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Nominal timezone for a longitude (15 degrees per hour), used to pin
/// the calculation day so sunrise/sunset land on the local date rather
/// than the UTC one.
pub fn nominal_offset(lng: f64) -> FixedOffset {
    let hours = (lng / 15.0).round() as i32;
    FixedOffset::east_opt(hours.clamp(-12, 14) * 3600).expect("clamped offset is in range")
}

impl SolarSampler for SpaSampler {
    fn times_for(&self, date: NaiveDate, lat: f64, lng: f64) -> Result<DayTimes, EngineError> {
        let offset = nominal_offset(lng);
        let midnight = date.and_hms_opt(0, 0, 0).ok_or(EngineError::Sampler {
            date,
            message: "invalid date".to_string(),
        })?;
        let dt = offset
            .from_local_datetime(&midnight)
            .single()
            .ok_or(EngineError::Sampler {
                date,
                message: "unrepresentable local midnight".to_string(),
            })?;

        let delta_t = DeltaT::estimate_from_date_like(dt).unwrap_or(0.0);
        let result = spa::sunrise_sunset_for_horizon(dt, lat, lng, delta_t, Horizon::SunriseSunset)
            .map_err(|e| EngineError::Sampler {
                date,
                message: e.to_string(),
            })?;

        Ok(match result {
            SunriseResult::RegularDay {
                sunrise,
                transit,
                sunset,
            } => DayTimes {
                sunrise: Some(sunrise.with_timezone(&Utc)),
                sunset: Some(sunset.with_timezone(&Utc)),
                transit: transit.with_timezone(&Utc),
            },
            SunriseResult::AllDay { transit } | SunriseResult::AllNight { transit } => DayTimes {
                sunrise: None,
                sunset: None,
                transit: transit.with_timezone(&Utc),
            },
        })
    }

    fn altitude_at(
        &self,
        instant: DateTime<Utc>,
        lat: f64,
        lng: f64,
    ) -> Result<f64, EngineError> {
        let delta_t = DeltaT::estimate_from_date_like(instant).unwrap_or(0.0);
        let position = spa::solar_position(instant, lat, lng, self.elevation, delta_t, self.refraction)
            .map_err(|e| EngineError::Sampler {
                date: instant.date_naive(),
                message: e.to_string(),
            })?;
        Ok(position.elevation_angle())
    }
}
