//! Year series builder: 365 daily daylight samples per location.
//!
//! Reconciles the continuous astronomy with discrete calendar sampling:
//! one sample per local calendar day, polar days resolved by probing the
//! noon altitude, and a day-over-day change that is defined even at the
//! window's first day.

use crate::sampler::{SolarSampler, nominal_offset};
use crate::types::{DailySample, EngineError, YearSeries};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Days before the reference date at which the window starts.
const WINDOW_LOOKBACK_DAYS: i64 = 182;
/// Total days in the window.
pub const WINDOW_DAYS: usize = 365;

/// An instant at a fixed local wall-clock hour for the given day,
/// using the longitude-nominal offset.
fn local_hour_instant(date: NaiveDate, hour: u32, lng: f64) -> Result<DateTime<Utc>, EngineError> {
    let offset = nominal_offset(lng);
    let naive = date.and_hms_opt(hour, 0, 0).ok_or(EngineError::Sampler {
        date,
        message: format!("invalid local time {hour}:00"),
    })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(EngineError::Sampler {
            date,
            message: format!("unrepresentable local time {hour}:00"),
        })
}

/// Daylight hours for one day if it is a regular (non-polar) day.
///
/// Returns `None` when sunrise or sunset is missing or the difference is
/// non-finite, which callers treat as the polar-extreme signal.
fn regular_daylight_hours(
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
) -> Option<f64> {
    let (rise, set) = (sunrise?, sunset?);
    let hours = (set - rise).num_milliseconds() as f64 / 3_600_000.0;
    if hours.is_finite() {
        Some(hours.clamp(0.0, 24.0))
    } else {
        None
    }
}

/// Builds the 365-day series for a coordinate, centered on
/// `reference_date` (182 days back, 182 days forward).
///
/// A sampler failure on any day aborts the build for this location;
/// days are never silently skipped.
pub fn build_year_series(
    sampler: &dyn SolarSampler,
    lat: f64,
    lng: f64,
    reference_date: NaiveDate,
) -> Result<YearSeries, EngineError> {
    let start = reference_date - Duration::days(WINDOW_LOOKBACK_DAYS);
    let mut samples = Vec::with_capacity(WINDOW_DAYS);

    for i in 0..WINDOW_DAYS as i64 {
        let date = start + Duration::days(i);
        let times = sampler.times_for(date, lat, lng)?;

        let altitude_9am = sampler.altitude_at(local_hour_instant(date, 9, lng)?, lat, lng)?;
        let altitude_3pm = sampler.altitude_at(local_hour_instant(date, 15, lng)?, lat, lng)?;
        let max_altitude = sampler.altitude_at(times.transit, lat, lng)?;

        let sample = match regular_daylight_hours(times.sunrise, times.sunset) {
            Some(daylight_hours) => DailySample {
                date,
                sunrise: times.sunrise,
                sunset: times.sunset,
                solar_noon: times.transit,
                max_altitude,
                altitude_9am,
                altitude_3pm,
                daylight_hours,
                is_polar_extreme: false,
                is_today: date == reference_date,
                change_minutes: 0.0,
            },
            None => {
                // Sun never crosses the horizon: classify by the noon
                // altitude. Above horizon means 24h of daylight.
                let noon_altitude =
                    sampler.altitude_at(local_hour_instant(date, 12, lng)?, lat, lng)?;
                DailySample {
                    date,
                    sunrise: None,
                    sunset: None,
                    solar_noon: times.transit,
                    max_altitude,
                    altitude_9am,
                    altitude_3pm,
                    daylight_hours: if noon_altitude > 0.0 { 24.0 } else { 0.0 },
                    is_polar_extreme: true,
                    is_today: date == reference_date,
                    change_minutes: 0.0,
                }
            }
        };
        samples.push(sample);
    }

    for i in 1..samples.len() {
        samples[i].change_minutes =
            (samples[i].daylight_hours - samples[i - 1].daylight_hours) * 60.0;
    }

    if let Some(first) = samples.first() {
        let day_before = first.date - Duration::days(1);
        // Sample the day before the window directly rather than from the
        // series, so index 0 carries a real delta too.
        let before_daylight = sampler
            .times_for(day_before, lat, lng)
            .ok()
            .and_then(|t| regular_daylight_hours(t.sunrise, t.sunset));

        samples[0].change_minutes = match before_daylight {
            Some(before) => (samples[0].daylight_hours - before) * 60.0,
            None => samples.get(1).map(|s| s.change_minutes).unwrap_or(0.0),
        };
    }

    Ok(YearSeries::new(lat, lng, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{DayTimes, SpaSampler};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 30).unwrap()
    }

    #[test]
    fn test_mid_latitude_series_shape() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 40.7128, -74.006, reference()).unwrap();

        assert_eq!(series.len(), 365);
        for sample in series.samples() {
            assert!(!sample.is_polar_extreme);
            assert!((0.0..=24.0).contains(&sample.daylight_hours));
            assert!(sample.sunrise.is_some() && sample.sunset.is_some());
        }
    }

    #[test]
    fn test_exactly_one_today() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 40.7128, -74.006, reference()).unwrap();
        let todays: Vec<_> = series.samples().iter().filter(|s| s.is_today).collect();
        assert_eq!(todays.len(), 1);
        assert_eq!(todays[0].date, reference());
    }

    #[test]
    fn test_dates_consecutive_and_window_placement() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 52.52, 13.405, reference()).unwrap();
        let samples = series.samples();
        assert_eq!(samples[0].date, reference() - Duration::days(182));
        for w in samples.windows(2) {
            assert_eq!(w[1].date - w[0].date, Duration::days(1));
        }
    }

    #[test]
    fn test_change_consistency() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 40.7128, -74.006, reference()).unwrap();
        let samples = series.samples();
        for i in 1..samples.len() {
            let expected = (samples[i].daylight_hours - samples[i - 1].daylight_hours) * 60.0;
            assert!((samples[i].change_minutes - expected).abs() < 1e-9);
        }
        // Index 0 gets a real delta from the synthesized day before.
        assert!(samples[0].change_minutes.abs() > 0.0);
        assert!(samples[0].change_minutes.abs() < 10.0);
    }

    #[test]
    fn test_polar_extremes_at_high_latitude() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 78.22, 15.64, reference()).unwrap();

        assert_eq!(series.len(), 365);
        let polar_day = series
            .samples()
            .iter()
            .find(|s| s.is_polar_extreme && s.daylight_hours == 24.0);
        let polar_night = series
            .samples()
            .iter()
            .find(|s| s.is_polar_extreme && s.daylight_hours == 0.0);
        // Svalbard sees both extremes within any 365-day window.
        assert!(polar_day.is_some());
        assert!(polar_night.is_some());
        for s in series.samples().iter().filter(|s| s.is_polar_extreme) {
            assert!(s.sunrise.is_none() && s.sunset.is_none());
        }
    }

    #[test]
    fn test_pole_polar_night_and_day() {
        let sampler = SpaSampler::new();
        let series = build_year_series(&sampler, 90.0, 0.0, reference()).unwrap();
        let dark = series
            .samples()
            .iter()
            .find(|s| s.date == NaiveDate::from_ymd_opt(2025, 12, 21).unwrap())
            .unwrap();
        assert!(dark.is_polar_extreme);
        assert_eq!(dark.daylight_hours, 0.0);

        let bright = series
            .samples()
            .iter()
            .find(|s| s.date == NaiveDate::from_ymd_opt(2025, 6, 21).unwrap())
            .unwrap();
        assert!(bright.is_polar_extreme);
        assert_eq!(bright.daylight_hours, 24.0);
    }

    struct FailingSampler {
        fail_on: NaiveDate,
        inner: SpaSampler,
    }

    impl SolarSampler for FailingSampler {
        fn times_for(
            &self,
            date: NaiveDate,
            lat: f64,
            lng: f64,
        ) -> Result<DayTimes, EngineError> {
            if date == self.fail_on {
                return Err(EngineError::Sampler {
                    date,
                    message: "synthetic failure".to_string(),
                });
            }
            self.inner.times_for(date, lat, lng)
        }

        fn altitude_at(
            &self,
            instant: DateTime<Utc>,
            lat: f64,
            lng: f64,
        ) -> Result<f64, EngineError> {
            self.inner.altitude_at(instant, lat, lng)
        }
    }

    #[test]
    fn test_sampler_failure_propagates() {
        let sampler = FailingSampler {
            fail_on: reference() + Duration::days(10),
            inner: SpaSampler::new(),
        };
        let result = build_year_series(&sampler, 40.0, -74.0, reference());
        assert!(matches!(result, Err(EngineError::Sampler { .. })));
    }

    #[test]
    fn test_change_zero_falls_back_to_next_day_delta() {
        // Day before the window is polar night at Svalbard in late
        // December, so index 0 cannot get a direct delta and copies
        // index 1.
        let sampler = SpaSampler::new();
        let reference = NaiveDate::from_ymd_opt(2025, 6, 25).unwrap();
        let series = build_year_series(&sampler, 78.22, 15.64, reference).unwrap();
        let samples = series.samples();
        // Window starts 2024-12-25, deep in polar night.
        assert!(samples[0].is_polar_extreme);
        assert_eq!(samples[0].change_minutes, samples[1].change_minutes);
    }
}
