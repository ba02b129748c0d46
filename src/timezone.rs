//! Coordinate-to-timezone resolution with retry, backoff, and a
//! longitude fallback.
//!
//! Lookup failures never reach the caller: after three attempts the
//! resolver synthesizes a `UTC±H` zone from the longitude. Results are
//! cached either way.

use crate::cache::{TtlCache, coord_key};
use crate::clock::Delay;
use crate::types::{TimezoneInfo, TimezoneSource};
use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use std::time::Duration as StdDuration;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 100;
const TZ_CACHE_CAPACITY: usize = 100;
/// Zone assignments move much slower than daylight data; cache for a day.
const TZ_CACHE_TTL_HOURS: i64 = 24;

/// Coordinate-to-zone-name lookup capability.
///
/// Returns candidate IANA zone names, most specific first. An empty
/// result and an error are both treated as a failed attempt.
pub trait GeoLookup {
    fn find(&self, lat: f64, lng: f64) -> Result<Vec<String>, String>;
}

/// Production lookup backed by the bundled tzf-rs polygon index.
pub struct TzfLookup {
    finder: tzf_rs::DefaultFinder,
}

impl TzfLookup {
    pub fn new() -> Self {
        Self {
            finder: tzf_rs::DefaultFinder::new(),
        }
    }
}

impl Default for TzfLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoLookup for TzfLookup {
    fn find(&self, lat: f64, lng: f64) -> Result<Vec<String>, String> {
        let name = self.finder.get_tz_name(lng, lat);
        if name.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![name.to_string()])
        }
    }
}

/// Current whole-hour UTC offset of a named zone.
///
/// Compares the hour fields of `now` rendered in the target zone and in
/// UTC, corrects for a calendar-day crossing, and normalizes into the
/// canonical (-12, 14] range.
pub fn zone_offset_hours(zone_name: &str, now: DateTime<Utc>) -> Option<i32> {
    let tz: Tz = zone_name.parse().ok()?;
    let local = now.with_timezone(&tz);

    let mut diff = local.hour() as i32 - now.hour() as i32;
    let day_delta = (local.date_naive() - now.date_naive()).num_days();
    diff += 24 * day_delta as i32;

    if diff > 14 {
        diff -= 24;
    } else if diff <= -12 {
        diff += 24;
    }
    Some(diff)
}

/// Longitude-based offset approximation (15 degrees per hour).
pub fn fallback_info(lng: f64) -> TimezoneInfo {
    let offset_hours = (lng / 15.0).round() as i32;
    TimezoneInfo {
        name: format!("UTC{}{}", if offset_hours >= 0 { "+" } else { "" }, offset_hours),
        offset_hours,
        source: TimezoneSource::Fallback,
    }
}

pub struct TimezoneResolver {
    lookup: Option<Box<dyn GeoLookup>>,
    delay: Box<dyn Delay>,
    cache: TtlCache<TimezoneInfo>,
}

impl TimezoneResolver {
    pub fn new(lookup: Option<Box<dyn GeoLookup>>, delay: Box<dyn Delay>) -> Self {
        Self {
            lookup,
            delay,
            cache: TtlCache::new(TZ_CACHE_CAPACITY, Duration::hours(TZ_CACHE_TTL_HOURS)),
        }
    }

    /// Resolves a coordinate to timezone info. Infallible: lookup
    /// errors degrade to the longitude fallback after retries.
    pub fn resolve(&mut self, lat: f64, lng: f64, now: DateTime<Utc>) -> TimezoneInfo {
        let key = coord_key(lat, lng);
        if let Some(cached) = self.cache.get(&key, now) {
            return cached.clone();
        }

        let info = self
            .lookup_with_retry(lat, lng, now)
            .unwrap_or_else(|| fallback_info(lng));
        self.cache.put(key, info.clone(), now);
        info
    }

    fn lookup_with_retry(&self, lat: f64, lng: f64, now: DateTime<Utc>) -> Option<TimezoneInfo> {
        let lookup = self.lookup.as_ref()?;

        for attempt in 1..=MAX_ATTEMPTS {
            match lookup.find(lat, lng) {
                Ok(zones) if !zones.is_empty() => {
                    let name = zones[0].clone();
                    let offset_hours = zone_offset_hours(&name, now).unwrap_or(0);
                    return Some(TimezoneInfo {
                        name,
                        offset_hours,
                        source: TimezoneSource::Resolved,
                    });
                }
                // Empty result and hard error retry the same way.
                Ok(_) | Err(_) => {
                    if attempt < MAX_ATTEMPTS {
                        self.delay
                            .sleep(StdDuration::from_millis(BACKOFF_BASE_MS * attempt as u64));
                    }
                }
            }
        }
        None
    }
}

/// System timezone as a chrono-tz zone, honoring a `TZ` override.
pub fn system_timezone() -> Tz {
    if let Ok(tz_str) = std::env::var("TZ")
        && let Ok(tz) = tz_str.parse::<Tz>()
    {
        return tz;
    }
    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse::<Tz>().unwrap_or(chrono_tz::UTC),
        Err(_) => chrono_tz::UTC,
    }
}

/// Today's calendar date in the system timezone.
pub fn system_today(now: DateTime<Utc>) -> chrono::NaiveDate {
    now.with_timezone(&system_timezone()).date_naive()
}
