//! The daylight engine: caches year series per coordinate, resolves
//! timezones, and assembles the per-location datasets the renderers
//! and the CLI consume.

use crate::cache::{TtlCache, coord_key};
use crate::clock::{Clock, Delay, SystemClock, ThreadDelay};
use crate::sampler::{SolarSampler, SpaSampler};
use crate::series::build_year_series;
use crate::timezone::{GeoLookup, TimezoneResolver, TzfLookup, system_today};
use crate::types::{EngineError, Location, LocationSeries, TimezoneInfo, YearSeries};
use chrono::{Duration, NaiveDate};

pub const SERIES_CACHE_CAPACITY: usize = 20;
/// A series embeds "today"; an hour of staleness is acceptable, a day
/// is not.
pub const SERIES_CACHE_TTL_HOURS: i64 = 1;

/// Beyond this latitude the calculation error message blames the poles.
pub const POLAR_NOTICE_LATITUDE: f64 = 85.0;

/// Starting location for a first run with nothing persisted.
pub fn default_location() -> Location {
    let mut location = Location::new("New York, NY", 40.7128, -74.006);
    location.is_primary = true;
    location
}

/// User-facing notice for a location whose series could not be built.
pub fn data_error_notice(location: &Location) -> String {
    if location.lat.abs() > POLAR_NOTICE_LATITUDE {
        "Location is too close to the poles for accurate calculations".to_string()
    } else {
        format!("Unable to calculate daylight for {}", location.name)
    }
}

pub struct DaylightEngine {
    sampler: Box<dyn SolarSampler>,
    resolver: TimezoneResolver,
    clock: Box<dyn Clock>,
    series_cache: TtlCache<YearSeries>,
}

impl DaylightEngine {
    pub fn new() -> Self {
        Self::with_parts(
            Box::new(SpaSampler::new()),
            Some(Box::new(TzfLookup::new())),
            Box::new(ThreadDelay),
            Box::new(SystemClock),
        )
    }

    pub fn with_parts(
        sampler: Box<dyn SolarSampler>,
        lookup: Option<Box<dyn GeoLookup>>,
        delay: Box<dyn Delay>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            sampler,
            resolver: TimezoneResolver::new(lookup, delay),
            clock,
            series_cache: TtlCache::new(
                SERIES_CACHE_CAPACITY,
                Duration::hours(SERIES_CACHE_TTL_HOURS),
            ),
        }
    }

    /// Year series centered on today in the system timezone.
    pub fn year_series(&mut self, lat: f64, lng: f64) -> Result<YearSeries, EngineError> {
        let today = system_today(self.clock.now());
        self.year_series_for(lat, lng, today)
    }

    /// Year series centered on an explicit reference date. Cached per
    /// coordinate; a hit within the TTL skips the rebuild entirely.
    pub fn year_series_for(
        &mut self,
        lat: f64,
        lng: f64,
        reference_date: NaiveDate,
    ) -> Result<YearSeries, EngineError> {
        let now = self.clock.now();
        let key = coord_key(lat, lng);
        if let Some(series) = self.series_cache.get(&key, now) {
            return Ok(series.clone());
        }

        let series = build_year_series(self.sampler.as_ref(), lat, lng, reference_date)?;
        self.series_cache.put(key, series.clone(), now);
        Ok(series)
    }

    pub fn resolve_timezone(&mut self, lat: f64, lng: f64) -> TimezoneInfo {
        let now = self.clock.now();
        self.resolver.resolve(lat, lng, now)
    }

    /// Builds one location's dataset, resolving and attaching its
    /// timezone on the way.
    pub fn dataset(&mut self, location: &Location) -> Result<LocationSeries, EngineError> {
        let today = system_today(self.clock.now());
        self.dataset_for(location, today)
    }

    /// Like [`dataset`](Self::dataset) with an explicit reference date.
    pub fn dataset_for(
        &mut self,
        location: &Location,
        reference_date: NaiveDate,
    ) -> Result<LocationSeries, EngineError> {
        let series = self.year_series_for(location.lat, location.lng, reference_date)?;
        let info = self.resolve_timezone(location.lat, location.lng);

        let mut location = location.clone();
        location.timezone_offset = Some(info.offset_hours);
        location.timezone_name = Some(info.name);
        location.timezone_source = Some(info.source);

        Ok(LocationSeries { location, series })
    }

    /// Datasets for the whole active set, in directory order. Locations
    /// whose series cannot be built are skipped and reported as notices
    /// so the rest of the chart still renders.
    pub fn datasets(&mut self, locations: &[Location]) -> (Vec<LocationSeries>, Vec<String>) {
        let today = system_today(self.clock.now());
        self.datasets_for(locations, today)
    }

    pub fn datasets_for(
        &mut self,
        locations: &[Location],
        reference_date: NaiveDate,
    ) -> (Vec<LocationSeries>, Vec<String>) {
        let mut datasets = Vec::with_capacity(locations.len());
        let mut notices = Vec::new();
        for location in locations {
            match self.dataset_for(location, reference_date) {
                Ok(dataset) => datasets.push(dataset),
                Err(_) => notices.push(data_error_notice(location)),
            }
        }
        (datasets, notices)
    }
}

impl Default for DaylightEngine {
    fn default() -> Self {
        Self::new()
    }
}
