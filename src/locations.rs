//! Location set semantics: capacity-3 active set, recent history, the
//! persisted JSON shapes, and the shareable-link encoding.
//!
//! The engine supplies these shapes and rules; actual storage and
//! geocoding belong to the host.

use crate::types::{Location, TimezoneInfo};
use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_LOCATIONS: usize = 3;
pub const RECENT_LIMIT: usize = 10;

/// Fixed storage keys the host persists under.
pub const ACTIVE_STORAGE_KEY: &str = "activeLocations";
pub const RECENT_STORAGE_KEY: &str = "recentLocations";

/// Query parameter carrying the shareable-link payload.
pub const SHARE_PARAM: &str = "locs";

/// The active set: newest first, at most three, exactly one primary
/// when non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationSet {
    locations: Vec<Location>,
}

impl LocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_locations(locations: Vec<Location>) -> Self {
        let mut set = Self::new();
        // Replay in reverse so the first entry ends up at the front.
        for location in locations.into_iter().rev() {
            set.add(location);
        }
        set
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn primary(&self) -> Option<&Location> {
        self.locations.iter().find(|l| l.is_primary)
    }

    /// Adds at the front. At capacity the oldest (back) entry is
    /// evicted first; duplicates by coordinate are ignored.
    pub fn add(&mut self, mut location: Location) -> bool {
        if self
            .locations
            .iter()
            .any(|l| l.same_coordinates(location.lat, location.lng))
        {
            return false;
        }
        if self.locations.len() >= MAX_LOCATIONS {
            self.locations.pop();
        }
        if self.locations.is_empty() {
            location.is_primary = true;
        } else if location.is_primary {
            for l in &mut self.locations {
                l.is_primary = false;
            }
        }
        self.locations.insert(0, location);
        // Eviction may have taken the primary with it.
        if !self.locations.iter().any(|l| l.is_primary) {
            self.locations[0].is_primary = true;
        }
        self.reassign_colors();
        true
    }

    /// Removes by index. Removing the front entry promotes the new
    /// front to primary.
    pub fn remove(&mut self, index: usize) -> Option<Location> {
        if index >= self.locations.len() {
            return None;
        }
        let removed = self.locations.remove(index);
        if index == 0 && !self.locations.is_empty() {
            self.locations[0].is_primary = true;
        }
        self.reassign_colors();
        Some(removed)
    }

    pub fn set_primary(&mut self, index: usize) {
        if index >= self.locations.len() {
            return;
        }
        for (i, l) in self.locations.iter_mut().enumerate() {
            l.is_primary = i == index;
        }
    }

    /// Attaches a resolved timezone to the matching location. Returns
    /// false when the location was removed while resolution was in
    /// flight, in which case the result is discarded.
    pub fn attach_timezone(&mut self, lat: f64, lng: f64, info: &TimezoneInfo) -> bool {
        match self
            .locations
            .iter_mut()
            .find(|l| l.same_coordinates(lat, lng))
        {
            Some(location) => {
                location.timezone_offset = Some(info.offset_hours);
                location.timezone_name = Some(info.name.clone());
                location.timezone_source = Some(info.source);
                true
            }
            None => false,
        }
    }

    fn reassign_colors(&mut self) {
        for (i, l) in self.locations.iter_mut().enumerate() {
            l.color_index = i;
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.locations).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let locations: Vec<Location> = serde_json::from_str(json)?;
        let mut set = Self { locations };
        set.reassign_colors();
        Ok(set)
    }
}

/// Bounded most-recent-first history, deduplicated by coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentLocations {
    entries: Vec<Location>,
}

impl RecentLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    pub fn push(&mut self, location: Location) {
        self.entries
            .retain(|l| !l.same_coordinates(location.lat, location.lng));
        self.entries.insert(0, location);
        self.entries.truncate(RECENT_LIMIT);
    }
}

/// Shareable-link record: `{n, la, ln, p}` with 4-decimal coordinates.
#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    n: String,
    #[serde(deserialize_with = "number_or_string")]
    la: f64,
    #[serde(deserialize_with = "number_or_string")]
    ln: f64,
    #[serde(default)]
    p: u8,
}

/// Links built by hand or by older builds carry coordinates as strings;
/// accept both.
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Encodes locations as the `locs` query-parameter value.
pub fn encode_share_param(locations: &[Location]) -> String {
    let records: Vec<LinkRecord> = locations
        .iter()
        .map(|l| LinkRecord {
            n: l.name.clone(),
            la: round4(l.lat),
            ln: round4(l.lng),
            p: if l.is_primary { 1 } else { 0 },
        })
        .collect();
    serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string())
}

/// Reconstructs locations from a `locs` value. The host clears the
/// parameter from the address bar after a successful load.
pub fn decode_share_param(value: &str) -> Result<Vec<Location>, serde_json::Error> {
    let records: Vec<LinkRecord> = serde_json::from_str(value)?;
    Ok(records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let mut location = Location::new(r.n, r.la, r.ln);
            location.is_primary = r.p == 1;
            location.color_index = i;
            location
        })
        .collect())
}
