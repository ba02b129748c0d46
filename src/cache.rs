//! Time-bounded, insertion-ordered caches keyed by rounded coordinates.
//!
//! Eviction is plain FIFO: repeated lookups do not protect an entry.
//! Recomputation is cheap arithmetic, so staleness tolerance matters
//! more than hit-rate optimality here.

use chrono::{DateTime, Duration, Utc};

/// Cache key for a coordinate, rounded to 4 decimals (~11 m).
pub fn coord_key(lat: f64, lng: f64) -> String {
    format!("{:.4},{:.4}", lat, lng)
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: Vec<(String, Entry<V>)>,
    capacity: usize,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            ttl,
        }
    }

    /// Returns the cached value unless it is missing or older than the
    /// TTL. Expired entries stay in place; `put` overwrites them.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<&V> {
        let entry = self
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, e)| e)?;
        if now - entry.computed_at < self.ttl {
            Some(&entry.value)
        } else {
            None
        }
    }

    /// Inserts or overwrites. An overwrite keeps the key's insertion
    /// position; a fresh insert may evict the oldest entry.
    pub fn put(&mut self, key: String, value: V, now: DateTime<Utc>) {
        let entry = Entry {
            value,
            computed_at: now,
        };
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = entry;
            return;
        }
        self.entries.push((key, entry));
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
