//! Logical clock and delay abstractions.
//!
//! TTL checks, debounce deadlines, and retry backoff all read time
//! through [`Clock`] and pause through [`Delay`], so tests drive them
//! with a manual clock instead of wall-clock waits.

use chrono::{DateTime, Utc};
use std::cell::Cell;
use std::time::Duration;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub trait Delay {
    fn sleep(&self, duration: Duration);
}

/// Blocking sleep on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock for tests. Also usable as a [`Delay`] that
/// advances itself instead of sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        self.now.set(instant);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl Delay for ManualClock {
    fn sleep(&self, duration: Duration) {
        self.advance(chrono::Duration::from_std(duration).unwrap_or_default());
    }
}
