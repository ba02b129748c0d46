//! Daylight timeline engine: per-location year series of sunrise,
//! sunset, and day length, with timezone resolution, caching, and the
//! selection presenter used by interactive frontends.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod engine;
pub mod error;
pub mod locations;
pub mod output;
pub mod presenter;
pub mod sampler;
pub mod selector;
pub mod series;
pub mod timezone;
pub mod types;
