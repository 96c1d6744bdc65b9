//! # Feed acquisition
//!
//! Three external feeds steer the overlay pipeline: discouraged-road (EDS)
//! corridors, circular custom areas, and per-vehicle-class speed-limit
//! corridors. This crate fetches them over HTTPS, normalizes the wire
//! formats into immutable snapshots, and publishes each snapshot behind an
//! atomic slot.
//!
//! Failure policy throughout: a bad record is skipped with a warning, a bad
//! fetch keeps the previous snapshot. The feeds are hints and must never
//! take routing down with them.

mod client;
mod custom_areas;
mod eds;
mod error;
mod kind;
mod source;
mod speed_limits;

pub use client::FeedClient;
pub use custom_areas::{parse_custom_areas, CustomArea, CustomAreaSnapshot};
pub use eds::{parse_eds, EdsSnapshot};
pub use error::FeedError;
pub use kind::FeedKind;
pub use source::{FeedEndpoints, FeedSource, HttpFeedSource};
pub use speed_limits::{parse_speed_limits, SpeedCorridor, SpeedLimitSnapshot};

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
