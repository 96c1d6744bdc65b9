//! # Overlay pipeline
//!
//! Ties the workspace together: feed snapshots (from `wayfare-feeds`) are
//! matched onto graph edges (via `wayfare-match`) into edge-indexed tables,
//! and a wrapping [`Weighting`](wayfare_graph::Weighting) makes shortest-path
//! queries observe them.
//!
//! The lifecycle object is [`OverlaySystem`]: it owns the feed client, the
//! overlay index, the polyline cache and the background refresh scheduler.
//! Hosts construct one per router instance; nothing in this crate is global.
//!
//! Overlays are best-effort hints. Every failure mode (unreachable feed,
//! malformed record, invalid edge id, empty snapshot) degrades to "overlay
//! inactive", never to a failed route.

mod binder;
mod error;
mod index;
mod scheduler;
mod system;
mod tables;
mod weighting;

pub use binder::{bind_request, hint_keys, AltRouteParams, BoundRequest};
pub use error::OverlayError;
pub use index::OverlayIndex;
pub use system::{OverlayConfig, OverlaySystem};
pub use tables::{
    CustomAreaEntry, CustomAreaTable, EdsEntry, EdsTable, OverlaySample, OverlayStats,
    SpeedLimitEntry, SpeedLimitTable,
};
pub use weighting::{OverlayEdgeFilter, OverlayFlags, OverlayWeighting, AVOIDANCE_MULTIPLIER};
