//! # Host-router contracts
//!
//! The overlay pipeline never owns a road graph or a shortest-path search.
//! This crate defines the narrow surface it consumes from the host router:
//! an edge-addressable graph, the weighting abstraction it wraps, and the
//! string-keyed hint bag that carries per-request flags.
//!
//! Everything here is deliberately free of overlay semantics so that the
//! host side can implement these traits without depending on the rest of
//! the workspace.

mod graph;
mod hints;
mod vehicle;
mod weighting;

pub use graph::{EdgeId, MemoryRoadGraph, RoadGraph};
pub use hints::{HintValue, RequestHints};
pub use vehicle::{RoutingProfile, VehicleClass};
pub use weighting::{SpeedBasedWeighting, Weighting};
