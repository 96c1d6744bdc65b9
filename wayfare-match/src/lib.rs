//! # Geometry matching
//!
//! Corridors arrive as WGS-84 polylines and areas as circles; the road
//! graph speaks in edge ids. This crate bridges the two: given a query
//! geometry, it returns the edges that plausibly correspond to it, each
//! with a match score in `[0, 1]`.
//!
//! Matching iterates the whole edge set with a cheap bounding-box prefilter
//! and only reconstructs full edge shapes for candidates, via a shared LRU
//! cache. Distances are compared in lon/lat degrees and converted with a
//! flat 111 km/degree factor; over corridor-scale distances (tens of
//! meters) the error of that approximation is well inside the scoring
//! tolerances.

mod cache;
mod circle;
mod geometry;
mod line;

pub use cache::EdgePolylineCache;
pub use circle::{match_circle, CircleMatch, CIRCLE_VERTICES};
pub use geometry::METERS_PER_DEGREE;
pub use line::{match_line, score_line_pair, LineMatch, LineMatchParams};
