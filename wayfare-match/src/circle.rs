use crate::cache::EdgePolylineCache;
use crate::geometry::{expand_rect, is_candidate, METERS_PER_DEGREE};
use geo::{Coord, Distance, Euclidean, Intersects, LineString, Point, Polygon, Rect};
use std::cmp::Ordering;
use std::f64::consts::TAU;
use tracing::debug;
use wayfare_graph::{EdgeId, RoadGraph};

/// Number of vertices in the polygonal circle approximation.
pub const CIRCLE_VERTICES: usize = 32;

/// One edge touched by a circular area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleMatch {
    pub edge: EdgeId,
    /// `(radius − nearest approach) / radius`, clamped to `[0, 1]`: 1 for
    /// an edge through the center, approaching 0 at the rim.
    pub score: f64,
}

/// Builds the 32-gon approximating a circle of `radius_m` around `center`.
///
/// The radius is converted to degrees with the flat 111 km factor, matching
/// how the rest of the pipeline measures distance.
pub fn circle_polygon(center: Coord<f64>, radius_m: f64) -> Polygon<f64> {
    let radius_deg = radius_m / METERS_PER_DEGREE;
    #[allow(clippy::cast_precision_loss)]
    let ring: Vec<Coord<f64>> = (0..CIRCLE_VERTICES)
        .map(|i| {
            let angle = TAU * (i as f64) / (CIRCLE_VERTICES as f64);
            Coord {
                x: center.x + radius_deg * angle.cos(),
                y: center.y + radius_deg * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), Vec::new())
}

/// Matches a circular area against the graph.
///
/// An edge matches when any of its segments intersects the circle polygon;
/// the score reflects how deep the edge cuts into the circle. Edges the
/// polygon merely grazes (nearest approach at or beyond the radius) are
/// dropped, so every returned score is positive.
///
/// Edges without shapes are treated as non-matches; a bad edge never aborts
/// the batch.
pub fn match_circle(
    graph: &dyn RoadGraph,
    cache: &EdgePolylineCache,
    center: Coord<f64>,
    radius_m: f64,
) -> Vec<CircleMatch> {
    if radius_m <= 0.0 {
        debug!(radius_m, "skipping circle with non-positive radius");
        return Vec::new();
    }
    let polygon = circle_polygon(center, radius_m);
    let radius_deg = radius_m / METERS_PER_DEGREE;
    let bbox = expand_rect(Rect::new(
        Coord {
            x: center.x - radius_deg,
            y: center.y - radius_deg,
        },
        Coord {
            x: center.x + radius_deg,
            y: center.y + radius_deg,
        },
    ));
    let center_point = Point::from(center);

    let mut matches = Vec::new();
    for edge in graph.edge_ids() {
        let Some((start, end)) = graph.edge_endpoints(edge) else {
            continue;
        };
        if !is_candidate(&bbox, start, end) {
            continue;
        }
        let Some(polyline) = cache.get_or_load(graph, edge) else {
            debug!(edge, "candidate edge has no shape; treating as non-match");
            continue;
        };
        if !polyline.lines().any(|segment| polygon.intersects(&segment)) {
            continue;
        }
        let min_distance_m = Euclidean.distance(&center_point, polyline.as_ref()) * METERS_PER_DEGREE;
        let score = ((radius_m - min_distance_m) / radius_m).max(0.0);
        if score > 0.0 {
            matches.push(CircleMatch { edge, score });
        }
    }

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.edge.cmp(&b.edge))
    });
    matches
}
