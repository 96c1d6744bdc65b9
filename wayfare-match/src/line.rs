use crate::cache::EdgePolylineCache;
use crate::geometry::{direction_cosine, expand_rect, is_candidate, METERS_PER_DEGREE};
use geo::{BoundingRect, Euclidean, HausdorffDistance, Length, LineString};
use std::cmp::Ordering;
use tracing::debug;
use wayfare_graph::{EdgeId, RoadGraph};

/// Feed-specific matching thresholds for line-to-edge matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMatchParams {
    /// Distance at which the distance score reaches zero, in meters.
    pub max_distance_m: f64,
    /// Minimum accepted blended score.
    pub min_score: f64,
}

impl LineMatchParams {
    /// Discouraged-road corridors: generous distance, moderate threshold.
    pub const EDS: Self = Self {
        max_distance_m: 50.0,
        min_score: 0.6,
    };

    /// Speed-limit corridors: a wrong match would change costs on the wrong
    /// road, so both knobs are tighter.
    pub const SPEED_LIMIT: Self = Self {
        max_distance_m: 30.0,
        min_score: 0.7,
    };
}

/// One matched edge, with its blended score in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMatch {
    pub edge: EdgeId,
    pub score: f64,
}

/// Scores how well an edge shape corresponds to a query corridor.
///
/// The blend is 0.4 proximity + 0.3 length agreement + 0.3 heading
/// agreement:
///
/// * proximity: symmetric Hausdorff distance in degrees, converted to
///   meters, scaled so it hits zero at `max_distance_m`;
/// * length agreement: ratio of the shorter to the longer polyline;
/// * heading agreement: `|cos|` of the angle between start→end headings
///   (undirected; `0.5` when either shape is degenerate).
///
/// Identical polylines score exactly 1.
pub fn score_line_pair(query: &LineString<f64>, edge: &LineString<f64>, max_distance_m: f64) -> f64 {
    let hausdorff_deg = query.hausdorff_distance(edge);
    let distance_m = hausdorff_deg * METERS_PER_DEGREE;
    let distance_score = (1.0 - distance_m / max_distance_m).max(0.0);

    let query_len = Euclidean.length(query);
    let edge_len = Euclidean.length(edge);
    let longer = query_len.max(edge_len);
    let length_ratio = if longer > 0.0 {
        query_len.min(edge_len) / longer
    } else {
        1.0
    };

    let direction = direction_cosine(query, edge);

    0.4 * distance_score + 0.3 * length_ratio + 0.3 * direction
}

/// Matches a corridor polyline against the graph.
///
/// Returns every edge whose score clears `params.min_score`, sorted by
/// descending score with ties broken by ascending edge id. The result is
/// empty for degenerate queries (fewer than two points).
pub fn match_line(
    graph: &dyn RoadGraph,
    cache: &EdgePolylineCache,
    query: &LineString<f64>,
    params: LineMatchParams,
) -> Vec<LineMatch> {
    if query.0.len() < 2 {
        debug!("skipping degenerate query polyline ({} points)", query.0.len());
        return Vec::new();
    }
    let Some(bbox) = query.bounding_rect() else {
        return Vec::new();
    };
    let bbox = expand_rect(bbox);

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
        let score = score_line_pair(query, &polyline, params.max_distance_m);
        if score >= params.min_score {
            matches.push(LineMatch { edge, score });
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
