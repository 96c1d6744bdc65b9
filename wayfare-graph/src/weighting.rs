use crate::graph::{EdgeId, RoadGraph};
use geo::{Distance, Haversine, Point};
use std::sync::Arc;

/// The cost function consumed by the host's shortest-path search.
///
/// The five operations mirror what flexible routing cores expose; anything
/// wrapping a weighting can implement all of them by delegation.
///
/// `min_weight_per_distance` is the lower bound used by the host for
/// optimality checks (A* admissibility, alternative-route pruning). Wrappers
/// that only ever *increase* edge weights may delegate it unchanged.
pub trait Weighting: Send + Sync {
    /// The cost of traversing `edge` in the given direction.
    fn edge_weight(&self, edge: EdgeId, reverse: bool) -> f64;

    /// The traversal time of `edge` in milliseconds.
    fn edge_millis(&self, edge: EdgeId, reverse: bool) -> u64;

    /// The cost of the turn from `in_edge` to `out_edge` via `via_node`.
    fn turn_weight(&self, in_edge: EdgeId, via_node: u32, out_edge: EdgeId) -> f64;

    /// The time of the turn from `in_edge` to `out_edge` in milliseconds.
    fn turn_millis(&self, in_edge: EdgeId, via_node: u32, out_edge: EdgeId) -> u64;

    /// The minimum weight per meter over the whole graph.
    fn min_weight_per_distance(&self) -> f64;

    /// Whether this weighting models turn costs at all.
    fn has_turn_costs(&self) -> bool;
}

/// A plain travel-time weighting over a [`RoadGraph`].
///
/// Weight and time are both derived from the edge length at its baseline
/// speed. Real hosts bring their own weighting; this one exists for tests
/// and for hosts that want a trivially correct base to wrap.
pub struct SpeedBasedWeighting {
    graph: Arc<dyn RoadGraph>,
    max_speed_kph: f64,
}

impl SpeedBasedWeighting {
    /// Creates a weighting over the graph.
    ///
    /// `max_speed_kph` caps the speed used for the per-distance lower bound
    /// and must be at least as large as any baseline speed in the graph.
    pub fn new(graph: Arc<dyn RoadGraph>, max_speed_kph: f64) -> Self {
        Self {
            graph,
            max_speed_kph,
        }
    }

    fn edge_seconds(&self, edge: EdgeId) -> Option<f64> {
        let polyline = self.graph.edge_polyline(edge)?;
        let speed = self.graph.baseline_speed_kph(edge)?;
        if speed <= 0.0 {
            return None;
        }
        let meters: f64 = polyline
            .0
            .windows(2)
            .map(|pair| Haversine.distance(Point::from(pair[0]), Point::from(pair[1])))
            .sum();
        Some(meters / (speed / 3.6))
    }
}

impl Weighting for SpeedBasedWeighting {
    fn edge_weight(&self, edge: EdgeId, _reverse: bool) -> f64 {
        self.edge_seconds(edge).unwrap_or(f64::INFINITY)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn edge_millis(&self, edge: EdgeId, _reverse: bool) -> u64 {
        self.edge_seconds(edge)
            .map_or(u64::MAX, |secs| (secs * 1000.0).round() as u64)
    }

    fn turn_weight(&self, _in_edge: EdgeId, _via_node: u32, _out_edge: EdgeId) -> f64 {
        0.0
    }

    fn turn_millis(&self, _in_edge: EdgeId, _via_node: u32, _out_edge: EdgeId) -> u64 {
        0
    }

    fn min_weight_per_distance(&self) -> f64 {
        1.0 / (self.max_speed_kph / 3.6)
    }

    fn has_turn_costs(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryRoadGraph;
    use geo::line_string;

    #[test]
    fn weight_is_travel_seconds() {
        let mut graph = MemoryRoadGraph::new();
        // Roughly 1.1 km of due-east road at the equator, at 36 km/h.
        let id = graph.push_edge(
            0,
            1,
            line_string![(x: 0.0, y: 0.0), (x: 0.01, y: 0.0)],
            36.0,
        );
        let weighting = SpeedBasedWeighting::new(Arc::new(graph), 120.0);

        let weight = weighting.edge_weight(id, false);
        // 0.01 degrees of longitude at the equator is ~1113 m; at 10 m/s
        // that is ~111 s.
        assert!((weight - 111.3).abs() < 1.0, "weight was {weight}");
        assert_eq!(weighting.edge_millis(id, false), (weight * 1000.0).round() as u64);
    }

    #[test]
    fn invalid_edge_is_unreachable() {
        let graph = MemoryRoadGraph::new();
        let weighting = SpeedBasedWeighting::new(Arc::new(graph), 120.0);
        assert_eq!(weighting.edge_weight(7, false), f64::INFINITY);
    }
}
