use geo::{Coord, LineString};
use std::ops::Range;

/// A dense, non-negative edge identifier in `[0, edge_count)`.
///
/// Edge ids and their geometries are immutable for the lifetime of the
/// process; anything derived from them (match results, overlay tables) can
/// therefore be cached indefinitely.
pub type EdgeId = u32;

/// Read-only view of the host's road graph.
///
/// The overlay pipeline iterates edges once per feed refresh and looks up
/// individual edges during weighting, so implementations should make
/// [`RoadGraph::edge_endpoints`] and [`RoadGraph::baseline_speed_kph`]
/// cheap. [`RoadGraph::edge_polyline`] may be more expensive; callers are
/// expected to go through a polyline cache.
///
/// All lookups return `None` for ids outside `[0, edge_count)` rather than
/// panicking. Invalid ids are routine (stale hints, host bugs) and must
/// never abort a batch.
pub trait RoadGraph: Send + Sync {
    /// The number of edges in the graph.
    fn edge_count(&self) -> u32;

    /// The full shape of the edge, as WGS-84 lon/lat coordinates.
    ///
    /// A valid edge has at least two points.
    fn edge_polyline(&self, edge: EdgeId) -> Option<LineString<f64>>;

    /// The first and last coordinate of the edge shape.
    fn edge_endpoints(&self, edge: EdgeId) -> Option<(Coord<f64>, Coord<f64>)>;

    /// The base and adjacent node of the edge.
    fn edge_nodes(&self, edge: EdgeId) -> Option<(u32, u32)>;

    /// The baseline traversal speed encoded in the graph, in km/h.
    fn baseline_speed_kph(&self, edge: EdgeId) -> Option<f64>;

    /// Enumerates all edge ids.
    fn edge_ids(&self) -> Range<EdgeId> {
        0..self.edge_count()
    }
}

struct MemoryEdge {
    polyline: LineString<f64>,
    base_node: u32,
    adjacent_node: u32,
    speed_kph: f64,
}

/// A `Vec`-backed [`RoadGraph`].
///
/// This is the graph used by every test in the workspace. It is exported so
/// hosts can build small fixtures without wiring up a real router.
#[derive(Default)]
pub struct MemoryRoadGraph {
    edges: Vec<MemoryEdge>,
}

impl MemoryRoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an edge and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the polyline has fewer than two points; such an edge could
    /// never exist in a real graph and a fixture containing one is a bug in
    /// the test.
    pub fn push_edge(
        &mut self,
        base_node: u32,
        adjacent_node: u32,
        polyline: LineString<f64>,
        speed_kph: f64,
    ) -> EdgeId {
        assert!(
            polyline.0.len() >= 2,
            "an edge polyline requires at least two points"
        );
        let id = u32::try_from(self.edges.len()).expect("edge count exceeds u32");
        self.edges.push(MemoryEdge {
            polyline,
            base_node,
            adjacent_node,
            speed_kph,
        });
        id
    }

    fn edge(&self, edge: EdgeId) -> Option<&MemoryEdge> {
        self.edges.get(edge as usize)
    }
}

impl RoadGraph for MemoryRoadGraph {
    fn edge_count(&self) -> u32 {
        u32::try_from(self.edges.len()).expect("edge count exceeds u32")
    }

    fn edge_polyline(&self, edge: EdgeId) -> Option<LineString<f64>> {
        self.edge(edge).map(|e| e.polyline.clone())
    }

    fn edge_endpoints(&self, edge: EdgeId) -> Option<(Coord<f64>, Coord<f64>)> {
        let e = self.edge(edge)?;
        Some((*e.polyline.0.first()?, *e.polyline.0.last()?))
    }

    fn edge_nodes(&self, edge: EdgeId) -> Option<(u32, u32)> {
        self.edge(edge).map(|e| (e.base_node, e.adjacent_node))
    }

    fn baseline_speed_kph(&self, edge: EdgeId) -> Option<f64> {
        self.edge(edge).map(|e| e.speed_kph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn out_of_range_lookups_return_none() {
        let mut graph = MemoryRoadGraph::new();
        graph.push_edge(
            0,
            1,
            line_string![(x: 32.0, y: 37.0), (x: 32.001, y: 37.0)],
            50.0,
        );

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge_polyline(1).is_none());
        assert!(graph.edge_endpoints(u32::MAX).is_none());
        assert!(graph.baseline_speed_kph(1).is_none());
    }

    #[test]
    fn endpoints_match_polyline_ends() {
        let mut graph = MemoryRoadGraph::new();
        let id = graph.push_edge(
            0,
            1,
            line_string![(x: 32.0, y: 37.0), (x: 32.5, y: 37.1), (x: 33.0, y: 37.2)],
            50.0,
        );

        let (start, end) = graph.edge_endpoints(id).unwrap();
        assert_eq!(start, geo::coord! { x: 32.0, y: 37.0 });
        assert_eq!(end, geo::coord! { x: 33.0, y: 37.2 });
    }
}
