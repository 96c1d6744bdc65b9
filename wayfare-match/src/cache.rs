use geo::LineString;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use wayfare_graph::{EdgeId, RoadGraph};

/// A shared LRU cache of edge polylines.
///
/// Reconstructing an edge shape from graph internals is the expensive part
/// of matching, and every feed refresh walks largely the same candidate
/// edges. Edge geometries are immutable, so cached entries stay valid
/// forever and the cache survives across refreshes.
/// [`EdgePolylineCache::clear`] exists as a test hook and only drops
/// derived data.
///
/// Construction happens at most once per edge: the lock is held across the
/// miss path, the same way the tile LRU in a graph reader serializes tile
/// loads.
pub struct EdgePolylineCache {
    cache: Mutex<LruCache<EdgeId, Arc<LineString<f64>>>>,
}

impl EdgePolylineCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the polyline for `edge`, loading it from the graph on a miss.
    ///
    /// Returns `None` when the graph has no shape for the edge (invalid id);
    /// nothing is cached in that case.
    pub fn get_or_load(&self, graph: &dyn RoadGraph, edge: EdgeId) -> Option<Arc<LineString<f64>>> {
        // A poisoned lock means a panic elsewhere mid-operation; the cached
        // shapes themselves are still valid, so keep going.
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(polyline) = cache.get(&edge) {
            return Some(Arc::clone(polyline));
        }
        let polyline = Arc::new(graph.edge_polyline(edge)?);
        cache.put(edge, Arc::clone(&polyline));
        Some(polyline)
    }

    /// Drops all cached shapes. Safe to call concurrently with matching.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The number of currently cached shapes.
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use wayfare_graph::MemoryRoadGraph;

    fn graph_with_one_edge() -> MemoryRoadGraph {
        let mut graph = MemoryRoadGraph::new();
        graph.push_edge(
            0,
            1,
            line_string![(x: 32.0, y: 37.0), (x: 32.001, y: 37.0)],
            50.0,
        );
        graph
    }

    #[test]
    fn hit_returns_the_same_allocation() {
        let graph = graph_with_one_edge();
        let cache = EdgePolylineCache::new(NonZeroUsize::new(8).unwrap());

        let first = cache.get_or_load(&graph, 0).unwrap();
        let second = cache.get_or_load(&graph, 0).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalid_edges_are_not_cached() {
        let graph = graph_with_one_edge();
        let cache = EdgePolylineCache::new(NonZeroUsize::new(8).unwrap());

        assert!(cache.get_or_load(&graph, 99).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_forces_a_reload() {
        let graph = graph_with_one_edge();
        let cache = EdgePolylineCache::new(NonZeroUsize::new(8).unwrap());

        let first = cache.get_or_load(&graph, 0).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        let second = cache.get_or_load(&graph, 0).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }
}
