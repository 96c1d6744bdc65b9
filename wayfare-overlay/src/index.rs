use crate::tables::{
    CustomAreaEntry, CustomAreaTable, EdsEntry, EdsTable, OverlaySample, OverlayStats,
    SpeedLimitEntry, SpeedLimitTable,
};
use geo::Coord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;
use wayfare_feeds::{epoch_ms, CustomAreaSnapshot, EdsSnapshot, FeedKind, SpeedLimitSnapshot};
use wayfare_graph::RoadGraph;
use wayfare_match::{match_circle, match_line, EdgePolylineCache, LineMatchParams};

/// The edge-indexed overlay tables, with atomic publication.
///
/// Each table is rebuilt from scratch against a feed snapshot and then
/// swapped in whole. Readers clone a table's `Arc` once per request and
/// keep that version for the request's lifetime; a rebuild can never show
/// them a half-built table, and a deleted corridor disappears for new
/// requests at the next swap.
///
/// Rebuilds iterate snapshot corridors in ascending id order and keep only
/// a strictly better score per edge. Two rebuilds from the same snapshot
/// therefore produce identical tables, and an edge claimed by two corridors
/// at the same score goes to the lower corridor id.
pub struct OverlayIndex {
    eds: RwLock<Arc<EdsTable>>,
    custom_areas: RwLock<Arc<CustomAreaTable>>,
    speed_limits: RwLock<Arc<SpeedLimitTable>>,
    /// Table install time per feed, epoch ms; 0 means never built.
    last_update_ms: [AtomicU64; 3],
}

impl Default for OverlayIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayIndex {
    pub fn new() -> Self {
        Self {
            eds: RwLock::new(Arc::new(EdsTable::default())),
            custom_areas: RwLock::new(Arc::new(CustomAreaTable::default())),
            speed_limits: RwLock::new(Arc::new(SpeedLimitTable::default())),
            last_update_ms: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Rebuilds the discouraged-roads table from a snapshot.
    pub fn rebuild_eds(
        &self,
        graph: &dyn RoadGraph,
        cache: &EdgePolylineCache,
        snapshot: &EdsSnapshot,
    ) {
        let mut table = EdsTable::default();
        // Corridor iteration is ascending by name; combined with the
        // strictly-greater replacement rule below this makes the rebuild
        // deterministic, ties going to the first corridor.
        for polyline in snapshot.corridors.values() {
            let matches = match_line(graph, cache, polyline, LineMatchParams::EDS);
            for m in matches {
                match table.get(&m.edge) {
                    Some(existing) if existing.score >= m.score => {}
                    _ => {
                        table.insert(m.edge, EdsEntry { score: m.score });
                    }
                }
            }
        }
        info!(edges = table.len(), "installing EDS overlay table");
        self.install(FeedKind::Eds, &self.eds, table);
    }

    /// Rebuilds the custom-area table from a snapshot.
    pub fn rebuild_custom_areas(
        &self,
        graph: &dyn RoadGraph,
        cache: &EdgePolylineCache,
        snapshot: &CustomAreaSnapshot,
    ) {
        let mut table = CustomAreaTable::default();
        for (id, area) in &snapshot.areas {
            let center = Coord {
                x: area.center_lon,
                y: area.center_lat,
            };
            for m in match_circle(graph, cache, center, area.radius_m) {
                match table.get(&m.edge) {
                    Some(existing) if existing.score >= m.score => {}
                    _ => {
                        table.insert(
                            m.edge,
                            CustomAreaEntry {
                                score: m.score,
                                area_id: id.clone(),
                            },
                        );
                    }
                }
            }
        }
        info!(edges = table.len(), "installing custom-area overlay table");
        self.install(FeedKind::CustomAreas, &self.custom_areas, table);
    }

    /// Rebuilds every vehicle class's speed-limit table from a snapshot.
    pub fn rebuild_speed_limits(
        &self,
        graph: &dyn RoadGraph,
        cache: &EdgePolylineCache,
        snapshot: &SpeedLimitSnapshot,
    ) {
        let mut table = SpeedLimitTable::default();
        for (class, corridors) in &snapshot.per_class {
            let class_table: &mut HashMap<_, _> = table.entry(*class).or_default();
            for corridor in corridors.values() {
                let matches =
                    match_line(graph, cache, &corridor.polyline, LineMatchParams::SPEED_LIMIT);
                for m in matches {
                    match class_table.get(&m.edge) {
                        Some(existing) if existing.score >= m.score => {}
                        _ => {
                            class_table.insert(
                                m.edge,
                                SpeedLimitEntry {
                                    limit_kph: corridor.limit_kph,
                                    corridor_title: corridor.title.clone(),
                                    score: m.score,
                                },
                            );
                        }
                    }
                }
            }
        }
        let edges: usize = table.values().map(HashMap::len).sum();
        info!(edges, "installing speed-limit overlay table");
        self.install(FeedKind::SpeedLimits, &self.speed_limits, table);
    }

    fn install<T>(&self, kind: FeedKind, slot: &RwLock<Arc<T>>, table: T) {
        *slot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        self.last_update_ms[slot_index(kind)].store(epoch_ms(), Ordering::Release);
    }

    /// The live discouraged-roads table.
    pub fn eds_table(&self) -> Arc<EdsTable> {
        Arc::clone(&self.eds.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn custom_area_table(&self) -> Arc<CustomAreaTable> {
        Arc::clone(
            &self
                .custom_areas
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    pub fn speed_limit_table(&self) -> Arc<SpeedLimitTable> {
        Arc::clone(
            &self
                .speed_limits
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// When the table for `kind` was last installed, if ever.
    pub fn last_update(&self, kind: FeedKind) -> Option<u64> {
        match self.last_update_ms[slot_index(kind)].load(Ordering::Acquire) {
            0 => None,
            at => Some(at),
        }
    }

    /// Whether the table for `kind` has ever been built (even empty).
    pub fn is_built(&self, kind: FeedKind) -> bool {
        self.last_update(kind).is_some()
    }

    /// Counters over all three tables.
    pub fn stats(&self) -> OverlayStats {
        let mut stats = OverlayStats::default();
        for entry in self.eds_table().values() {
            stats.count(entry.score);
        }
        for entry in self.custom_area_table().values() {
            stats.count(entry.score);
        }
        for class_table in self.speed_limit_table().values() {
            for entry in class_table.values() {
                stats.count(entry.score);
            }
        }
        stats.last_update_ms = FeedKind::ALL
            .iter()
            .filter_map(|kind| self.last_update(*kind))
            .max()
            .unwrap_or(0);
        stats
    }

    /// Up to `limit` per-edge records, for debug observability output.
    ///
    /// Ordered by edge id so repeated calls against the same tables return
    /// the same sample.
    pub fn sample(&self, limit: usize) -> Vec<OverlaySample> {
        let eds = self.eds_table();
        let areas = self.custom_area_table();
        let mut edges: Vec<u32> = eds.keys().chain(areas.keys()).copied().collect();
        edges.sort_unstable();
        edges.dedup();
        edges
            .into_iter()
            .take(limit)
            .map(|edge| OverlaySample {
                edge,
                eds: eds.get(&edge).cloned(),
                custom_area: areas.get(&edge).cloned(),
            })
            .collect()
    }
}

fn slot_index(kind: FeedKind) -> usize {
    match kind {
        FeedKind::Eds => 0,
        FeedKind::CustomAreas => 1,
        FeedKind::SpeedLimits => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;
    use std::collections::BTreeMap;
    use std::num::NonZeroUsize;
    use std::sync::atomic::AtomicBool;
    use wayfare_graph::MemoryRoadGraph;

    fn cache() -> EdgePolylineCache {
        EdgePolylineCache::new(NonZeroUsize::new(1024).unwrap())
    }

    /// Two collinear edges of different lengths. The length difference
    /// keeps a corridor matching one of them from also clearing the
    /// threshold on the other (a same-length twin would score exactly at
    /// the 0.6 boundary on length and direction alone).
    fn two_edge_graph() -> MemoryRoadGraph {
        let mut graph = MemoryRoadGraph::new();
        graph.push_edge(
            0,
            1,
            line_string![(x: 32.530, y: 37.950), (x: 32.535, y: 37.950)],
            50.0,
        );
        graph.push_edge(
            1,
            2,
            line_string![(x: 32.535, y: 37.950), (x: 32.542, y: 37.950)],
            50.0,
        );
        graph
    }

    fn eds_snapshot(corridors: &[(&str, geo::LineString<f64>)]) -> EdsSnapshot {
        EdsSnapshot {
            corridors: corridors
                .iter()
                .map(|(name, line)| ((*name).to_owned(), line.clone()))
                .collect(),
        }
    }

    #[test]
    fn rebuild_replaces_the_whole_table() {
        let graph = two_edge_graph();
        let cache = cache();
        let index = OverlayIndex::new();
        let edge0 = line_string![(x: 32.530, y: 37.950), (x: 32.535, y: 37.950)];
        let edge1 = line_string![(x: 32.535, y: 37.950), (x: 32.542, y: 37.950)];

        index.rebuild_eds(&graph, &cache, &eds_snapshot(&[("first", edge0)]));
        assert!(index.eds_table().contains_key(&0));
        assert!(!index.eds_table().contains_key(&1));

        // The second snapshot no longer contains the first corridor; its
        // edge must disappear.
        index.rebuild_eds(&graph, &cache, &eds_snapshot(&[("second", edge1)]));
        assert!(!index.eds_table().contains_key(&0));
        assert!(index.eds_table().contains_key(&1));
    }

    #[test]
    fn equal_scores_go_to_the_lower_corridor_id() {
        let graph = two_edge_graph();
        let cache = cache();
        let index = OverlayIndex::new();

        // Two areas with identical circles, hence identical scores.
        let snapshot = CustomAreaSnapshot {
            areas: BTreeMap::from([
                (
                    "a".to_owned(),
                    wayfare_feeds::CustomArea {
                        id: "a".to_owned(),
                        center_lat: 37.950,
                        center_lon: 32.5325,
                        radius_m: 400.0,
                        metadata: BTreeMap::new(),
                    },
                ),
                (
                    "b".to_owned(),
                    wayfare_feeds::CustomArea {
                        id: "b".to_owned(),
                        center_lat: 37.950,
                        center_lon: 32.5325,
                        radius_m: 400.0,
                        metadata: BTreeMap::new(),
                    },
                ),
            ]),
        };
        index.rebuild_custom_areas(&graph, &cache, &snapshot);

        let table = index.custom_area_table();
        let entry = table.get(&0).expect("edge 0 should be covered");
        assert_eq!(entry.area_id, "a");
    }

    #[test]
    fn rebuilds_are_deterministic() {
        let graph = two_edge_graph();
        let cache = cache();
        let edge0 = line_string![(x: 32.530, y: 37.950), (x: 32.535, y: 37.950)];
        let edge1 = line_string![(x: 32.535, y: 37.950), (x: 32.542, y: 37.950)];
        let snapshot = eds_snapshot(&[("a", edge0), ("b", edge1)]);

        let first = OverlayIndex::new();
        first.rebuild_eds(&graph, &cache, &snapshot);
        let second = OverlayIndex::new();
        second.rebuild_eds(&graph, &cache, &snapshot);

        let a = first.eds_table();
        let b = second.eds_table();
        assert_eq!(a.len(), b.len());
        for (edge, entry) in a.iter() {
            assert_eq!(b.get(edge), Some(entry));
        }
    }

    #[test]
    fn stats_and_sample_reflect_the_tables() {
        let graph = two_edge_graph();
        let cache = cache();
        let index = OverlayIndex::new();
        assert_eq!(index.stats(), OverlayStats::default());
        assert!(!index.is_built(FeedKind::Eds));

        let edge0 = line_string![(x: 32.530, y: 37.950), (x: 32.535, y: 37.950)];
        index.rebuild_eds(&graph, &cache, &eds_snapshot(&[("a", edge0)]));

        let stats = index.stats();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.heavy, 1);
        assert!(stats.last_update_ms > 0);
        assert!(index.is_built(FeedKind::Eds));

        let sample = index.sample(10);
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0].edge, 0);
        assert!(sample[0].eds.is_some());
        assert!(sample[0].custom_area.is_none());
    }

    /// Readers racing a rebuild must only ever observe one of the two
    /// complete tables, never a mixture.
    #[test]
    fn readers_never_observe_a_partial_swap() {
        let graph = Arc::new(two_edge_graph());
        let cache = Arc::new(cache());
        let index = Arc::new(OverlayIndex::new());
        let edge0 = line_string![(x: 32.530, y: 37.950), (x: 32.535, y: 37.950)];
        let edge1 = line_string![(x: 32.535, y: 37.950), (x: 32.542, y: 37.950)];
        let snapshot_a = eds_snapshot(&[("a", edge0)]);
        let snapshot_b = eds_snapshot(&[("b", edge1)]);

        let stop = Arc::new(AtomicBool::new(false));
        let mut readers = Vec::new();
        for _ in 0..4 {
            let index = Arc::clone(&index);
            let stop = Arc::clone(&stop);
            readers.push(std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let table = index.eds_table();
                    // Either empty (before the first build), exactly {0},
                    // or exactly {1}.
                    let keys: Vec<_> = table.keys().copied().collect();
                    assert!(
                        keys.is_empty() || keys == [0] || keys == [1],
                        "observed a mixed table: {keys:?}"
                    );
                }
            }));
        }

        for _ in 0..50 {
            index.rebuild_eds(graph.as_ref(), &cache, &snapshot_a);
            index.rebuild_eds(graph.as_ref(), &cache, &snapshot_b);
        }
        stop.store(true, Ordering::Relaxed);
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
