use crate::tables::{CustomAreaTable, EdsTable, SpeedLimitTable};
use std::sync::Arc;
use wayfare_graph::{EdgeId, RoadGraph, VehicleClass, Weighting};

/// Penalty factor applied to discouraged edges.
///
/// Applied once per edge regardless of how many overlays flag it; large
/// enough to push the search onto any reasonable detour, small enough that
/// a discouraged road still wins over a grotesque one when it is the only
/// way through.
pub const AVOIDANCE_MULTIPLIER: f64 = 10.0;

/// Which overlays a request asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayFlags {
    pub avoid_eds: bool,
    pub avoid_custom_areas: bool,
    /// `None` leaves the speed-limit overlay inert.
    pub speed_limit_class: Option<VehicleClass>,
}

impl OverlayFlags {
    pub const INACTIVE: Self = Self {
        avoid_eds: false,
        avoid_custom_areas: false,
        speed_limit_class: None,
    };

    pub fn any_avoidance(&self) -> bool {
        self.avoid_eds || self.avoid_custom_areas
    }

    pub fn any_active(&self) -> bool {
        self.any_avoidance() || self.speed_limit_class.is_some()
    }
}

/// Multiplier for a speed-limit delta, in km/h.
///
/// Positive deltas (the corridor allows faster travel than the graph
/// assumes) earn a mild bonus; negative ones a slightly steeper penalty.
/// Both sides are capped so the overlay nudges route choice instead of
/// dominating it.
fn speed_delta_multiplier(limit_kph: f64, baseline_kph: f64) -> f64 {
    let delta = (limit_kph - baseline_kph).abs();
    let bonus = limit_kph >= baseline_kph;
    match delta {
        d if d <= 5.0 => {
            if bonus {
                0.97
            } else {
                1.03
            }
        }
        d if d <= 15.0 => {
            if bonus {
                0.95
            } else {
                1.08
            }
        }
        d if d <= 30.0 => {
            if bonus {
                0.92
            } else {
                1.15
            }
        }
        d if d <= 50.0 => {
            if bonus {
                0.88
            } else {
                1.25
            }
        }
        _ => {
            if bonus {
                0.85
            } else {
                1.35
            }
        }
    }
}

/// The wrapping cost function handed to the router.
///
/// Pure over `(edge, flags, captured tables)`: the table `Arc`s are cloned
/// at construction, so a weighting sees one consistent overlay version for
/// its whole lifetime no matter how many refreshes land mid-request.
///
/// Only `edge_weight` is adjusted, multiplicatively and bounded below by
/// the speed-bonus floor. Every other operation delegates to the base
/// unchanged, including the per-distance lower bound the router uses for
/// optimality checks.
pub struct OverlayWeighting<W> {
    base: W,
    graph: Arc<dyn RoadGraph>,
    eds: Arc<EdsTable>,
    custom_areas: Arc<CustomAreaTable>,
    speed_limits: Arc<SpeedLimitTable>,
    flags: OverlayFlags,
}

impl<W: Weighting> OverlayWeighting<W> {
    pub fn new(
        base: W,
        graph: Arc<dyn RoadGraph>,
        eds: Arc<EdsTable>,
        custom_areas: Arc<CustomAreaTable>,
        speed_limits: Arc<SpeedLimitTable>,
        flags: OverlayFlags,
    ) -> Self {
        Self {
            base,
            graph,
            eds,
            custom_areas,
            speed_limits,
            flags,
        }
    }

    fn is_avoided(&self, edge: EdgeId) -> bool {
        (self.flags.avoid_eds && self.eds.contains_key(&edge))
            || (self.flags.avoid_custom_areas && self.custom_areas.contains_key(&edge))
    }

    fn avoidance_multiplier(&self, edge: EdgeId) -> f64 {
        // An edge flagged by both overlays is penalized once; stacking the
        // factor would make combined requests avoid it out of all
        // proportion.
        if self.is_avoided(edge) {
            AVOIDANCE_MULTIPLIER
        } else {
            1.0
        }
    }

    fn speed_limit_multiplier(&self, edge: EdgeId) -> f64 {
        let Some(class) = self.flags.speed_limit_class else {
            return 1.0;
        };
        // Avoidance takes precedence: a discouraged edge keeps its flat
        // penalty rather than having it eroded by a speed bonus.
        if self.is_avoided(edge) {
            return 1.0;
        }
        let Some(entry) = self
            .speed_limits
            .get(&class)
            .and_then(|table| table.get(&edge))
        else {
            return 1.0;
        };
        let baseline = self
            .graph
            .baseline_speed_kph(edge)
            .filter(|speed| *speed > 0.0)
            .unwrap_or_else(|| class.default_speed_kph());
        speed_delta_multiplier(f64::from(entry.limit_kph), baseline)
    }
}

impl<W: Weighting> Weighting for OverlayWeighting<W> {
    fn edge_weight(&self, edge: EdgeId, reverse: bool) -> f64 {
        let base = self.base.edge_weight(edge, reverse);
        // Ids the graph doesn't know cannot carry overlays.
        if edge >= self.graph.edge_count() {
            return base;
        }
        base * self.avoidance_multiplier(edge) * self.speed_limit_multiplier(edge)
    }

    fn edge_millis(&self, edge: EdgeId, reverse: bool) -> u64 {
        self.base.edge_millis(edge, reverse)
    }

    fn turn_weight(&self, in_edge: EdgeId, via_node: u32, out_edge: EdgeId) -> f64 {
        self.base.turn_weight(in_edge, via_node, out_edge)
    }

    fn turn_millis(&self, in_edge: EdgeId, via_node: u32, out_edge: EdgeId) -> u64 {
        self.base.turn_millis(in_edge, via_node, out_edge)
    }

    fn min_weight_per_distance(&self) -> f64 {
        self.base.min_weight_per_distance()
    }

    fn has_turn_costs(&self) -> bool {
        self.base.has_turn_costs()
    }
}

/// Hard-ban counterpart to the soft penalty: rejects flagged edges
/// outright.
///
/// Offered for hosts that prefer an edge filter over a penalty. Note that
/// banning edges can disconnect the graph where the penalty would merely
/// make a route expensive; the binder never uses this.
pub struct OverlayEdgeFilter {
    eds: Arc<EdsTable>,
    custom_areas: Arc<CustomAreaTable>,
    flags: OverlayFlags,
}

impl OverlayEdgeFilter {
    pub fn new(eds: Arc<EdsTable>, custom_areas: Arc<CustomAreaTable>, flags: OverlayFlags) -> Self {
        Self {
            eds,
            custom_areas,
            flags,
        }
    }

    /// Whether the search may expand this edge.
    pub fn accepts(&self, edge: EdgeId) -> bool {
        !((self.flags.avoid_eds && self.eds.contains_key(&edge))
            || (self.flags.avoid_custom_areas && self.custom_areas.contains_key(&edge)))
    }
}
