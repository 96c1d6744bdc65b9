use crate::weighting::OverlayFlags;
use tracing::debug;
use wayfare_graph::{RequestHints, RoutingProfile, VehicleClass};

/// Well-known hint-bag keys.
///
/// The first group is read from the incoming request; the second group is
/// written for the downstream router.
pub mod hint_keys {
    pub const AVOID_EDS_ROADS: &str = "avoid_eds_roads";
    pub const AVOID_CUSTOM_AREAS: &str = "avoid_custom_areas";
    pub const ENABLE_SPEED_LIMITS: &str = "enable_speed_limits";
    pub const CAR_TYPE_ID: &str = "car_type_id";
    pub const TRAFFIC_AWARE: &str = "traffic_aware";

    pub const CH_DISABLE: &str = "ch.disable";
    pub const LM_DISABLE: &str = "lm.disable";
    pub const ALTERNATIVE_ROUTE: &str = "alternative_route.enabled";
    pub const MAX_PATHS: &str = "alternative_route.max_paths";
    pub const MAX_WEIGHT_FACTOR: &str = "alternative_route.max_weight_factor";
    pub const MAX_SHARE_FACTOR: &str = "alternative_route.max_share_factor";
    pub const MAX_EXPLORATION_FACTOR: &str = "alternative_route.max_exploration_factor";
}

/// Parameters for the router's alternative-route search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltRouteParams {
    pub max_paths: u32,
    pub max_weight_factor: f64,
    pub max_share_factor: f64,
    pub max_exploration_factor: f64,
}

impl AltRouteParams {
    /// Both avoidance overlays active.
    pub const BOTH_AVOIDANCES: Self = Self {
        max_paths: 3,
        max_weight_factor: 1.5,
        max_share_factor: 0.7,
        max_exploration_factor: 1.3,
    };

    /// Only custom areas: wider exploration, because an area can swallow a
    /// whole neighborhood and the detour may share little with the direct
    /// route.
    pub const CUSTOM_AREAS_ONLY: Self = Self {
        max_paths: 3,
        max_weight_factor: 2.0,
        max_share_factor: 0.5,
        max_exploration_factor: 1.5,
    };

    /// Only EDS corridors: detours tend to be local.
    pub const EDS_ONLY: Self = Self {
        max_paths: 3,
        max_weight_factor: 1.3,
        max_share_factor: 0.7,
        max_exploration_factor: 1.2,
    };

    /// Defaults written when no avoidance is active.
    pub const DEFAULT: Self = Self {
        max_paths: 3,
        max_weight_factor: 1.4,
        max_share_factor: 0.6,
        max_exploration_factor: 1.3,
    };
}

/// What the binder decided for one request.
///
/// `hints` is a fresh bag derived from the input with the algorithm hints
/// written in; the incoming request is never touched.
#[derive(Debug, Clone)]
pub struct BoundRequest {
    pub flags: OverlayFlags,
    /// Precomputed speedups (contraction hierarchies, landmarks) must be
    /// off whenever any overlay perturbs edge weights, since their
    /// preprocessing baked in the unperturbed ones.
    pub disable_speedups: bool,
    /// Set when the request should run an alternative-route search.
    pub alt_routes: Option<AltRouteParams>,
    pub hints: RequestHints,
}

/// Reads the per-request overlay flags and derives the routing setup.
pub fn bind_request(hints: &RequestHints, profile: RoutingProfile) -> BoundRequest {
    let traffic_aware = hints.get_bool(hint_keys::TRAFFIC_AWARE, true);

    let mut flags = OverlayFlags::INACTIVE;
    if traffic_aware {
        flags.avoid_eds = hints.get_bool(hint_keys::AVOID_EDS_ROADS, false);
        flags.avoid_custom_areas = hints.get_bool(hint_keys::AVOID_CUSTOM_AREAS, false);
        flags.speed_limit_class = speed_limit_class(hints, profile);
    } else {
        debug!("traffic_aware=false; all overlays disabled for this request");
    }

    let disable_speedups = flags.any_active();
    let params = match (flags.avoid_eds, flags.avoid_custom_areas) {
        (true, true) => AltRouteParams::BOTH_AVOIDANCES,
        (false, true) => AltRouteParams::CUSTOM_AREAS_ONLY,
        (true, false) => AltRouteParams::EDS_ONLY,
        (false, false) => AltRouteParams::DEFAULT,
    };
    let alt_routes = flags.any_avoidance().then_some(params);

    let derived = hints
        .with_bool(hint_keys::CH_DISABLE, disable_speedups)
        .with_bool(hint_keys::LM_DISABLE, disable_speedups)
        .with_bool(hint_keys::ALTERNATIVE_ROUTE, alt_routes.is_some())
        .with_int(hint_keys::MAX_PATHS, i64::from(params.max_paths))
        .with_float(hint_keys::MAX_WEIGHT_FACTOR, params.max_weight_factor)
        .with_float(hint_keys::MAX_SHARE_FACTOR, params.max_share_factor)
        .with_float(
            hint_keys::MAX_EXPLORATION_FACTOR,
            params.max_exploration_factor,
        );

    BoundRequest {
        flags,
        disable_speedups,
        alt_routes,
        hints: derived,
    }
}

fn speed_limit_class(hints: &RequestHints, profile: RoutingProfile) -> Option<VehicleClass> {
    if !hints.get_bool(hint_keys::ENABLE_SPEED_LIMITS, true) {
        return None;
    }
    if !profile.is_motorized() {
        // Speed-limit corridors describe motor-vehicle limits; a walking or
        // cycling request silently skips them.
        debug!(?profile, "non-motorized profile; speed-limit overlay bypassed");
        return None;
    }
    let raw = hints.get_int(hint_keys::CAR_TYPE_ID, 0);
    VehicleClass::from_request(raw)
}
