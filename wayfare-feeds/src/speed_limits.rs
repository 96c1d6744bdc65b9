use crate::error::FeedError;
use crate::kind::FeedKind;
use geo::{Coord, LineString};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;
use wayfare_graph::VehicleClass;

/// One speed-limit corridor for one vehicle class.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedCorridor {
    pub title: String,
    pub polyline: LineString<f64>,
    pub limit_kph: u16,
}

/// Parsed speed-limit feed.
///
/// The upstream publishes one corridor with a list of per-class limits; we
/// normalize to one entry per `(vehicle class, corridor id)` so the index
/// can build each class table independently. Corridor ids iterate ascending
/// within a class, keeping rebuilds deterministic.
#[derive(Debug, Default, Clone)]
pub struct SpeedLimitSnapshot {
    pub per_class: BTreeMap<VehicleClass, BTreeMap<i64, SpeedCorridor>>,
}

impl SpeedLimitSnapshot {
    pub fn is_empty(&self) -> bool {
        self.per_class.values().all(BTreeMap::is_empty)
    }

    /// Total number of `(class, corridor)` entries.
    pub fn len(&self) -> usize {
        self.per_class.values().map(BTreeMap::len).sum()
    }

    pub fn corridors_for(&self, class: VehicleClass) -> Option<&BTreeMap<i64, SpeedCorridor>> {
        self.per_class.get(&class)
    }
}

#[derive(Deserialize)]
struct WireEnvelope {
    data: Option<WireData>,
}

#[derive(Deserialize)]
struct WireData {
    #[serde(default)]
    items: Vec<WireItem>,
}

#[derive(Deserialize)]
struct WireItem {
    id: Option<i64>,
    title: Option<String>,
    linestring: Option<WireLineString>,
    #[serde(default)]
    cars: Vec<WireCarLimit>,
}

#[derive(Deserialize)]
struct WireLineString {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct WireCarLimit {
    car_id: Option<i64>,
    #[allow(dead_code)]
    car_name: Option<String>,
    speed: Option<i64>,
}

/// Parses the speed-limit feed body.
///
/// # Errors
///
/// Fails only when the paged envelope is not valid JSON; malformed items
/// and unknown vehicle classes are skipped with a warning.
pub fn parse_speed_limits(body: &str) -> Result<SpeedLimitSnapshot, FeedError> {
    let envelope: WireEnvelope = serde_json::from_str(body).map_err(|source| FeedError::Json {
        kind: FeedKind::SpeedLimits,
        source,
    })?;

    let mut per_class: BTreeMap<VehicleClass, BTreeMap<i64, SpeedCorridor>> = BTreeMap::new();
    let items = envelope.data.map(|data| data.items).unwrap_or_default();
    for item in items {
        let Some(id) = item.id else {
            warn!("skipping speed-limit item without an id");
            continue;
        };
        let Some(title) = item.title else {
            warn!(corridor = id, "skipping speed-limit item without a title");
            continue;
        };
        let coordinates = item
            .linestring
            .map(|line| line.coordinates)
            .unwrap_or_default();
        if coordinates.len() < 2 {
            warn!(
                corridor = id,
                points = coordinates.len(),
                "skipping speed-limit item with too few coordinates"
            );
            continue;
        }
        let polyline = LineString::new(
            coordinates
                .iter()
                .map(|[lon, lat]| Coord { x: *lon, y: *lat })
                .collect(),
        );

        for car in item.cars {
            let Some(class) = car.car_id.and_then(VehicleClass::from_request) else {
                warn!(corridor = id, car_id = ?car.car_id, "skipping unknown vehicle class");
                continue;
            };
            let Some(limit) = car.speed.filter(|speed| *speed > 0) else {
                warn!(corridor = id, ?class, "skipping non-positive speed limit");
                continue;
            };
            let Ok(limit_kph) = u16::try_from(limit) else {
                warn!(corridor = id, limit, "skipping out-of-range speed limit");
                continue;
            };
            per_class.entry(class).or_default().insert(
                id,
                SpeedCorridor {
                    title: title.clone(),
                    polyline: polyline.clone(),
                    limit_kph,
                },
            );
        }
    }

    Ok(SpeedLimitSnapshot { per_class })
}
