use crate::error::FeedError;
use crate::kind::FeedKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// One validated custom area: a circle to discourage.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomArea {
    pub id: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    /// Whatever else the upstream attached (descriptions, validity windows).
    /// Carried opaquely for observability; the pipeline never interprets it.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Parsed custom-area feed, keyed by area id (ascending iteration order).
#[derive(Debug, Default, Clone)]
pub struct CustomAreaSnapshot {
    pub areas: BTreeMap<String, CustomArea>,
}

impl CustomAreaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }
}

#[derive(Deserialize)]
struct WireArea {
    id: Option<serde_json::Value>,
    location: Option<String>,
    half_diameter: Option<f64>,
    #[serde(flatten)]
    metadata: BTreeMap<String, serde_json::Value>,
}

/// Parses the custom-area feed body.
///
/// Required fields are `id`, `location` (a `"lat, lon"` string) and
/// `half_diameter` (meters, strictly positive); coordinates must be within
/// WGS-84 bounds. Entries failing any of these are dropped with a warning.
///
/// # Errors
///
/// Fails only when the body is not a JSON array of objects.
pub fn parse_custom_areas(body: &str) -> Result<CustomAreaSnapshot, FeedError> {
    let entries: Vec<WireArea> = serde_json::from_str(body).map_err(|source| FeedError::Json {
        kind: FeedKind::CustomAreas,
        source,
    })?;

    let mut areas = BTreeMap::new();
    for entry in entries {
        let Some(id) = entry.id.as_ref().map(id_to_string) else {
            warn!("skipping custom area without an id");
            continue;
        };
        let Some(location) = entry.location.as_deref() else {
            warn!(area = %id, "skipping custom area without a location");
            continue;
        };
        let Some((lat, lon)) = parse_location(location) else {
            warn!(area = %id, location, "skipping custom area with unparseable location");
            continue;
        };
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            warn!(area = %id, lat, lon, "skipping custom area with out-of-range coordinates");
            continue;
        }
        let Some(radius_m) = entry.half_diameter else {
            warn!(area = %id, "skipping custom area without a half_diameter");
            continue;
        };
        if !radius_m.is_finite() || radius_m <= 0.0 {
            warn!(area = %id, radius_m, "skipping custom area with non-positive radius");
            continue;
        }
        areas.insert(
            id.clone(),
            CustomArea {
                id,
                center_lat: lat,
                center_lon: lon,
                radius_m,
                metadata: entry.metadata,
            },
        );
    }

    Ok(CustomAreaSnapshot { areas })
}

/// Upstream is inconsistent about id types (strings and numbers both
/// occur); normalize to a string key.
fn id_to_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_location(location: &str) -> Option<(f64, f64)> {
    let (lat, lon) = location.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    Some((lat, lon))
}
