use crate::error::FeedError;
use crate::kind::FeedKind;
use geo::{Coord, LineString};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Parsed EDS feed: corridor polylines keyed by their stable road name.
///
/// The map is ordered so that consumers iterating corridors do so in a
/// deterministic order (ascending by name), which is what makes index
/// rebuilds reproducible.
#[derive(Debug, Default, Clone)]
pub struct EdsSnapshot {
    pub corridors: BTreeMap<String, LineString<f64>>,
}

impl EdsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.corridors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.corridors.len()
    }
}

// The feed is a list of GeoJSON-like documents. Only LineString features
// with a name survive normalization; everything else is dropped with a
// warning.

#[derive(Deserialize)]
struct WireDocument {
    #[serde(default)]
    features: Vec<WireFeature>,
}

#[derive(Deserialize)]
struct WireFeature {
    geometry: Option<WireGeometry>,
    properties: Option<WireProperties>,
}

#[derive(Deserialize)]
struct WireGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

#[derive(Deserialize)]
struct WireProperties {
    #[serde(rename = "Name")]
    name: Option<String>,
}

/// Parses the EDS feed body.
///
/// # Errors
///
/// Fails only when the body is not valid JSON for the envelope; individual
/// malformed features are skipped with a warning.
pub fn parse_eds(body: &str) -> Result<EdsSnapshot, FeedError> {
    let documents: Vec<WireDocument> =
        serde_json::from_str(body).map_err(|source| FeedError::Json {
            kind: FeedKind::Eds,
            source,
        })?;

    let mut corridors = BTreeMap::new();
    for document in documents {
        for feature in document.features {
            let Some(geometry) = feature.geometry else {
                warn!("skipping EDS feature without geometry");
                continue;
            };
            if geometry.kind != "LineString" {
                warn!(kind = %geometry.kind, "skipping EDS feature with non-LineString geometry");
                continue;
            }
            let Some(name) = feature.properties.and_then(|p| p.name) else {
                warn!("skipping EDS LineString without a Name property");
                continue;
            };
            let Ok(coordinates) =
                serde_json::from_value::<Vec<[f64; 2]>>(geometry.coordinates)
            else {
                warn!(corridor = %name, "skipping EDS feature with malformed coordinates");
                continue;
            };
            if coordinates.len() < 2 {
                warn!(
                    corridor = %name,
                    points = coordinates.len(),
                    "skipping EDS feature with too few coordinates"
                );
                continue;
            }
            let polyline = LineString::new(
                coordinates
                    .into_iter()
                    .map(|[lon, lat]| Coord { x: lon, y: lat })
                    .collect(),
            );
            corridors.insert(name, polyline);
        }
    }

    Ok(EdsSnapshot { corridors })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_linestring_features() {
        let body = r#"[
            {
                "features": [
                    {
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[32.52, 37.98], [32.53, 37.97], [32.54, 37.96]]
                        },
                        "properties": {"Name": "D300 westbound"}
                    }
                ]
            }
        ]"#;

        let snapshot = parse_eds(body).unwrap();
        assert_eq!(snapshot.len(), 1);
        let corridor = &snapshot.corridors["D300 westbound"];
        assert_eq!(corridor.0.len(), 3);
        assert_eq!(corridor.0[0], Coord { x: 32.52, y: 37.98 });
    }

    #[test]
    fn skips_non_linestrings_and_short_lines() {
        let body = r#"[
            {
                "features": [
                    {
                        "geometry": {"type": "Point", "coordinates": [32.52, 37.98]},
                        "properties": {"Name": "a point"}
                    },
                    {
                        "geometry": {"type": "LineString", "coordinates": [[32.52, 37.98]]},
                        "properties": {"Name": "too short"}
                    },
                    {
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[32.52, 37.98], [32.53, 37.97]]
                        },
                        "properties": {"Name": "kept"}
                    }
                ]
            }
        ]"#;

        let snapshot = parse_eds(body).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.corridors.contains_key("kept"));
    }

    #[test]
    fn skips_features_missing_name_or_geometry() {
        let body = r#"[
            {
                "features": [
                    {
                        "geometry": {
                            "type": "LineString",
                            "coordinates": [[32.52, 37.98], [32.53, 37.97]]
                        },
                        "properties": {}
                    },
                    {"properties": {"Name": "no geometry"}}
                ]
            }
        ]"#;

        let snapshot = parse_eds(body).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn rejects_a_non_json_body() {
        assert!(matches!(
            parse_eds("<html>gateway timeout</html>"),
            Err(FeedError::Json { kind: FeedKind::Eds, .. })
        ));
    }

    #[test]
    fn empty_feed_is_an_empty_snapshot() {
        let snapshot = parse_eds("[]").unwrap();
        assert!(snapshot.is_empty());
    }
}
