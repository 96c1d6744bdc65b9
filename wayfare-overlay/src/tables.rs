use serde::Serialize;
use std::collections::HashMap;
use wayfare_graph::{EdgeId, VehicleClass};

/// Per-edge record in the discouraged-roads table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdsEntry {
    pub score: f64,
}

/// Per-edge record in the custom-area table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomAreaEntry {
    pub score: f64,
    pub area_id: String,
}

/// Per-edge record in one vehicle class's speed-limit table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedLimitEntry {
    pub limit_kph: u16,
    pub corridor_title: String,
    pub score: f64,
}

pub type EdsTable = HashMap<EdgeId, EdsEntry>;
pub type CustomAreaTable = HashMap<EdgeId, CustomAreaEntry>;
pub type SpeedLimitTable = HashMap<VehicleClass, HashMap<EdgeId, SpeedLimitEntry>>;

/// Coarse counters for the observability endpoint.
///
/// Entries are bucketed by match score: `heavy` ≥ 0.85, `moderate` ≥ 0.70,
/// the rest `light`. The buckets answer "how trustworthy is the overlay
/// right now" at a glance without shipping the tables themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverlayStats {
    pub total: usize,
    pub heavy: usize,
    pub moderate: usize,
    pub light: usize,
    /// Most recent table install across all feeds, epoch ms (0 = never).
    pub last_update_ms: u64,
}

impl OverlayStats {
    pub(crate) fn count(&mut self, score: f64) {
        self.total += 1;
        if score >= 0.85 {
            self.heavy += 1;
        } else if score >= 0.70 {
            self.moderate += 1;
        } else {
            self.light += 1;
        }
    }
}

/// One edge's overlay records, as exposed in debug observability output.
#[derive(Debug, Clone, Serialize)]
pub struct OverlaySample {
    pub edge: EdgeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eds: Option<EdsEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_area: Option<CustomAreaEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_bucket_boundaries() {
        let mut stats = OverlayStats::default();
        stats.count(0.85);
        stats.count(0.84);
        stats.count(0.70);
        stats.count(0.69);
        stats.count(1.0);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.heavy, 2);
        assert_eq!(stats.moderate, 2);
        assert_eq!(stats.light, 1);
    }
}
