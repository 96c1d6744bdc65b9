use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

/// Vehicle classes carried by the speed-limit feed.
///
/// The numeric values are the wire-level `car_id`s; anything outside this
/// enumeration is treated as "no class" and leaves the speed-limit overlay
/// inert.
#[repr(u8)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
pub enum VehicleClass {
    Auto = 1,
    Minibus = 2,
    Bus = 3,
    Van = 4,
    Truck = 5,
    Tractor = 6,
}

impl VehicleClass {
    /// Maps a raw request/feed id to a class.
    ///
    /// `0` means "not given"; unknown ids are treated the same way.
    pub fn from_request(id: i64) -> Option<Self> {
        u8::try_from(id).ok().and_then(|id| Self::try_from(id).ok())
    }

    /// Fallback traversal speed for this class, in km/h, used when the
    /// graph carries no baseline speed for an edge.
    pub const fn default_speed_kph(self) -> f64 {
        match self {
            Self::Auto | Self::Minibus | Self::Bus => 50.0,
            Self::Van => 45.0,
            Self::Truck | Self::Tractor => 40.0,
        }
    }

    /// All classes, ascending by wire id.
    pub const ALL: [Self; 6] = [
        Self::Auto,
        Self::Minibus,
        Self::Bus,
        Self::Van,
        Self::Truck,
        Self::Tractor,
    ];
}

/// The routing profile of a request.
///
/// Only the motorized/non-motorized distinction matters to the overlay
/// pipeline: speed-limit corridors describe motor-vehicle limits and are
/// bypassed for pedestrian and bicycle routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingProfile {
    Car,
    Truck,
    Bus,
    Foot,
    Bicycle,
}

impl RoutingProfile {
    pub const fn is_motorized(self) -> bool {
        !matches!(self, Self::Foot | Self::Bicycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_ids_round_trip() {
        for class in VehicleClass::ALL {
            let id = i64::from(u8::from(class));
            assert_eq!(VehicleClass::from_request(id), Some(class));
        }
    }

    #[test]
    fn zero_and_unknown_map_to_none() {
        assert_eq!(VehicleClass::from_request(0), None);
        assert_eq!(VehicleClass::from_request(7), None);
        assert_eq!(VehicleClass::from_request(-1), None);
        assert_eq!(VehicleClass::from_request(i64::MAX), None);
    }

    #[test]
    fn class_defaults() {
        assert_eq!(VehicleClass::Auto.default_speed_kph(), 50.0);
        assert_eq!(VehicleClass::Van.default_speed_kph(), 45.0);
        assert_eq!(VehicleClass::Tractor.default_speed_kph(), 40.0);
    }

    #[test]
    fn only_foot_and_bicycle_are_unmotorized() {
        assert!(RoutingProfile::Car.is_motorized());
        assert!(RoutingProfile::Bus.is_motorized());
        assert!(!RoutingProfile::Foot.is_motorized());
        assert!(!RoutingProfile::Bicycle.is_motorized());
    }
}
