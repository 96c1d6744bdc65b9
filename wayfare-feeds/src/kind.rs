use std::fmt;
use std::time::Duration;

/// The three external feeds, with their polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Discouraged-road corridors. Refreshed daily upstream.
    Eds,
    /// Circular zones (road works and similar).
    CustomAreas,
    /// Per-vehicle-class speed-limit corridors.
    SpeedLimits,
}

impl FeedKind {
    pub const ALL: [Self; 3] = [Self::Eds, Self::CustomAreas, Self::SpeedLimits];

    /// How often the scheduler polls this feed.
    pub const fn refresh_period(self) -> Duration {
        match self {
            Self::Eds => Duration::from_secs(24 * 60 * 60),
            Self::CustomAreas | Self::SpeedLimits => Duration::from_secs(6 * 60 * 60),
        }
    }

    /// How long the last successful snapshot may be served before it is
    /// considered stale. Twice the refresh period, so a single missed poll
    /// never flips a feed to stale.
    pub const fn stale_after(self) -> Duration {
        match self {
            Self::Eds => Duration::from_secs(48 * 60 * 60),
            Self::CustomAreas | Self::SpeedLimits => Duration::from_secs(12 * 60 * 60),
        }
    }

    /// Total budget for one fetch, including the body.
    pub const fn fetch_timeout(self) -> Duration {
        Duration::from_secs(30)
    }

    /// Budget for establishing the connection.
    pub const fn connect_timeout(self) -> Duration {
        Duration::from_secs(10)
    }

    pub(crate) const fn slot_index(self) -> usize {
        match self {
            Self::Eds => 0,
            Self::CustomAreas => 1,
            Self::SpeedLimits => 2,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eds => "eds",
            Self::CustomAreas => "custom-areas",
            Self::SpeedLimits => "speed-limits",
        };
        f.write_str(name)
    }
}
