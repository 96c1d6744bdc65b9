use crate::custom_areas::{parse_custom_areas, CustomAreaSnapshot};
use crate::eds::{parse_eds, EdsSnapshot};
use crate::epoch_ms;
use crate::error::FeedError;
use crate::kind::FeedKind;
use crate::source::FeedSource;
use crate::speed_limits::{parse_speed_limits, SpeedLimitSnapshot};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Holds the current snapshot of each feed behind an atomic slot.
///
/// Publication is swap-based: a refresh builds the replacement snapshot off
/// to the side and then swaps the `Arc` under a momentary write lock.
/// Readers clone the `Arc` out of the slot and hold it for as long as they
/// need, so a request that captures its snapshots once sees that version
/// for its whole lifetime, regardless of concurrent refreshes.
///
/// A failed fetch or parse leaves the previous snapshot in place.
pub struct FeedClient<S> {
    source: S,
    eds: RwLock<Arc<EdsSnapshot>>,
    custom_areas: RwLock<Arc<CustomAreaSnapshot>>,
    speed_limits: RwLock<Arc<SpeedLimitSnapshot>>,
    /// Install time per feed, epoch ms; 0 means never installed.
    installed_at_ms: [AtomicU64; 3],
}

impl<S: FeedSource> FeedClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            eds: RwLock::new(Arc::new(EdsSnapshot::default())),
            custom_areas: RwLock::new(Arc::new(CustomAreaSnapshot::default())),
            speed_limits: RwLock::new(Arc::new(SpeedLimitSnapshot::default())),
            installed_at_ms: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Fetches, parses and installs one feed.
    ///
    /// # Errors
    ///
    /// Returns the fetch or parse failure. The previously installed
    /// snapshot stays live in that case.
    pub async fn refresh(&self, kind: FeedKind) -> Result<(), FeedError> {
        let body = self.source.fetch(kind).await?;
        match kind {
            FeedKind::Eds => {
                let snapshot = parse_eds(&body)?;
                info!(corridors = snapshot.len(), "installing EDS snapshot");
                *write_slot(&self.eds) = Arc::new(snapshot);
            }
            FeedKind::CustomAreas => {
                let snapshot = parse_custom_areas(&body)?;
                info!(areas = snapshot.len(), "installing custom-area snapshot");
                *write_slot(&self.custom_areas) = Arc::new(snapshot);
            }
            FeedKind::SpeedLimits => {
                let snapshot = parse_speed_limits(&body)?;
                info!(corridors = snapshot.len(), "installing speed-limit snapshot");
                *write_slot(&self.speed_limits) = Arc::new(snapshot);
            }
        }
        self.installed_at_ms[kind.slot_index()].store(epoch_ms(), Ordering::Release);
        Ok(())
    }
}

impl<S> FeedClient<S> {
    /// The most recent successfully parsed EDS snapshot (empty if none yet).
    pub fn eds_snapshot(&self) -> Arc<EdsSnapshot> {
        Arc::clone(&read_slot(&self.eds))
    }

    pub fn custom_area_snapshot(&self) -> Arc<CustomAreaSnapshot> {
        Arc::clone(&read_slot(&self.custom_areas))
    }

    pub fn speed_limit_snapshot(&self) -> Arc<SpeedLimitSnapshot> {
        Arc::clone(&read_slot(&self.speed_limits))
    }

    /// When the feed was last successfully installed, if ever.
    pub fn installed_at(&self, kind: FeedKind) -> Option<u64> {
        match self.installed_at_ms[kind.slot_index()].load(Ordering::Acquire) {
            0 => None,
            at => Some(at),
        }
    }

    /// Whether the feed's last install is older than its staleness window
    /// (a feed that never installed is stale).
    pub fn is_stale(&self, kind: FeedKind, now_ms: u64) -> bool {
        let Some(installed) = self.installed_at(kind) else {
            return true;
        };
        let age_ms = now_ms.saturating_sub(installed);
        age_ms > stale_after_ms(kind)
    }

    /// True while the newest install across all feeds is within its
    /// staleness window. An empty-but-fresh snapshot counts as recent.
    pub fn has_recent_data(&self, now_ms: u64) -> bool {
        FeedKind::ALL.iter().any(|kind| !self.is_stale(*kind, now_ms))
    }
}

fn stale_after_ms(kind: FeedKind) -> u64 {
    u64::try_from(kind.stale_after().as_millis()).unwrap_or(u64::MAX)
}

// Slot locks are only ever held for a pointer copy; poisoning cannot leave
// a slot half-written, so recover the guard instead of propagating.
fn read_slot<T>(slot: &RwLock<Arc<T>>) -> std::sync::RwLockReadGuard<'_, Arc<T>> {
    slot.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_slot<T>(slot: &RwLock<Arc<T>>) -> std::sync::RwLockWriteGuard<'_, Arc<T>> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// A source serving canned bodies, with per-feed failure injection.
    struct StubSource {
        bodies: Mutex<std::collections::HashMap<FeedKind, Result<String, u16>>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                bodies: Mutex::new(std::collections::HashMap::new()),
            }
        }

        fn set_body(&self, kind: FeedKind, body: &str) {
            self.bodies.lock().unwrap().insert(kind, Ok(body.to_owned()));
        }

        fn set_failure(&self, kind: FeedKind, status: u16) {
            self.bodies.lock().unwrap().insert(kind, Err(status));
        }
    }

    #[async_trait]
    impl FeedSource for StubSource {
        async fn fetch(&self, kind: FeedKind) -> Result<String, FeedError> {
            match self.bodies.lock().unwrap().get(&kind) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FeedError::Status {
                    kind,
                    status: *status,
                }),
                None => Err(FeedError::EndpointNotConfigured(kind)),
            }
        }
    }

    const EDS_BODY: &str = r#"[{"features": [{
        "geometry": {"type": "LineString", "coordinates": [[32.52, 37.98], [32.53, 37.97]]},
        "properties": {"Name": "D300"}
    }]}]"#;

    #[tokio::test]
    async fn refresh_installs_a_snapshot() {
        let source = StubSource::new();
        source.set_body(FeedKind::Eds, EDS_BODY);
        let client = FeedClient::new(source);

        assert!(client.eds_snapshot().is_empty());
        assert!(client.installed_at(FeedKind::Eds).is_none());

        client.refresh(FeedKind::Eds).await.unwrap();

        assert_eq!(client.eds_snapshot().len(), 1);
        assert!(client.installed_at(FeedKind::Eds).is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_old_snapshot() {
        let source = StubSource::new();
        source.set_body(FeedKind::Eds, EDS_BODY);
        let client = FeedClient::new(source);
        client.refresh(FeedKind::Eds).await.unwrap();
        let installed = client.installed_at(FeedKind::Eds);

        client.source.set_failure(FeedKind::Eds, 503);
        let result = client.refresh(FeedKind::Eds).await;

        assert!(matches!(result, Err(FeedError::Status { status: 503, .. })));
        assert_eq!(client.eds_snapshot().len(), 1);
        assert_eq!(client.installed_at(FeedKind::Eds), installed);
    }

    #[tokio::test]
    async fn parse_failure_keeps_the_old_snapshot() {
        let source = StubSource::new();
        source.set_body(FeedKind::Eds, EDS_BODY);
        let client = FeedClient::new(source);
        client.refresh(FeedKind::Eds).await.unwrap();

        client.source.set_body(FeedKind::Eds, "<html>oops</html>");
        assert!(client.refresh(FeedKind::Eds).await.is_err());
        assert_eq!(client.eds_snapshot().len(), 1);
    }

    #[tokio::test]
    async fn readers_hold_their_snapshot_across_a_refresh() {
        let source = StubSource::new();
        source.set_body(FeedKind::Eds, EDS_BODY);
        let client = FeedClient::new(source);
        client.refresh(FeedKind::Eds).await.unwrap();

        let held = client.eds_snapshot();
        client.source.set_body(
            FeedKind::Eds,
            r#"[{"features": []}]"#,
        );
        client.refresh(FeedKind::Eds).await.unwrap();

        // The held snapshot is the old version; a fresh read sees the new.
        assert_eq!(held.len(), 1);
        assert!(client.eds_snapshot().is_empty());
    }

    #[tokio::test]
    async fn staleness_windows() {
        let source = StubSource::new();
        source.set_body(FeedKind::CustomAreas, "[]");
        let client = FeedClient::new(source);

        let now = epoch_ms();
        assert!(client.is_stale(FeedKind::CustomAreas, now));
        assert!(!client.has_recent_data(now));

        client.refresh(FeedKind::CustomAreas).await.unwrap();
        let installed = client.installed_at(FeedKind::CustomAreas).unwrap();

        // Fresh (and empty!) data counts as recent.
        assert!(!client.is_stale(FeedKind::CustomAreas, installed));
        assert!(client.has_recent_data(installed));

        // Eleven hours later: still inside the 12 h window.
        let eleven_hours = 11 * 60 * 60 * 1000;
        assert!(!client.is_stale(FeedKind::CustomAreas, installed + eleven_hours));
        // Thirteen hours later: stale.
        let thirteen_hours = 13 * 60 * 60 * 1000;
        assert!(client.is_stale(FeedKind::CustomAreas, installed + thirteen_hours));
    }
}
