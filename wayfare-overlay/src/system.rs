use crate::binder::{bind_request, BoundRequest};
use crate::error::OverlayError;
use crate::index::OverlayIndex;
use crate::scheduler::spawn_feed_loops;
use crate::tables::{OverlaySample, OverlayStats};
use crate::weighting::OverlayWeighting;
use serde_json::json;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use wayfare_feeds::{epoch_ms, FeedClient, FeedEndpoints, FeedKind, FeedSource, HttpFeedSource};
use wayfare_graph::{RequestHints, RoadGraph, RoutingProfile, Weighting};
use wayfare_match::EdgePolylineCache;

/// How long in-flight fetches get to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Configuration for one [`OverlaySystem`].
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub endpoints: FeedEndpoints,
    /// Capacity of the shared edge-polyline cache.
    pub polyline_cache_capacity: NonZeroUsize,
    /// Whether to run the background refresh scheduler. Hosts that drive
    /// [`OverlaySystem::refresh`] themselves (tests, batch tools) turn
    /// this off.
    pub run_scheduler: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            endpoints: FeedEndpoints::default(),
            polyline_cache_capacity: NonZeroUsize::new(100_000).expect("non-zero"),
            run_scheduler: true,
        }
    }
}

/// Shared state behind the container: everything the scheduler tasks and
/// the request path both touch.
pub(crate) struct SystemInner {
    pub(crate) graph: Arc<dyn RoadGraph>,
    pub(crate) feeds: FeedClient<Box<dyn FeedSource>>,
    pub(crate) index: OverlayIndex,
    pub(crate) cache: EdgePolylineCache,
    pub(crate) scheduler_running: AtomicBool,
}

impl SystemInner {
    /// Rebuilds the overlay table for `kind` from the current snapshot.
    pub(crate) fn rebuild(&self, kind: FeedKind) {
        match kind {
            FeedKind::Eds => {
                let snapshot = self.feeds.eds_snapshot();
                self.index
                    .rebuild_eds(self.graph.as_ref(), &self.cache, &snapshot);
            }
            FeedKind::CustomAreas => {
                let snapshot = self.feeds.custom_area_snapshot();
                self.index
                    .rebuild_custom_areas(self.graph.as_ref(), &self.cache, &snapshot);
            }
            FeedKind::SpeedLimits => {
                let snapshot = self.feeds.speed_limit_snapshot();
                self.index
                    .rebuild_speed_limits(self.graph.as_ref(), &self.cache, &snapshot);
            }
        }
    }
}

/// The overlay subsystem's container object.
///
/// Owns every piece of lifecycle-bound state: feed client, overlay index,
/// polyline cache, and the scheduler runtime. Nothing is global; two
/// systems in one process do not interfere.
pub struct OverlaySystem {
    inner: Arc<SystemInner>,
    runtime: tokio::runtime::Runtime,
    shutdown: watch::Sender<bool>,
}

impl OverlaySystem {
    /// Builds a system fetching over HTTPS from the configured endpoints.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client or the scheduler runtime cannot be built.
    pub fn new(graph: Arc<dyn RoadGraph>, config: OverlayConfig) -> Result<Self, OverlayError> {
        let source = HttpFeedSource::new(config.endpoints.clone())?;
        Self::with_source(graph, Box::new(source), config)
    }

    /// Builds a system over an arbitrary [`FeedSource`].
    ///
    /// # Errors
    ///
    /// Fails if the scheduler runtime cannot be built.
    pub fn with_source(
        graph: Arc<dyn RoadGraph>,
        source: Box<dyn FeedSource>,
        config: OverlayConfig,
    ) -> Result<Self, OverlayError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("wayfare-feed")
            .enable_all()
            .build()?;
        let inner = Arc::new(SystemInner {
            graph,
            feeds: FeedClient::new(source),
            index: OverlayIndex::new(),
            cache: EdgePolylineCache::new(config.polyline_cache_capacity),
            scheduler_running: AtomicBool::new(false),
        });
        let (shutdown, shutdown_rx) = watch::channel(false);

        if config.run_scheduler {
            spawn_feed_loops(&runtime, &inner, &shutdown_rx);
            inner.scheduler_running.store(true, Ordering::Release);
        }

        Ok(Self {
            inner,
            runtime,
            shutdown,
        })
    }

    /// Forces an immediate fetch-and-rebuild of one feed.
    ///
    /// # Errors
    ///
    /// Returns the fetch or parse failure; the previous snapshot and table
    /// stay live in that case.
    pub fn refresh(&self, kind: FeedKind) -> Result<(), OverlayError> {
        self.runtime.block_on(self.inner.feeds.refresh(kind))?;
        self.inner.rebuild(kind);
        Ok(())
    }

    /// Binds a request and builds the wrapping weighting for it.
    ///
    /// The weighting captures the current overlay tables; refreshes landing
    /// after this call do not affect the request.
    pub fn overlay_weighting<W: Weighting>(
        &self,
        base: W,
        hints: &RequestHints,
        profile: RoutingProfile,
    ) -> (BoundRequest, OverlayWeighting<W>) {
        let bound = bind_request(hints, profile);
        if !bound.flags.any_active() && !self.inner.index.is_built(FeedKind::Eds) {
            info!("request with overlays inactive and no tables built; serving base weights");
        }
        let weighting = OverlayWeighting::new(
            base,
            Arc::clone(&self.inner.graph),
            self.inner.index.eds_table(),
            self.inner.index.custom_area_table(),
            self.inner.index.speed_limit_table(),
            bound.flags,
        );
        (bound, weighting)
    }

    /// Counters for the observability endpoint.
    pub fn overlay_stats(&self) -> OverlayStats {
        self.inner.index.stats()
    }

    /// True while the newest snapshot install is within its staleness
    /// window.
    pub fn has_recent_data(&self) -> bool {
        self.inner.feeds.has_recent_data(epoch_ms())
    }

    /// Up to ten edge overlay records, for debug observability output.
    pub fn sample_entries(&self) -> Vec<OverlaySample> {
        self.inner.index.sample(10)
    }

    /// The JSON body served by the host's observability endpoint.
    pub fn observability_payload(&self, debug: bool) -> serde_json::Value {
        let mut payload = json!({
            "feed_running": self.inner.scheduler_running.load(Ordering::Acquire),
            "eds_entries": self.inner.index.eds_table().len(),
            "overlay_stats": self.overlay_stats(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if debug {
            payload["sample"] = serde_json::to_value(self.sample_entries())
                .unwrap_or(serde_json::Value::Null);
        }
        payload
    }

    /// Test hook: drops the polyline cache. Snapshots and tables are
    /// untouched.
    pub fn clear_polyline_cache(&self) {
        self.inner.cache.clear();
    }

    /// Stops the scheduler and tears down the runtime.
    ///
    /// In-flight fetches get [`SHUTDOWN_GRACE`] to finish; requests that
    /// already hold snapshots or weightings are unaffected, since
    /// publication is reference-counted.
    pub fn shutdown(self) {
        self.inner.scheduler_running.store(false, Ordering::Release);
        // Receivers may all be gone already when the scheduler never ran.
        let _ = self.shutdown.send(true);
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
        info!("overlay system shut down");
    }
}
