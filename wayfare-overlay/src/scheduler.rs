use crate::system::SystemInner;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use wayfare_feeds::{FeedError, FeedKind};

/// Spawns one polling loop per feed onto the system's runtime.
///
/// Each loop ticks immediately (the initial fetch on startup) and then at
/// the feed's cadence. A shutdown signal breaks the loop at the next await
/// point; in-flight fetches get the runtime's shutdown grace period.
pub(crate) fn spawn_feed_loops(
    runtime: &Runtime,
    inner: &Arc<SystemInner>,
    shutdown: &watch::Receiver<bool>,
) {
    for kind in FeedKind::ALL {
        runtime.spawn(feed_loop(Arc::clone(inner), kind, shutdown.clone()));
    }
}

async fn feed_loop(inner: Arc<SystemInner>, kind: FeedKind, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(kind.refresh_period());
    // If a tick is late (long fetch, suspended host), run once and realign
    // rather than firing a burst of catch-up refreshes.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(feed = %kind, period_secs = kind.refresh_period().as_secs(), "feed loop started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!(feed = %kind, "feed loop stopping");
                break;
            }
            _ = interval.tick() => {
                tick(&inner, kind).await;
            }
        }
    }
}

async fn tick(inner: &Arc<SystemInner>, kind: FeedKind) {
    match inner.feeds.refresh(kind).await {
        Ok(()) => {}
        Err(FeedError::EndpointNotConfigured(_)) => {
            // Running with a subset of feeds is a supported configuration,
            // not an incident.
            debug!(feed = %kind, "no endpoint configured; skipping refresh");
            return;
        }
        Err(error) => {
            warn!(feed = %kind, %error, "feed refresh failed; keeping previous snapshot");
            return;
        }
    }

    // Matching the snapshot against the whole graph is CPU-bound; keep it
    // off the timer threads.
    let worker = Arc::clone(inner);
    if let Err(error) = tokio::task::spawn_blocking(move || worker.rebuild(kind)).await {
        warn!(feed = %kind, %error, "overlay rebuild task failed");
    }
}
