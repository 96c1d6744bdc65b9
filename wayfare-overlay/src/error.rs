use thiserror::Error;
use wayfare_feeds::FeedError;

/// Failures surfaced by the overlay container.
///
/// Routing requests never see these: a request against a system whose
/// feeds are failing simply runs with inactive overlays. Only lifecycle
/// operations (construction, forced refresh) report errors.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("failed to start the scheduler runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
