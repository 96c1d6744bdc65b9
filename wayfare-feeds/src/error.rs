use crate::kind::FeedKind;
use thiserror::Error;

/// Ways a feed refresh can fail.
///
/// None of these invalidate previously published snapshots; callers log the
/// error and retry on the next scheduled tick.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no endpoint configured for the {0} feed")]
    EndpointNotConfigured(FeedKind),
    #[error("failed to build the HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("fetching the {kind} feed failed: {source}")]
    Http {
        kind: FeedKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("the {kind} feed returned HTTP status {status}")]
    Status { kind: FeedKind, status: u16 },
    #[error("the {kind} feed body is not valid JSON: {source}")]
    Json {
        kind: FeedKind,
        #[source]
        source: serde_json::Error,
    },
}
