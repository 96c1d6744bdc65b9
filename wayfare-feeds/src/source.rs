use crate::error::FeedError;
use crate::kind::FeedKind;
use async_trait::async_trait;

/// Where feed bodies come from.
///
/// The scheduler and [`crate::FeedClient`] only ever see this trait, which
/// keeps the refresh pipeline testable without a network: tests hand in a
/// source backed by string fixtures.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the raw body for one feed.
    ///
    /// # Errors
    ///
    /// Implementations surface transport-level failures (timeouts,
    /// non-success statuses, missing configuration) as [`FeedError`].
    async fn fetch(&self, kind: FeedKind) -> Result<String, FeedError>;
}

#[async_trait]
impl<T: FeedSource + ?Sized> FeedSource for Box<T> {
    async fn fetch(&self, kind: FeedKind) -> Result<String, FeedError> {
        (**self).fetch(kind).await
    }
}

/// Per-feed endpoint configuration.
///
/// A feed without an endpoint is simply never refreshed; this is the
/// supported way to run with a subset of the feeds enabled.
#[derive(Debug, Clone, Default)]
pub struct FeedEndpoints {
    pub eds: Option<String>,
    pub custom_areas: Option<String>,
    pub speed_limits: Option<String>,
}

impl FeedEndpoints {
    fn url_for(&self, kind: FeedKind) -> Option<&str> {
        match kind {
            FeedKind::Eds => self.eds.as_deref(),
            FeedKind::CustomAreas => self.custom_areas.as_deref(),
            FeedKind::SpeedLimits => self.speed_limits.as_deref(),
        }
    }

    pub fn is_configured(&self, kind: FeedKind) -> bool {
        self.url_for(kind).is_some()
    }
}

/// The production source: one HTTPS GET per feed, with the connect and
/// total timeouts from the schedule table.
pub struct HttpFeedSource {
    client: reqwest::Client,
    endpoints: FeedEndpoints,
}

impl HttpFeedSource {
    /// Builds the source and its HTTP client.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(endpoints: FeedEndpoints) -> Result<Self, FeedError> {
        // All three feeds share the same timeout budget, so one client
        // serves them all.
        let client = reqwest::Client::builder()
            .connect_timeout(FeedKind::Eds.connect_timeout())
            .timeout(FeedKind::Eds.fetch_timeout())
            .build()
            .map_err(FeedError::ClientBuild)?;
        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, kind: FeedKind) -> Result<String, FeedError> {
        let url = self
            .endpoints
            .url_for(kind)
            .ok_or(FeedError::EndpointNotConfigured(kind))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FeedError::Http { kind, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                kind,
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| FeedError::Http { kind, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_feed_is_an_error() {
        let source = HttpFeedSource::new(FeedEndpoints::default()).unwrap();
        assert!(matches!(
            source.fetch(FeedKind::Eds).await,
            Err(FeedError::EndpointNotConfigured(FeedKind::Eds))
        ));
    }

    #[test]
    fn endpoints_map_to_kinds() {
        let endpoints = FeedEndpoints {
            eds: Some("https://feeds.example/eds".into()),
            ..FeedEndpoints::default()
        };
        assert!(endpoints.is_configured(FeedKind::Eds));
        assert!(!endpoints.is_configured(FeedKind::CustomAreas));
    }
}
