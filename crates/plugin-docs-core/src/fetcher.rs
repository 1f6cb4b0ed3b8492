//! Upstream HTTP fetching.
//!
//! One attempt per request, bounded by the configured timeouts. Anything but
//! `200 OK` is reported as [`Error::UpstreamStatus`].

use crate::{Error, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Capability for retrieving an upstream document.
///
/// Implementations make exactly one attempt and succeed only on `200 OK`.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` with `headers`, returning the response body as text.
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<String>;
}

/// HTTP client for upstream documentation APIs
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the default 5 s connect/read/acquire timeouts
    pub fn new() -> Result<Self> {
        Self::with_config(&FetchConfig::default())
    }

    /// Creates a fetcher from explicit timeout settings
    pub fn with_config(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .timeout(config.total_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<String> {
        debug!(%url, "fetching upstream content");

        // The response (and its pooled connection) is released on every return path.
        let response = self.client.get(url).headers(headers.clone()).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            warn!(
                %url,
                status = status.as_u16(),
                "Unable to get content - returned non-200 status"
            );
            return Err(Error::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        info!("Fetched {} bytes from {}", content.len(), url);
        Ok(content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT, HeaderValue};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[tokio::test]
    async fn test_fetcher_creation() {
        assert!(Fetcher::new().is_ok(), "Fetcher creation should succeed");
    }

    #[tokio::test]
    async fn test_fetch_sends_headers_and_returns_body() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/jenkinsci/git-plugin/readme"))
            .and(header("accept", "application/vnd.github.v3.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>readme</p>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3.html"));

        let fetcher = Fetcher::new()?;
        let url = format!("{}/repos/jenkinsci/git-plugin/readme", mock_server.uri());
        let body = fetcher.fetch(&url, &headers).await?;

        assert_eq!(body, "<p>readme</p>");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_200_is_upstream_status() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        for (route, code) in [("/missing", 404_u16), ("/broken", 500), ("/empty", 204)] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(code))
                .mount(&mock_server)
                .await;
        }

        let fetcher = Fetcher::new()?;
        for (route, code) in [("/missing", 404_u16), ("/broken", 500), ("/empty", 204)] {
            let url = format!("{}{route}", mock_server.uri());
            match fetcher.fetch(&url, &HeaderMap::new()).await {
                Err(Error::UpstreamStatus { url: failed, status }) => {
                    assert_eq!(status, code);
                    assert_eq!(failed, url);
                },
                other => panic!("Expected UpstreamStatus for {route}, got: {other:?}"),
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_timeout() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow content")
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&mock_server)
            .await;

        let config = FetchConfig {
            acquire_timeout_ms: 50,
            connect_timeout_ms: 50,
            read_timeout_ms: 100,
            ..FetchConfig::default()
        };
        let fetcher = Fetcher::with_config(&config)?;
        let url = format!("{}/slow", mock_server.uri());

        let start_time = std::time::Instant::now();
        let result = fetcher.fetch(&url, &HeaderMap::new()).await;

        match result {
            Err(err @ Error::Network(_)) => assert!(err.is_recoverable()),
            other => panic!("Expected timeout, got: {other:?}"),
        }
        assert!(start_time.elapsed() < Duration::from_millis(800));
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() -> anyhow::Result<()> {
        let fetcher = Fetcher::new()?;
        // Port 9 (discard) is closed on test hosts.
        let result = fetcher.fetch("http://127.0.0.1:9/", &HeaderMap::new()).await;
        assert!(matches!(result, Err(Error::Network(_))));
        Ok(())
    }
}
