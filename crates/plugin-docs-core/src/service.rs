//! Documentation content service.
//!
//! [`WikiService`] turns a plugin's documentation URL into an HTML fragment:
//!
//! - blank URL: the "no documentation" fragment, without touching the cache
//! - unrecognized URL: a fragment linking to the URL, recomputed on every call
//! - recognized URL: cached content, loaded through the matching source on a miss;
//!   any load failure is logged and answered with the linking fragment, and is
//!   not cached
//!
//! The service is built once and shared by reference (or `Arc`) between callers.

use crate::cache::{CacheStatsSummary, Clock, ContentCache};
use crate::fetcher::{Fetch, Fetcher};
use crate::source::{SourceMatch, Sources};
use crate::{Config, Result};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Text placed before the link in the external documentation fragment.
pub const EXTERNAL_DOCUMENTATION_PREFIX: &str = "Documentation for this plugin is here: ";

/// Text of the fragment returned for blank URLs.
pub const NO_DOCUMENTATION_FOUND: &str = "No documentation for this plugin could be found";

/// Fragment pointing readers at documentation we cannot embed.
pub fn non_wiki_content(url: &str) -> String {
    format!(
        "<div>{}<a href=\"{}\">{}</a></div>",
        html_escape::encode_text(EXTERNAL_DOCUMENTATION_PREFIX),
        html_escape::encode_double_quoted_attribute(url),
        html_escape::encode_text(url)
    )
}

/// Fragment returned when a plugin has no documentation URL at all.
pub fn no_documentation_found() -> String {
    format!("<div>{NO_DOCUMENTATION_FOUND}</div>")
}

/// Resolves documentation URLs into embeddable HTML, with caching.
pub struct WikiService {
    sources: Arc<Sources>,
    fetcher: Arc<dyn Fetch>,
    cache: ContentCache<String>,
}

impl WikiService {
    /// Build a service with an HTTP fetcher configured from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::with_config(&config.fetch)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Build a service around a custom [`Fetch`] implementation.
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sources: Arc::new(Sources::new(&config.upstream)?),
            fetcher,
            cache: ContentCache::new(&config.cache)?,
        })
    }

    /// Build a service with a custom fetcher and cache clock.
    pub fn with_clock(
        config: &Config,
        fetcher: Arc<dyn Fetch>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sources: Arc::new(Sources::new(&config.upstream)?),
            fetcher,
            cache: ContentCache::with_clock(&config.cache, clock)?,
        })
    }

    /// Whether `url` follows a documentation convention we can embed.
    ///
    /// Pure pattern check; performs no I/O.
    pub fn is_valid_wiki_url(&self, url: &str) -> bool {
        self.sources.is_match(url)
    }

    /// Resolve `url` to its upstream request without fetching anything.
    pub fn resolve(&self, url: &str) -> Option<SourceMatch> {
        self.sources.resolve(url)
    }

    /// Documentation for `url` as an HTML fragment.
    ///
    /// Never fails: upstream and extraction problems degrade to a fragment that
    /// links to `url`.
    pub async fn get_wiki_content(&self, url: &str) -> String {
        if url.trim().is_empty() {
            return no_documentation_found();
        }

        let Some(source) = self.sources.resolve(url) else {
            debug!(%url, "not a recognized documentation source");
            return non_wiki_content(url);
        };

        let fetcher = Arc::clone(&self.fetcher);
        let loaded = self
            .cache
            .get_or_load(url, move || async move {
                let body = fetcher.fetch(source.endpoint(), source.headers()).await?;
                source.extract(&body)
            })
            .await;

        match loaded {
            Ok(content) => content,
            Err(err) => {
                if err.is_recoverable() {
                    warn!(%url, error = %err, category = err.category(), "Problem getting wiki content");
                } else {
                    error!(%url, error = %err, category = err.category(), "Problem getting wiki content");
                }
                non_wiki_content(url)
            },
        }
    }

    /// Drop the cached content for `url`.
    pub async fn invalidate(&self, url: &str) -> bool {
        self.cache.invalidate(url).await
    }

    /// Cache counters, for diagnostics.
    pub async fn cache_stats(&self) -> CacheStatsSummary {
        self.cache.stats().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::cache::tests::ManualClock;
    use async_trait::async_trait;
    use reqwest::header::HeaderMap;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses and records every requested URL.
    #[derive(Default)]
    struct ScriptedFetch {
        responses: Mutex<VecDeque<Result<String>>>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetch {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetch {
        async fn fetch(&self, url: &str, _headers: &HeaderMap) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Config("no scripted response".into())))
        }
    }

    const README_URL: &str = "https://github.com/jenkinsci/foo-plugin/blob/main/README.md";

    fn service(fetch: Arc<ScriptedFetch>) -> WikiService {
        WikiService::with_fetcher(&Config::default(), fetch).unwrap()
    }

    #[tokio::test]
    async fn test_blank_urls_get_no_documentation_fragment() {
        let fetch = ScriptedFetch::new(vec![]);
        let service = service(Arc::clone(&fetch));
        for url in ["", "   ", "\t\n"] {
            assert_eq!(
                service.get_wiki_content(url).await,
                "<div>No documentation for this plugin could be found</div>"
            );
        }
        assert!(fetch.requests().is_empty());
        assert_eq!(service.cache_stats().await.misses, 0);
    }

    #[tokio::test]
    async fn test_unrecognized_url_links_out_without_caching() {
        let fetch = ScriptedFetch::new(vec![]);
        let service = service(Arc::clone(&fetch));
        let url = "https://plugins.jenkins.io/docs?a=1&b=2";

        let html = service.get_wiki_content(url).await;

        assert_eq!(
            html,
            "<div>Documentation for this plugin is here: \
             <a href=\"https://plugins.jenkins.io/docs?a=1&amp;b=2\">https://plugins.jenkins.io/docs?a=1&amp;b=2</a></div>"
        );
        assert!(!service.is_valid_wiki_url(url));
        assert!(fetch.requests().is_empty());
        assert_eq!(service.cache_stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_recognized_url_is_fetched_once_and_cached() {
        let fetch = ScriptedFetch::new(vec![Ok(r#"<p><a href="docs/A.md">a</a></p>"#.into())]);
        let service = service(Arc::clone(&fetch));

        let first = service.get_wiki_content(README_URL).await;
        let second = service.get_wiki_content(README_URL).await;

        assert_eq!(
            first,
            r#"<p><a href="https://github.com/jenkinsci/foo-plugin/blob/main/docs/A.md">a</a></p>"#
        );
        assert_eq!(first, second);
        assert_eq!(
            fetch.requests(),
            vec!["https://api.github.com/repos/jenkinsci/foo-plugin/readme?ref=main"]
        );
    }

    #[tokio::test]
    async fn test_failure_falls_back_and_is_not_cached() {
        let fetch = ScriptedFetch::new(vec![
            Err(Error::UpstreamStatus {
                url: "https://api.github.com/repos/jenkinsci/foo-plugin/readme?ref=main".into(),
                status: 500,
            }),
            Ok("<p>back online</p>".into()),
        ]);
        let service = service(Arc::clone(&fetch));

        let fallback = service.get_wiki_content(README_URL).await;
        assert_eq!(fallback, non_wiki_content(README_URL));

        let recovered = service.get_wiki_content(README_URL).await;
        assert_eq!(recovered, "<p>back online</p>");
        assert_eq!(fetch.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_falls_back() {
        let fetch = ScriptedFetch::new(vec![Ok("<html><body>login</body></html>".into())]);
        let service = service(Arc::clone(&fetch));
        let url = "https://wiki.jenkins.io/display/JENKINS/Git+Plugin";

        assert_eq!(service.get_wiki_content(url).await, non_wiki_content(url));
        assert_eq!(service.cache_stats().await.entries, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_is_reloaded_once() {
        let clock = ManualClock::new();
        let fetch = ScriptedFetch::new(vec![Ok("<p>v1</p>".into()), Ok("<p>v2</p>".into())]);
        let service =
            WikiService::with_clock(&Config::default(), Arc::clone(&fetch) as Arc<dyn Fetch>, clock.clone())
                .unwrap();

        assert_eq!(service.get_wiki_content(README_URL).await, "<p>v1</p>");
        clock.advance(Duration::from_secs(6 * 60 * 60 + 1));
        assert_eq!(service.get_wiki_content(README_URL).await, "<p>v2</p>");
        assert_eq!(service.get_wiki_content(README_URL).await, "<p>v2</p>");
        assert_eq!(fetch.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_original_url() {
        let fetch = ScriptedFetch::new(vec![Ok("<p>a</p>".into()), Ok("<p>b</p>".into())]);
        let service = service(Arc::clone(&fetch));

        // Both resolve to the same README endpoint.
        service
            .get_wiki_content("https://github.com/jenkinsci/foo-plugin")
            .await;
        service
            .get_wiki_content("https://github.com/jenkinsci/foo-plugin/")
            .await;

        assert_eq!(fetch.requests().len(), 2);
        assert_eq!(service.cache_stats().await.entries, 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let fetch = ScriptedFetch::new(vec![Ok("<p>a</p>".into()), Ok("<p>b</p>".into())]);
        let service = service(Arc::clone(&fetch));

        service.get_wiki_content(README_URL).await;
        assert!(service.invalidate(README_URL).await);
        assert_eq!(service.get_wiki_content(README_URL).await, "<p>b</p>");
    }

    #[test]
    fn test_fragments() {
        assert_eq!(
            non_wiki_content("https://example.com/x"),
            "<div>Documentation for this plugin is here: <a href=\"https://example.com/x\">https://example.com/x</a></div>"
        );
        assert_eq!(
            no_documentation_found(),
            "<div>No documentation for this plugin could be found</div>"
        );
    }
}
