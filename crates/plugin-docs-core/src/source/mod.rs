//! Recognition of documentation hosting conventions.
//!
//! A documentation URL is matched against a fixed, ordered list of source kinds.
//! The first kind whose pattern matches decides which upstream API is called,
//! which headers it needs and how relative links in the returned content are
//! resolved. Matching is pure; no network I/O happens here.
//!
//! ## Source Kinds (in dispatch order)
//!
//! - [`SourceKind::WikiApi`]: `wiki.jenkins.io/display/JENKINS/<title>` via the content API
//! - [`SourceKind::WikiDirect`]: `wiki.jenkins.io/pages/viewpage.action?pageId=<id>`
//! - [`SourceKind::GithubReadme`]: repository root, branch or README of a `jenkinsci` repo
//! - [`SourceKind::GithubContents`]: any `.md`/`.adoc` file of a `jenkinsci` repo
//!
//! ## Example
//!
//! ```rust
//! use plugin_docs_core::{SourceKind, Sources, UpstreamConfig};
//!
//! let sources = Sources::new(&UpstreamConfig::default())?;
//! let found = sources
//!     .resolve("https://github.com/jenkinsci/git-plugin/blob/master/docs/INSTALL.md")
//!     .expect("recognized");
//! assert_eq!(found.kind(), SourceKind::GithubContents);
//! assert_eq!(found.directory(), "/docs/");
//! # Ok::<(), plugin_docs_core::Error>(())
//! ```

mod github;
mod wiki;

use crate::fragment::LinkBase;
use crate::{Result, UpstreamConfig};
use regex::{Captures, Regex};
use reqwest::header::HeaderMap;
use std::fmt;
use tracing::debug;

/// GitHub organization whose repositories are recognized.
pub const GITHUB_ORG: &str = "jenkinsci";

/// One upstream documentation hosting convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Wiki page rendered through the wiki content API.
    WikiApi,
    /// Wiki page fetched as rendered HTML from its own URL.
    WikiDirect,
    /// Repository README rendered by the GitHub API.
    GithubReadme,
    /// Arbitrary markdown/asciidoc file rendered by the GitHub contents API.
    GithubContents,
}

impl SourceKind {
    /// All kinds in dispatch order.
    pub const ALL: [Self; 4] = [
        Self::WikiApi,
        Self::WikiDirect,
        Self::GithubReadme,
        Self::GithubContents,
    ];

    /// Stable identifier used in logs and CLI output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WikiApi => "wiki-api",
            Self::WikiDirect => "wiki-direct",
            Self::GithubReadme => "github-readme",
            Self::GithubContents => "github-contents",
        }
    }

    const fn is_wiki(self) -> bool {
        matches!(self, Self::WikiApi | Self::WikiDirect)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A documentation URL resolved to a concrete upstream request.
#[derive(Debug, Clone)]
pub struct SourceMatch {
    kind: SourceKind,
    url: String,
    endpoint: String,
    headers: HeaderMap,
    repo: Option<String>,
    branch: Option<String>,
    page: Option<String>,
    directory: String,
    link_base: LinkBase,
}

impl SourceMatch {
    /// Which convention matched.
    pub const fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The documentation URL as given by the caller.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// API endpoint to fetch.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Headers the endpoint requires.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Repository name for GitHub sources.
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    /// Branch for GitHub sources, when the URL names one.
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    /// Page title or page id for wiki sources.
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    /// Folder of the source document, with leading and trailing slash.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// How relative links in the extracted content are resolved.
    pub const fn link_base(&self) -> &LinkBase {
        &self.link_base
    }

    /// Carve the documentation fragment out of an upstream body.
    pub fn extract(&self, body: &str) -> Result<String> {
        if self.kind.is_wiki() {
            wiki::extract(body, self)
        } else {
            github::extract(body, self)
        }
    }
}

struct Matcher {
    kind: SourceKind,
    pattern: Regex,
}

/// The ordered set of recognized documentation conventions.
///
/// Built once and shared read-only; holds no mutable state.
pub struct Sources {
    matchers: Vec<Matcher>,
    github_api_url: String,
    wiki_base_url: Option<String>,
}

impl Sources {
    /// Compile all patterns, sending API calls to the given upstreams.
    pub fn new(upstream: &UpstreamConfig) -> Result<Self> {
        let matchers = SourceKind::ALL
            .into_iter()
            .map(|kind| {
                let pattern = match kind {
                    SourceKind::WikiApi => wiki::API_PATTERN.to_string(),
                    SourceKind::WikiDirect => wiki::DIRECT_PATTERN.to_string(),
                    SourceKind::GithubReadme => github::readme_pattern(GITHUB_ORG),
                    SourceKind::GithubContents => github::contents_pattern(GITHUB_ORG),
                };
                Ok(Matcher {
                    kind,
                    pattern: Regex::new(&pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            matchers,
            github_api_url: upstream.github_api_url.trim_end_matches('/').to_string(),
            wiki_base_url: upstream
                .wiki_base_url
                .as_deref()
                .map(|base| base.trim_end_matches('/').to_string()),
        })
    }

    /// Resolve `url` with the first matching convention.
    pub fn resolve(&self, url: &str) -> Option<SourceMatch> {
        let url = url.trim();
        let found = self.matchers.iter().find_map(|matcher| {
            matcher
                .pattern
                .captures(url)
                .map(|caps| self.build(matcher.kind, url, &caps))
        });
        if let Some(found) = &found {
            debug!(%url, kind = %found.kind, endpoint = %found.endpoint, "resolved documentation source");
        }
        found
    }

    /// Whether any convention recognizes `url`.
    pub fn is_match(&self, url: &str) -> bool {
        let url = url.trim();
        self.matchers.iter().any(|matcher| matcher.pattern.is_match(url))
    }

    fn build(&self, kind: SourceKind, url: &str, caps: &Captures<'_>) -> SourceMatch {
        match kind {
            SourceKind::WikiApi => wiki::api_match(url, caps, self.wiki_base_url.as_deref()),
            SourceKind::WikiDirect => wiki::direct_match(url, caps, self.wiki_base_url.as_deref()),
            SourceKind::GithubReadme => github::readme_match(url, caps, &self.github_api_url),
            SourceKind::GithubContents => github::contents_match(url, caps, &self.github_api_url),
        }
    }
}

fn capture(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().to_string())
}
