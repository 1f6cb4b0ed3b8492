//! # plugin-docs-core
//!
//! Turns a plugin's documentation URL into a cleaned, self-contained HTML
//! fragment that can be embedded in another page.
//!
//! ## Architecture
//!
//! - **Sources** ([`source`]): ordered URL conventions (wiki API, wiki page,
//!   GitHub README, GitHub file) deciding which upstream API to call
//! - **Fetching** ([`fetcher`]): one-attempt HTTP fetch with fixed timeouts
//! - **Fragments** ([`fragment`]): link absolutization and id cleanup
//! - **Caching** ([`cache`]): TTL + LRU cache with single-flight loads
//! - **Service** ([`service`]): the orchestration callers talk to
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plugin_docs_core::{Config, WikiService};
//!
//! # async fn run() -> plugin_docs_core::Result<()> {
//! let service = WikiService::new(&Config::load(None)?)?;
//! let url = "https://github.com/jenkinsci/git-plugin/blob/master/README.md";
//! assert!(service.is_valid_wiki_url(url));
//! let html = service.get_wiki_content(url).await;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! [`WikiService::get_wiki_content`] never fails; everything underneath returns
//! [`Result<T, Error>`] so failures can be logged with their [`Error::category`].

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod fragment;
pub mod service;
pub mod source;

pub use cache::{CacheStatsSummary, Clock, ContentCache, SystemClock};
pub use config::{CacheConfig, Config, FetchConfig, UpstreamConfig};
pub use error::{Error, Result};
pub use fetcher::{Fetch, Fetcher};
pub use fragment::LinkBase;
pub use service::{
    EXTERNAL_DOCUMENTATION_PREFIX, NO_DOCUMENTATION_FOUND, WikiService, no_documentation_found,
    non_wiki_content,
};
pub use source::{GITHUB_ORG, SourceKind, SourceMatch, Sources};
