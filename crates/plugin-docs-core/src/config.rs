//! Configuration for the documentation pipeline.
//!
//! Settings are layered: built-in defaults, then a TOML file, then environment
//! variables. Every field has a default, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Defaults**: 5 s timeouts, 6 h cache TTL, 1000 cache entries, public upstreams
//! 2. **Config file**: explicit path, or `config.toml` in the platform config dir
//! 3. **Environment variables**: `PLUGIN_DOCS_*` prefix
//!
//! ## Example Configuration File
//!
//! ```toml
//! [fetch]
//! connect_timeout_ms = 3000
//!
//! [cache]
//! ttl_secs = 3600
//! max_entries = 500
//!
//! [upstream]
//! github_api_url = "https://github-mirror.example.com/api"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`UpstreamConfig::github_api_url`].
pub const ENV_GITHUB_API_URL: &str = "PLUGIN_DOCS_GITHUB_API_URL";
/// Environment variable overriding [`UpstreamConfig::wiki_base_url`].
pub const ENV_WIKI_BASE_URL: &str = "PLUGIN_DOCS_WIKI_BASE_URL";
/// Environment variable overriding [`CacheConfig::ttl_secs`].
pub const ENV_CACHE_TTL_SECS: &str = "PLUGIN_DOCS_CACHE_TTL_SECS";
/// Environment variable overriding [`CacheConfig::max_entries`].
pub const ENV_CACHE_MAX_ENTRIES: &str = "PLUGIN_DOCS_CACHE_MAX_ENTRIES";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP fetch behaviour
    pub fetch: FetchConfig,
    /// Content cache sizing and expiry
    pub cache: CacheConfig,
    /// Upstream API locations
    pub upstream: UpstreamConfig,
}

/// Timeout policy for upstream requests.
///
/// Each request gets exactly one attempt. The three phases are bounded
/// separately, and their sum bounds the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Budget for obtaining a connection before the request starts.
    pub acquire_timeout_ms: u64,
    /// TCP/TLS connect timeout.
    pub connect_timeout_ms: u64,
    /// Maximum gap between reads of the response.
    pub read_timeout_ms: u64,
    /// `User-Agent` sent upstream. GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 5000,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            user_agent: concat!("plugin-docs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    /// Connect timeout as a [`Duration`].
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read timeout as a [`Duration`].
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Upper bound for a whole request across all three phases.
    pub const fn total_timeout(&self) -> Duration {
        Duration::from_millis(
            self.acquire_timeout_ms
                .saturating_add(self.connect_timeout_ms)
                .saturating_add(self.read_timeout_ms),
        )
    }
}

/// Content cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an entry stays valid after it was written.
    pub ttl_secs: u64,
    /// Maximum number of live entries.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 6 * 60 * 60,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Where API calls are sent.
///
/// URL recognition always targets the public hosts (`github.com`,
/// `wiki.jenkins.io`); these bases only decide where the resulting API
/// requests go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// GitHub REST API root, without trailing slash.
    pub github_api_url: String,
    /// Wiki root to send content API and direct page requests to.
    ///
    /// Unset means the wiki host named in the documentation URL is used, and
    /// direct page links are fetched exactly as given.
    pub wiki_base_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            wiki_base_url: None,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields defaults; a missing file at
    /// an explicit path is an error. Environment overrides are applied last and
    /// the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
    }

    /// Platform config file location, e.g. `~/.config/plugin-docs/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "jenkins", "plugin-docs")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply `PLUGIN_DOCS_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GITHUB_API_URL) {
            self.upstream.github_api_url = url;
        }
        if let Some(url) = lookup(ENV_WIKI_BASE_URL) {
            self.upstream.wiki_base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache.ttl_secs = parse_env(ENV_CACHE_TTL_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_MAX_ENTRIES) {
            self.cache.max_entries = parse_env(ENV_CACHE_MAX_ENTRIES, &raw)?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::Config("cache.max_entries must be at least 1".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::Config("cache.ttl_secs must be at least 1".into()));
        }
        let timeouts = [
            ("fetch.acquire_timeout_ms", self.fetch.acquire_timeout_ms),
            ("fetch.connect_timeout_ms", self.fetch.connect_timeout_ms),
            ("fetch.read_timeout_ms", self.fetch.read_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be at least 1")));
            }
        }
        let bases = [
            ("upstream.github_api_url", Some(&self.upstream.github_api_url)),
            ("upstream.wiki_base_url", self.upstream.wiki_base_url.as_ref()),
        ];
        for (name, base) in bases {
            let Some(base) = base else {
                continue;
            };
            let parsed = url::Url::parse(base)
                .map_err(|e| Error::InvalidUrl(format!("{name} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::InvalidUrl(format!("{name} must use http or https")));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has invalid value '{raw}'")))
}
