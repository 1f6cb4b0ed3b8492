//! Error types and handling for plugin-docs operations.
//!
//! Every fallible operation in this crate returns [`Result<T, Error>`]. Errors
//! carry enough context (URL, HTTP status) to be logged meaningfully at the
//! service boundary, where they are converted into fallback fragments instead
//! of being surfaced to callers.
//!
//! ## Error Categories
//!
//! - **Upstream Errors**: transport failures and non-200 responses
//! - **Extraction Errors**: the upstream body did not contain usable content
//! - **Configuration Errors**: invalid settings, unreadable config files or
//!   upstream bases that are not http(s) URLs
//!
//! ## Recovery Hints
//!
//! ```rust
//! use plugin_docs_core::Error;
//!
//! let err = Error::UpstreamStatus {
//!     url: "https://api.github.com/repos/jenkinsci/git-plugin/readme".to_string(),
//!     status: 503,
//! };
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "upstream");
//! ```

use thiserror::Error;

/// The main error type for plugin-docs operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to an upstream host.
    ///
    /// Covers DNS, connect, TLS and timeout failures. The underlying
    /// `reqwest::Error` is preserved for diagnostics.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with anything other than `200 OK`.
    #[error("Unable to get content from {url} - returned status code {status}")]
    UpstreamStatus {
        /// Endpoint that was requested.
        url: String,
        /// HTTP status code returned by the upstream.
        status: u16,
    },

    /// The upstream body was fetched but held no usable documentation.
    ///
    /// ## Common Causes
    ///
    /// - Wiki page without a `wiki-content` element
    /// - Empty README or file rendering
    #[error("No content extracted from {url}: {reason}")]
    Extraction {
        /// Original documentation URL.
        url: String,
        /// Why extraction gave up.
        reason: String,
    },

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured upstream base is not a usable http(s) URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Config(format!("invalid source pattern: {err}"))
    }
}

impl Error {
    /// Check if the error might succeed on a later attempt.
    ///
    /// Nothing in this crate retries on its own; the hint is used for log
    /// levels and by callers that want their own retry policy.
    ///
    /// - `true` for timeouts, connect failures, `429` and `5xx` statuses
    /// - `false` for everything else
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get the error category as a static string identifier.
    ///
    /// Used as the `category` field on log events.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::UpstreamStatus { .. } => "upstream",
            Self::Extraction { .. } => "extraction",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Convenience type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
