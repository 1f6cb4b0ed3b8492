//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Print the embeddable fragment for a documentation URL
//! plugin-docs get https://github.com/jenkinsci/git-plugin/blob/master/README.md
//!
//! # Is this URL a recognized documentation source?
//! plugin-docs check https://plugins.jenkins.io/git
//!
//! # Show which upstream request a URL maps to, without fetching
//! plugin-docs resolve https://github.com/jenkinsci/git-plugin/blob/master/docs/INSTALL.md
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI structure for the `plugin-docs` command
#[derive(Parser, Clone, Debug)]
#[command(name = "plugin-docs")]
#[command(version)]
#[command(about = "Resolve plugin documentation URLs into embeddable HTML", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "PLUGIN_DOCS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Fetch documentation and print it as an HTML fragment
    Get {
        /// Documentation URL
        url: String,
    },

    /// Report whether a URL is a recognized documentation source
    Check {
        /// Documentation URL
        url: String,
    },

    /// Show the upstream request a URL resolves to
    Resolve {
        /// Documentation URL
        url: String,
    },
}
