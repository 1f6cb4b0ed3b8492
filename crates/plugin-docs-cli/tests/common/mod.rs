#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstreams nothing listens on, so any accidental fetch fails fast.
const UNREACHABLE_UPSTREAM: &str = r#"
[upstream]
github_api_url = "http://127.0.0.1:9"
wiki_base_url = "http://127.0.0.1:9"

[fetch]
acquire_timeout_ms = 500
connect_timeout_ms = 500
read_timeout_ms = 500
"#;

fn config_file() -> &'static Path {
    static CONFIG: OnceLock<(TempDir, std::path::PathBuf)> = OnceLock::new();
    let (_, path) = CONFIG.get_or_init(|| {
        let dir = tempfile::tempdir().expect("failed to create config dir for tests");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, UNREACHABLE_UPSTREAM).expect("failed to write test config");
        (dir, path)
    });
    path
}

/// Create a configured `plugin-docs` command isolated from the user's config.
#[allow(dead_code)]
pub fn plugin_docs_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("plugin-docs"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("PLUGIN_DOCS_GITHUB_API_URL")
        .env_remove("PLUGIN_DOCS_WIKI_BASE_URL")
        .env_remove("PLUGIN_DOCS_CACHE_TTL_SECS")
        .env_remove("PLUGIN_DOCS_CACHE_MAX_ENTRIES");
    cmd.env("PLUGIN_DOCS_CONFIG", config_file());
    cmd.env("NO_COLOR", "1");
    cmd
}
