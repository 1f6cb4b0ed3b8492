use super::{GITHUB_ORG, SourceKind, SourceMatch, capture};
use crate::fragment::{self, LinkBase};
use crate::{Error, Result};
use regex::Captures;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::warn;

const GITHUB_HOST: &str = "https://github.com";

/// Asks the API for the rendered HTML instead of the base64 payload.
const RENDERED_HTML: &str = "application/vnd.github.v3.html";

/// Branch used for link rewriting when the URL does not name one.
const DEFAULT_BRANCH: &str = "HEAD";

/// Repository root, `blob|tree/<branch>`, or the top-level README on a branch.
pub(super) fn readme_pattern(org: &str) -> String {
    format!(
        r"^https?://github\.com/{}/([^/.]+)(?:/(?:blob|tree)/([^/]+)(?:/(?i:readme)\.(?:md|adoc))?)?/?$",
        regex::escape(org)
    )
}

/// A markdown or asciidoc file anywhere in the repository.
pub(super) fn contents_pattern(org: &str) -> String {
    format!(
        r"^https?://github\.com/{}/([^/.]+)/blob/([^/]+)/(.+\.(?:md|adoc))$",
        regex::escape(org)
    )
}

pub(super) fn readme_match(url: &str, caps: &Captures<'_>, api: &str) -> SourceMatch {
    let repo = capture(caps, 1).unwrap_or_default();
    let branch = capture(caps, 2);
    let endpoint = with_ref(format!("{api}/repos/{GITHUB_ORG}/{repo}/readme"), branch.as_deref());
    build(SourceKind::GithubReadme, url, endpoint, repo, branch, "/".to_string())
}

pub(super) fn contents_match(url: &str, caps: &Captures<'_>, api: &str) -> SourceMatch {
    let repo = capture(caps, 1).unwrap_or_default();
    let branch = capture(caps, 2);
    let path = capture(caps, 3).unwrap_or_default();
    let directory = format!("/{}", &path[..path.rfind('/').map_or(0, |idx| idx + 1)]);
    let endpoint = with_ref(
        format!("{api}/repos/{GITHUB_ORG}/{repo}/contents/{path}"),
        branch.as_deref(),
    );
    build(SourceKind::GithubContents, url, endpoint, repo, branch, directory)
}

fn with_ref(endpoint: String, branch: Option<&str>) -> String {
    match branch {
        Some(branch) => format!("{endpoint}?ref={branch}"),
        None => endpoint,
    }
}

fn build(
    kind: SourceKind,
    url: &str,
    endpoint: String,
    repo: String,
    branch: Option<String>,
    directory: String,
) -> SourceMatch {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(RENDERED_HTML));

    let link_branch = branch.as_deref().unwrap_or(DEFAULT_BRANCH);
    let link_base = LinkBase::new(
        GITHUB_HOST,
        format!("/{GITHUB_ORG}/{repo}/blob/{link_branch}{directory}"),
    )
    .with_src_path(format!("/{GITHUB_ORG}/{repo}/raw/{link_branch}{directory}"));

    SourceMatch {
        kind,
        url: url.to_string(),
        endpoint,
        headers,
        repo: Some(repo),
        branch,
        page: None,
        directory,
        link_base,
    }
}

/// The API already returns just the rendered document, so the whole body is
/// normalized.
pub(super) fn extract(body: &str, source: &SourceMatch) -> Result<String> {
    let html = fragment::normalize_fragment(body, &source.link_base);
    if html.trim().is_empty() {
        warn!(url = %source.url, "GitHub returned an empty rendering");
        return Err(Error::Extraction {
            url: source.url.clone(),
            reason: "empty rendering".to_string(),
        });
    }
    Ok(html)
}
