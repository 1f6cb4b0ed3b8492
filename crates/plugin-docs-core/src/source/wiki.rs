use super::{SourceKind, SourceMatch, capture};
use crate::fragment::{self, LinkBase};
use crate::{Error, Result};
use regex::Captures;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use scraper::Html;
use tracing::warn;

pub(super) const API_PATTERN: &str =
    r"^(https?://wiki\.jenkins(?:-ci\.org|\.io))/display/(?:jenkins|JENKINS)/([^/?#]+)/?$";

pub(super) const DIRECT_PATTERN: &str =
    r"^(https?://wiki\.jenkins(?:-ci\.org|\.io))/pages/viewpage\.action\?pageId=(\d+)$";

/// Class of the element holding the page body in rendered wiki HTML.
const CONTENT_CLASS: &str = "wiki-content";

const API_VERSION_HEADER: &str = "x-atlassian-api-version";

pub(super) fn api_match(url: &str, caps: &Captures<'_>, wiki_base: Option<&str>) -> SourceMatch {
    let host = capture(caps, 1).unwrap_or_default();
    let title = capture(caps, 2).unwrap_or_default();
    let api_root = wiki_base.unwrap_or(&host);

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static("1"),
    );

    SourceMatch {
        kind: SourceKind::WikiApi,
        url: url.to_string(),
        endpoint: format!("{api_root}/rest/api/content/render?spaceKey=JENKINS&title={title}"),
        headers,
        repo: None,
        branch: None,
        page: Some(title),
        directory: "/display/JENKINS/".to_string(),
        link_base: LinkBase::new(host, "/display/JENKINS/"),
    }
}

/// Without a configured wiki base the page is fetched from the URL as given.
pub(super) fn direct_match(url: &str, caps: &Captures<'_>, wiki_base: Option<&str>) -> SourceMatch {
    let host = capture(caps, 1).unwrap_or_default();
    let page_id = capture(caps, 2).unwrap_or_default();
    let endpoint = wiki_base.map_or_else(
        || url.to_string(),
        |base| format!("{base}/pages/viewpage.action?pageId={page_id}"),
    );

    SourceMatch {
        kind: SourceKind::WikiDirect,
        url: url.to_string(),
        endpoint,
        headers: HeaderMap::new(),
        repo: None,
        branch: None,
        page: Some(page_id),
        directory: "/pages/".to_string(),
        link_base: LinkBase::new(host, "/pages/"),
    }
}

pub(super) fn extract(body: &str, source: &SourceMatch) -> Result<String> {
    if body.trim().is_empty() {
        warn!(url = %source.url, "can't clean empty wiki content");
        return Err(Error::Extraction {
            url: source.url.clone(),
            reason: "empty response body".to_string(),
        });
    }

    let document = Html::parse_document(body);
    let Some(content) = fragment::find_by_class(&document, CONTENT_CLASS) else {
        warn!(url = %source.url, "{CONTENT_CLASS} not found in content");
        return Err(Error::Extraction {
            url: source.url.clone(),
            reason: format!("no element with class '{CONTENT_CLASS}'"),
        });
    };

    Ok(fragment::normalize_element(content, &source.link_base))
}
