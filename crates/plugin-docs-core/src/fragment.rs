//! HTML fragment normalization.
//!
//! Upstream documentation is rendered relative to the page it came from. Before
//! it can be embedded elsewhere every `href`/`src` must be made absolute, and the
//! `user-content-` prefix GitHub injects into heading ids must go so in-page
//! table-of-contents links keep working.
//!
//! Parsing is done with `scraper`; serialization is done here so attributes can
//! be rewritten on the way out. The output is stable: normalizing an already
//! normalized fragment returns it unchanged.

use scraper::node::Node;
use scraper::{ElementRef, Html};
use std::fmt::Write as _;

/// Prefix GitHub adds to ids of headings and anchors in rendered markdown.
pub const USER_CONTENT_PREFIX: &str = "user-content-";

const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

/// Elements whose content the parser keeps as unescaped text (`noscript`
/// included, since parsing runs with scripting enabled).
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// How relative links in a fragment are resolved.
///
/// `host` is scheme plus authority with no trailing slash. The paths are parent
/// folders with leading and trailing slash; `src` attributes may resolve against
/// a different folder than `href` (GitHub serves raw images from `/raw/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBase {
    host: String,
    href_path: String,
    src_path: String,
}

impl LinkBase {
    /// Resolve both `href` and `src` against the same folder.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            host: host.into(),
            href_path: path.clone(),
            src_path: path,
        }
    }

    /// Resolve `src` attributes against a different folder than `href`.
    #[must_use]
    pub fn with_src_path(mut self, path: impl Into<String>) -> Self {
        self.src_path = path.into();
        self
    }

    /// Scheme and authority used for root-relative links.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Folder used for relative `href` values.
    pub fn href_path(&self) -> &str {
        &self.href_path
    }

    /// Folder used for relative `src` values.
    pub fn src_path(&self) -> &str {
        &self.src_path
    }

    /// Make a single link value absolute.
    ///
    /// Root-relative values get the host, scheme-qualified and protocol-relative
    /// values and in-page anchors are kept, everything else is resolved against
    /// the folder for `attribute`.
    pub fn absolutize(&self, attribute: &str, value: &str) -> String {
        if value.starts_with('/') && !value.starts_with("//") {
            return format!("{}{value}", self.host);
        }
        if value.starts_with("//") || value.starts_with('#') || has_scheme(value) {
            return value.to_string();
        }
        let path = if attribute == "src" {
            &self.src_path
        } else {
            &self.href_path
        };
        format!("{}{path}{value}", self.host)
    }
}

/// Remove every `user-content-` occurrence from an id.
///
/// Applied until none remain, so overlapping leftovers like
/// `user-user-content-content-x` are fully cleaned in one pass.
pub fn strip_user_content_prefix(id: &str) -> String {
    let mut id = id.to_string();
    while id.contains(USER_CONTENT_PREFIX) {
        id = id.replace(USER_CONTENT_PREFIX, "");
    }
    id
}

/// First element in the document carrying `class_name`.
pub fn find_by_class<'a>(document: &'a Html, class_name: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().classes().any(|class| class == class_name))
}

/// Normalize a whole HTML fragment (GitHub renderings, synthesized content).
pub fn normalize_fragment(html: &str, base: &LinkBase) -> String {
    let fragment = Html::parse_fragment(html);
    let mut serializer = Serializer::new(base, html.len());
    serializer.children(fragment.root_element(), false);
    serializer.out
}

/// Normalize a single element including its own tag.
pub fn normalize_element(element: ElementRef<'_>, base: &LinkBase) -> String {
    let mut serializer = Serializer::new(base, 0);
    serializer.element(element);
    serializer.out
}

fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn starts_with_newline(element: ElementRef<'_>) -> bool {
    element
        .first_child()
        .and_then(|child| child.value().as_text())
        .is_some_and(|text| text.starts_with('\n'))
}

/// Writes parsed nodes back out as HTML, rewriting attributes on the way.
///
/// Text inside raw-text elements is written as parsed; everywhere else it is
/// escaped. `<plaintext>` swallows the rest of the input when parsed, so
/// nothing (not even end tags) is written after its content.
struct Serializer<'b> {
    out: String,
    base: &'b LinkBase,
    terminated: bool,
}

impl<'b> Serializer<'b> {
    fn new(base: &'b LinkBase, capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            base,
            terminated: false,
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        if self.terminated {
            return;
        }
        let value = element.value();
        let name = value.name();

        // Qualified names keep `xlink:`/`xml:` prefixes on foreign attributes.
        // Sorted so output does not depend on attribute storage order.
        let mut attrs: Vec<(String, &str, &str)> = value
            .attrs
            .iter()
            .map(|(qual, raw)| {
                let qualified = qual.prefix.as_ref().map_or_else(
                    || qual.local.to_string(),
                    |prefix| format!("{prefix}:{}", qual.local),
                );
                (qualified, &*qual.local, &**raw)
            })
            .collect();
        attrs.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        self.out.push('<');
        self.out.push_str(name);
        for (qualified, local, raw) in attrs {
            let rewritten = if LINK_ATTRIBUTES.contains(&local) {
                self.base.absolutize(local, raw)
            } else if qualified == "id" {
                strip_user_content_prefix(raw)
            } else {
                raw.to_string()
            };
            let _ = write!(
                self.out,
                " {qualified}=\"{}\"",
                html_escape::encode_double_quoted_attribute(&rewritten)
            );
        }
        self.out.push('>');

        if VOID_ELEMENTS.contains(&name) {
            return;
        }

        // The parser drops one newline right after these start tags.
        if matches!(name, "pre" | "textarea" | "listing") && starts_with_newline(element) {
            self.out.push('\n');
        }

        self.children(element, RAW_TEXT_ELEMENTS.contains(&name));
        if name == "plaintext" {
            self.terminated = true;
        }
        if self.terminated {
            return;
        }

        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn children(&mut self, element: ElementRef<'_>, raw_text: bool) {
        for child in element.children() {
            if self.terminated {
                return;
            }
            match child.value() {
                Node::Text(text) => {
                    if raw_text {
                        self.out.push_str(text);
                    } else {
                        self.out.push_str(&html_escape::encode_text(&**text));
                    }
                },
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                },
                Node::Comment(comment) => {
                    self.out.push_str("<!--");
                    self.out.push_str(comment);
                    self.out.push_str("-->");
                },
                _ => {},
            }
        }
    }
}
