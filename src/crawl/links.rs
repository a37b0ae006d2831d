// src/crawl/links.rs
// =============================================================================
// This module extracts and normalizes links from raw HTML.
//
// How it works:
// 1. Scan the markup for every href="..." / href='...' value with a regex
//    (no DOM parse, so malformed markup may under- or over-match)
// 2. Cut the query string and fragment off each value
// 3. Resolve it against the page URL (relative, root-relative,
//    protocol-relative and absolute links all end up absolute)
// 4. Drop links to static resources (images, stylesheets, fonts, ...)
//
// Order is preserved and duplicates are kept; the crawler's visited set takes
// care of them.
//
// Rust concepts:
// - Lazy statics: the regex is compiled once, on first use
// - Iterators: filter_map chains instead of loops with early `continue`
// - Option: a link that can't be resolved is simply None
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

// Lazy pattern: `.*?` stops at the first closing quote of either kind
static HREF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href=["'](.*?)["']"#).expect("href pattern is valid"));

/// Path extensions that point at non-page resources by default.
pub const DEFAULT_SKIPPED_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".woff", ".woff2",
    ".ttf", ".xml", ".asp",
];

/// Filters out links whose path ends with one of a set of extensions.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    // Stored lowercase with a leading dot
    extensions: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                // Accept "png" as well as ".png", in any case
                let ext = ext.as_ref().trim().to_ascii_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            // A bare "." would match every path ending in a dot
            .filter(|ext| ext.len() > 1)
            .collect();
        Self { extensions }
    }

    pub fn is_skipped(&self, url: &Url) -> bool {
        // Path only: a query like ?format=.png doesn't make a page an image
        let path = url.path().to_ascii_lowercase();
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SKIPPED_EXTENSIONS)
    }
}

// Extracts all page links from HTML content
//
// Parameters:
//   html: the raw page markup
//   base: the URL of the page (for resolving relative links)
//   filter: extensions to drop
//
// Returns: absolute, normalized URLs in the order they appear in the markup
//
// Example:
//   html = "<a href='page?x=1#top'>"  base = "https://foo.com/dir/"
//   result = ["https://foo.com/dir/page"]
pub fn extract_links(html: &str, base: &Url, filter: &ExtensionFilter) -> Vec<Url> {
    HREF_PATTERN
        .captures_iter(html)
        // Group 1 is the value between the quotes
        .filter_map(|caps| caps.get(1))
        // Unresolvable values are dropped silently
        .filter_map(|href| resolve_link(base, href.as_str()))
        .filter(|url| !filter.is_skipped(url))
        .collect()
}

// Resolves one href value against the page URL, with query and fragment
// removed. Returns None when the value can't be resolved.
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    // Strip first: "#top" becomes "", which joins to the page itself
    let cleaned = strip_query_and_fragment(href.trim());
    // join handles "/x", "x", "//host/x" and absolute URLs alike
    let mut url = base.join(cleaned).ok()?;
    // An empty reference resolves to the base, query included
    normalize(&mut url);
    Some(url)
}

fn strip_query_and_fragment(href: &str) -> &str {
    match href.find(|c: char| c == '?' || c == '#') {
        Some(idx) => &href[..idx],
        None => href,
    }
}

/// Drops the query string and fragment so two addresses of the same page
/// compare equal.
pub fn normalize(url: &mut Url) {
    url.set_query(None);
    url.set_fragment(None);
}

/// Parses and normalizes a URL given by a caller (the crawl seed).
pub fn parse_normalized(input: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(input.trim())?;
    normalize(&mut url);
    Ok(url)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a regex and not an HTML parser?
//    - Only href values are needed, wherever they appear
//    - A regex scan tolerates broken markup a parser might reject
//    - Trade-off: an href inside a comment or script is picked up too
//
// 2. What is once_cell::sync::Lazy?
//    - A static that is initialised the first time it's used
//    - Compiling a Regex is slow, so it happens once per process
//
// 3. What does Url::join do?
//    - Resolves a reference the way a browser does
//    - "https://foo.com/dir/" + "page" = "https://foo.com/dir/page"
//    - "https://foo.com/dir/" + "/page" = "https://foo.com/page"
// -----------------------------------------------------------------------------
