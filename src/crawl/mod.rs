// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Depth-first crawl from a seed URL, one page at a time
// - Domain scoping (links off the seed's domain are never followed)
// - Per-page error isolation: broken pages end up in an error map
// - Link lists cached across crawls, so already-explored pages aren't fetched
//   again until their cache entry expires
//
// Submodules:
// - engine: the traversal itself
// - links: href extraction and URL normalization
// - scope: the domain membership test
// - fetch: the HTTP boundary
//
// Rust concepts:
// - Type aliases: Sitemap and ErrorMap are IndexMaps with a name
// - IndexMap: a HashMap that remembers insertion order
// - Derive: Serialize/PartialEq come for free on the result types
// =============================================================================

mod engine;
pub mod fetch;
mod links;
mod scope;

use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;

pub use engine::Crawler;
pub use fetch::{HttpFetcher, DEFAULT_FETCH_TIMEOUT};
pub use links::{parse_normalized, ExtensionFilter};
pub use scope::ScopePolicy;

/// Page URL -> its in-domain links, in discovery order. Keys keep the order
/// in which pages were crawled.
pub type Sitemap = IndexMap<String, Vec<String>>;

/// Page URL -> why it couldn't be crawled.
pub type ErrorMap = IndexMap<String, String>;

/// Knobs for a crawl. The defaults crawl the whole reachable site.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Lifetime of link lists written to the cache
    pub cache_ttl: Duration,
    pub scope: ScopePolicy,
    pub extensions: ExtensionFilter,
    /// Stop after this many pages have been visited
    pub max_pages: Option<usize>,
    /// Stop visiting new pages once the crawl has run this long
    pub deadline: Option<Duration>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            scope: ScopePolicy::default(),
            extensions: ExtensionFilter::default(),
            max_pages: None,
            deadline: None,
        }
    }
}

/// Everything a crawl produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlOutcome {
    pub sitemap: Sitemap,
    pub errors: ErrorMap,
    /// True when a page or time budget cut the crawl short
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// How much of a crawl can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// No page failed
    Success,
    /// Some pages failed, but the sitemap has entries
    PartialSuccess,
    /// Nothing was crawled (the seed itself failed)
    Failure,
}

impl CrawlOutcome {
    pub fn status(&self) -> CrawlStatus {
        match (self.errors.is_empty(), self.sitemap.is_empty()) {
            (true, _) => CrawlStatus::Success,
            (false, false) => CrawlStatus::PartialSuccess,
            (false, true) => CrawlStatus::Failure,
        }
    }
}
