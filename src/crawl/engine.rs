// src/crawl/engine.rs
// =============================================================================
// This module implements the crawl itself: a depth-first walk over the pages
// of one site.
//
// How it works:
// 1. Normalize the seed URL and push it on a work stack
// 2. Pop a page. Skip it if it was already visited or is off-domain
// 3. Mark it visited, then ask the cache for its link list
//    - Cache hit: record the cached links and push them, no fetch
//    - Cache miss: fetch the page. On a 2xx, extract its in-domain links,
//      record them, push a "persist" marker and then the links
// 4. When a "persist" marker is popped, every link pushed above it has been
//    fully explored, so the page's link list is written to the cache
// 5. Repeat until the stack is empty
//
// Links are pushed in reverse so the first link on a page is explored first;
// the visit order is the same as a recursive depth-first crawl.
//
// Failures never escape: a bad status or a transport error becomes an entry
// in the error map and the crawl moves on to the next page.
//
// Rust concepts:
// - Vec as a stack: push/pop from the end gives depth-first order
// - Enums with data: a Task is either "visit this URL" or "persist this page"
// - Lifetimes: Traversal<'a> borrows the Crawler for the length of one crawl
// - Arc<dyn Trait>: fetcher and cache are shared, swappable trait objects
// =============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

use super::fetch::Fetcher;
use super::links::{extract_links, parse_normalized};
use super::scope::DomainScope;
use super::{CrawlOptions, CrawlOutcome, ErrorMap, Sitemap};
use crate::cache::{sitemap_key, LinkCache};

/// Crawls sites using an injected fetcher and link cache.
///
/// Cloning is cheap; the fetcher and cache are shared. Each call to
/// [`Crawler::crawl`] has its own visited set, sitemap and error map.
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn LinkCache>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<dyn LinkCache>, options: CrawlOptions) -> Self {
        Self {
            fetcher,
            cache,
            options,
        }
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.options
    }

    /// Crawls every in-domain page reachable from `seed`.
    ///
    /// Never fails: a seed that can't be parsed or fetched yields an empty
    /// sitemap and a single error entry.
    pub async fn crawl(&self, seed: &str) -> CrawlOutcome {
        let seed_url = match parse_normalized(seed) {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to crawl {}: {}", seed, e);
                let mut outcome = CrawlOutcome::default();
                outcome
                    .errors
                    .insert(seed.to_string(), format!("Failed with exception {}", e));
                return outcome;
            }
        };

        // All per-crawl state lives in the traversal; `self` stays shared
        let mut traversal = Traversal::new(self, &seed_url);
        info!(
            "Crawling {} (domain: {})",
            seed_url,
            traversal.scope.domain()
        );
        traversal.stack.push(Task::Visit(seed_url));
        traversal.run().await;

        let outcome = traversal.finish();
        info!(
            "Crawl finished: {} page(s), {} error(s){}",
            outcome.sitemap.len(),
            outcome.errors.len(),
            if outcome.truncated { ", truncated" } else { "" }
        );
        outcome
    }
}

// One unit of work on the traversal stack
#[derive(Debug)]
enum Task {
    // Process a page (subject to the visited and scope checks)
    Visit(Url),
    // All children of this page are done: cache its link list
    Persist(String),
}

// State owned by a single crawl. Only the loop in `run` touches it.
struct Traversal<'a> {
    crawler: &'a Crawler,
    scope: DomainScope,
    visited: HashSet<String>,
    sitemap: Sitemap,
    errors: ErrorMap,
    stack: Vec<Task>,
    started: Instant,
    truncated: bool,
}

impl<'a> Traversal<'a> {
    fn new(crawler: &'a Crawler, seed: &Url) -> Self {
        Self {
            crawler,
            scope: DomainScope::for_seed(seed, crawler.options.scope),
            visited: HashSet::new(),
            sitemap: Sitemap::new(),
            errors: ErrorMap::new(),
            stack: Vec::new(),
            started: Instant::now(),
            truncated: false,
        }
    }

    async fn run(&mut self) {
        // Pop from the end: the most recently discovered link goes first
        while let Some(task) = self.stack.pop() {
            match task {
                Task::Visit(url) => self.visit(url).await,
                Task::Persist(page) => self.persist(&page).await,
            }
        }
    }

    async fn visit(&mut self, url: Url) {
        let key = url.to_string();

        // A page can be pushed several times before it is first popped
        if self.visited.contains(&key) || !self.scope.contains(&url) {
            return;
        }

        // Checked before marking visited, so a skipped page isn't counted
        if self.budget_exhausted() {
            if !self.truncated {
                warn!("Crawl budget exhausted, skipping remaining pages (first: {})", key);
            }
            self.truncated = true;
            return;
        }

        debug!("Crawling {}", key);
        self.visited.insert(key.clone());

        // An empty list counts as a miss: only pages with links are cached
        let cached = self.cached_links(&key).await;
        if !cached.is_empty() {
            debug!("Using cache for url: {}", key);
            // The entry may have been written by a crawl with a looser scope
            let children: Vec<Url> = cached
                .iter()
                .filter_map(|link| Url::parse(link).ok())
                .filter(|link| self.scope.contains(link))
                .collect();
            self.sitemap
                .insert(key, children.iter().map(Url::to_string).collect());
            // Already cached, so no Persist marker
            self.push_children(children);
            return;
        }

        match self.crawler.fetcher.fetch(&url).await {
            Ok(page) if page.is_success() => {
                let links: Vec<Url> =
                    extract_links(&page.body, &url, &self.crawler.options.extensions)
                        .into_iter()
                        .filter(|link| self.scope.contains(link))
                        .collect();
                debug!("{} in-domain link(s) on {}", links.len(), key);

                self.sitemap
                    .insert(key.clone(), links.iter().map(Url::to_string).collect());

                // The marker goes under the children, so it pops after all of them
                self.stack.push(Task::Persist(key));
                self.push_children(links);
            }
            // Fetched, but not a 2xx
            Ok(page) => {
                error!("Failed to crawl {}: status {}", key, page.status);
                self.errors
                    .insert(key, format!("Failed with status code {}", page.status));
            }
            // Never got a response at all
            Err(e) => {
                error!("Failed to crawl {}: {}", key, e);
                self.errors
                    .insert(key, format!("Failed with exception {}", e));
            }
        }
    }

    // Reversed so the first link on the page is popped first
    fn push_children(&mut self, children: Vec<Url>) {
        self.stack
            .extend(children.into_iter().rev().map(Task::Visit));
    }

    // A cache outage degrades to a live fetch
    async fn cached_links(&self, page: &str) -> Vec<String> {
        match self.crawler.cache.get_list(&sitemap_key(page)).await {
            Ok(links) => links,
            Err(e) => {
                warn!("Cache read failed for {}, fetching instead: {}", page, e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, page: &str) {
        // Only pages that were fetched get a marker, so this is always Some
        let Some(links) = self.sitemap.get(page) else {
            return;
        };
        if links.is_empty() {
            return;
        }

        let ttl = self.crawler.options.cache_ttl;
        if let Err(e) = self
            .crawler
            .cache
            .push_list(&sitemap_key(page), links, ttl)
            .await
        {
            warn!("Failed to cache links for {}: {}", page, e);
        }
    }

    // Both budgets are optional; None means unlimited
    fn budget_exhausted(&self) -> bool {
        let options = &self.crawler.options;
        let over_pages = options
            .max_pages
            .is_some_and(|max| self.visited.len() >= max);
        let over_time = options
            .deadline
            .is_some_and(|deadline| self.started.elapsed() >= deadline);
        over_pages || over_time
    }

    fn finish(self) -> CrawlOutcome {
        CrawlOutcome {
            sitemap: self.sitemap,
            errors: self.errors,
            truncated: self.truncated,
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a stack instead of recursion?
//    - An async fn can't call itself without boxing its future
//    - A Vec<Task> does the same job: push work, pop the newest first
//    - Deep sites can't overflow the call stack
//
// 2. What is Task::Persist for?
//    - A page's links may only be cached once all of them were explored
//    - Pushing the marker before the children means it pops after them,
//      like the code after a recursive call
//
// 3. What does `let Some(x) = ... else { return; }` do?
//    - let-else: bind on match, otherwise run the else block (which must
//      leave the function)
//    - Keeps the happy path unindented
//
// 4. Why does Traversal borrow the Crawler (Traversal<'a>)?
//    - The crawler outlives any single crawl, so a reference is enough
//    - No cloning of the fetcher, cache or options per crawl
// -----------------------------------------------------------------------------
