// src/config.rs
// =============================================================================
// Crawl settings shared by the `serve` and `local` subcommands.
//
// Every setting is a command-line flag with an environment-variable fallback
// (clap's `env` feature), so the service can be configured either way. A
// `.env` file is loaded in main before parsing.
//
// The settings know how to build a ready-to-use Crawler: they pick the cache
// backend (Redis when REDIS_URL is set, in-memory otherwise) and create the
// HTTP fetcher with the configured timeout.
//
// Rust concepts:
// - #[derive(Args)] + #[command(flatten)]: one settings struct, reused by two
//   subcommands
// - Arc<dyn LinkCache>: the backend is picked at runtime
// =============================================================================

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::cache::{LinkCache, MemoryCache, RedisCache, DEFAULT_CACHE_TTL};
use crate::crawl::{
    CrawlOptions, Crawler, ExtensionFilter, HttpFetcher, ScopePolicy, DEFAULT_FETCH_TIMEOUT,
};

#[derive(Args, Debug, Clone)]
pub struct CrawlSettings {
    /// Redis server holding the shared link cache (in-memory cache if unset)
    ///
    /// Example: redis://localhost:6379
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Seconds a cached link list stays valid
    #[arg(
        long,
        env = "CRAWLER_CACHE_TTL",
        default_value_t = DEFAULT_CACHE_TTL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_ttl: u64,

    /// Seconds to wait for a single page before giving up on it
    #[arg(
        long,
        env = "CRAWLER_FETCH_TIMEOUT",
        default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout: u64,

    /// Stop after visiting this many pages (no limit by default)
    #[arg(long, env = "CRAWLER_MAX_PAGES")]
    pub max_pages: Option<usize>,

    /// Stop visiting new pages after this many seconds (no limit by default)
    #[arg(long, env = "CRAWLER_DEADLINE")]
    pub deadline: Option<u64>,

    /// Which hosts count as part of the seed's domain
    #[arg(long, env = "CRAWLER_SCOPE", value_enum, default_value_t = ScopePolicy::Contains)]
    pub scope: ScopePolicy,

    /// Path extensions to skip, replacing the built-in list
    ///
    /// Example: --skip-ext png,css --skip-ext pdf
    #[arg(long = "skip-ext", env = "CRAWLER_SKIP_EXT", value_delimiter = ',')]
    pub skip_ext: Vec<String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            cache_ttl: DEFAULT_CACHE_TTL.as_secs(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT.as_secs(),
            max_pages: None,
            deadline: None,
            scope: ScopePolicy::default(),
            skip_ext: Vec::new(),
        }
    }
}

impl CrawlSettings {
    pub fn crawl_options(&self) -> CrawlOptions {
        let extensions = if self.skip_ext.is_empty() {
            ExtensionFilter::default()
        } else {
            ExtensionFilter::new(&self.skip_ext)
        };

        CrawlOptions {
            cache_ttl: Duration::from_secs(self.cache_ttl),
            scope: self.scope,
            extensions,
            max_pages: self.max_pages,
            deadline: self.deadline.map(Duration::from_secs),
        }
    }

    /// Opens the configured cache backend.
    pub async fn open_cache(&self) -> Result<Arc<dyn LinkCache>> {
        match &self.redis_url {
            Some(redis_url) => {
                let cache = RedisCache::connect(redis_url)
                    .await
                    .context("Failed to connect to Redis")?;
                cache.ping().await.context("Redis did not answer PING")?;
                Ok(Arc::new(cache))
            }
            None => {
                info!("No Redis URL configured, using the in-memory link cache");
                Ok(Arc::new(MemoryCache::new()))
            }
        }
    }

    pub async fn build_crawler(&self) -> Result<Crawler> {
        let cache = self.open_cache().await?;
        let fetcher = HttpFetcher::new(Duration::from_secs(self.fetch_timeout))
            .context("Failed to create HTTP client")?;
        Ok(Crawler::new(Arc::new(fetcher), cache, self.crawl_options()))
    }
}
