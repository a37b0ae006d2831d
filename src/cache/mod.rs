// src/cache/mod.rs
// =============================================================================
// This module holds the link-list cache shared by every crawl.
//
// A crawl stores, for each page it fetched successfully, the ordered list of
// in-domain links found on that page. The next crawl that reaches the same
// page (from any request) can reuse that list instead of fetching the page
// again, until the entry expires.
//
// Submodules:
// - memory: in-process store, used when no Redis URL is configured and in tests
// - redis_store: Redis-backed store, shared between processes
//
// Rust concepts:
// - Traits: one interface, several storage backends
// - Trait objects: the crawler holds an Arc<dyn LinkCache>
// =============================================================================

mod memory;
mod redis_store;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::redis_store::RedisCache;

/// Default lifetime of a cached link list (just under an hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3500);

/// Errors reported by a cache backend.
///
/// The crawler never propagates these: a failed read is treated as a miss and
/// a failed write is logged and skipped.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache ttl must be at least one second")]
    InvalidTtl,
}

/// A keyed store of string lists with expiring entries.
#[async_trait]
pub trait LinkCache: Send + Sync {
    /// Returns the list stored under `key`, or an empty list when the key is
    /// absent or expired.
    async fn get_list(&self, key: &str) -> Result<Vec<String>, CacheError>;

    /// Stores `values` under `key`, replacing any previous list, and sets the
    /// entry to expire after `ttl`.
    async fn push_list(&self, key: &str, values: &[String], ttl: Duration)
        -> Result<(), CacheError>;
}

// Builds the cache key for a page's link list
//
// Example:
//   "https://foo.com/about" -> "sitemap:https://foo.com/about"
pub fn sitemap_key(url: &str) -> String {
    format!("sitemap:{}", url)
}

// Redis only understands whole seconds, so every backend rejects TTLs that
// would round down to zero
fn ttl_seconds(ttl: Duration) -> Result<u64, CacheError> {
    match ttl.as_secs() {
        0 => Err(CacheError::InvalidTtl),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemap_key() {
        assert_eq!(sitemap_key("https://foo.com/a"), "sitemap:https://foo.com/a");
    }

    #[test]
    fn test_ttl_seconds_rejects_sub_second() {
        assert!(matches!(
            ttl_seconds(Duration::from_millis(500)),
            Err(CacheError::InvalidTtl)
        ));
        assert_eq!(ttl_seconds(Duration::from_secs(60)).unwrap(), 60);
    }
}
