// src/cache/memory.rs
// =============================================================================
// In-process link cache with per-entry expiry.
//
// Used when the service runs without Redis, and by the crawler tests. Entries
// live in a HashMap behind an async RwLock so concurrent crawls can share one
// instance through an Arc.
//
// Expired entries are dropped on every write, and on a read of that key.
// A key that is never read again therefore lives at most until the next
// push_list call after it expires.
//
// Rust concepts:
// - RwLock: many readers or one writer, awaited instead of blocking a thread
// - tokio::time::Instant: follows the paused test clock, so expiry is testable
// - HashMap::retain: removes entries in place while the write lock is held
// =============================================================================

use super::{ttl_seconds, CacheError, LinkCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    values: Vec<String>,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Includes entries that expired since the last write
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl LinkCache for MemoryCache {
    async fn get_list(&self, key: &str) -> Result<Vec<String>, CacheError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(Vec::new()),
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(entry.values.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: drop it now rather than wait for the next write
        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }
        Ok(Vec::new())
    }

    async fn push_list(
        &self,
        key: &str,
        values: &[String],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let secs = ttl_seconds(ttl)?;
        let now = Instant::now();
        let entry = Entry {
            values: values.to_vec(),
            expires_at: now + Duration::from_secs(secs),
        };

        let mut entries = self.entries.write().await;
        // Sweep everything that expired, read or not
        entries.retain(|_, existing| existing.expires_at > now);
        entries.insert(key.to_string(), entry);
        Ok(())
    }
}
