// src/cache/redis_store.rs
// =============================================================================
// Redis-backed link cache.
//
// Each page's links are stored as a Redis list under "sitemap:<url>". Writes
// run as one MULTI/EXEC pipeline (DEL, RPUSH, EXPIRE) so two crawls writing
// the same key at once leave one complete list behind, never a mix of both.
//
// The connection is multiplexed: cloning it is cheap and every clone shares
// the same socket, so concurrent crawls don't need a pool.
//
// Pushing an empty list only deletes the key, the same as MemoryCache
// storing nothing readable for it.
//
// Rust concepts:
// - Clone on a handle: every clone talks over the same connection
// - Pipelines: several commands sent as one atomic round trip
// - Type annotations on replies: `let _: () = ...` tells redis what to decode
// =============================================================================

use super::{ttl_seconds, CacheError, LinkCache};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Opens a connection to the Redis server at `redis_url`
    /// (e.g. `redis://localhost:6379`).
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected to Redis at {}", redis_url);
        Ok(Self { conn })
    }

    /// Round-trips a PING, used by the server at startup.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl LinkCache for RedisCache {
    async fn get_list(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(values)
    }

    async fn push_list(
        &self,
        key: &str,
        values: &[String],
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let secs = ttl_seconds(ttl)?;
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        let mut conn = self.conn.clone();

        let mut pipe = redis::pipe();
        pipe.atomic().del(key).ignore();
        // RPUSH with no values is a Redis error; an empty list is just a DEL
        if !values.is_empty() {
            pipe.rpush(key, values).ignore().expire(key, secs).ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // These tests need a live server; without REDIS_URL they pass vacuously
    async fn cache() -> Option<RedisCache> {
        let url = std::env::var("REDIS_URL").ok()?;
        Some(RedisCache::connect(&url).await.unwrap())
    }

    fn key() -> String {
        format!("sitemap:https://test-{}.example/", Uuid::new_v4())
    }

    fn links(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_push_replaces_and_preserves_order() {
        let Some(cache) = cache().await else {
            return;
        };
        cache.ping().await.unwrap();
        let key = key();
        let ttl = Duration::from_secs(60);

        cache.push_list(&key, &links(&["b", "a", "c"]), ttl).await.unwrap();
        assert_eq!(cache.get_list(&key).await.unwrap(), links(&["b", "a", "c"]));

        cache.push_list(&key, &links(&["z"]), ttl).await.unwrap();
        assert_eq!(cache.get_list(&key).await.unwrap(), links(&["z"]));

        let mut conn = cache.conn.clone();
        let remaining: i64 = conn.ttl(&key).await.unwrap();
        assert!((1..=60).contains(&remaining));

        cache.push_list(&key, &[], ttl).await.unwrap();
        assert!(cache.get_list(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_and_zero_ttl() {
        let Some(cache) = cache().await else {
            return;
        };
        let key = key();

        assert!(cache.get_list(&key).await.unwrap().is_empty());
        let result = cache.push_list(&key, &links(&["a"]), Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::InvalidTtl)));
        assert!(cache.get_list(&key).await.unwrap().is_empty());
    }
}
