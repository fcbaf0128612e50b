//! In-memory cache implementation using moka
//!
//! Values are stored as JSON strings so any serializable type can be
//! cached. Every entry carries its own TTL, enforced through moka's
//! expiry policy.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
    ttl: Duration,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
            ttl,
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// Expiry policy reading the TTL stored on each entry
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
    generation: AtomicU64,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a cache holding up to 10,000 entries with a 10 minute default TTL
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a cache with custom capacity and default TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self {
            cache,
            default_ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// TTL applied by callers that have no better value
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Approximate number of live entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidation counter, bumped by every [`CacheLayer::delete`].
    ///
    /// Read it before loading a value from the source of truth and pass it
    /// to [`MemoryCache::set_unless_invalidated`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store `value` unless a delete happened since `generation` was read.
    ///
    /// Returns whether the value was kept. A delete racing with the insert
    /// either removes the entry itself or is seen by the re-check here.
    pub async fn set_unless_invalidated<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        generation: u64,
    ) -> Result<bool> {
        if self.generation() != generation {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        if self.generation() != generation {
            self.cache.invalidate(key).await;
            return Ok(false);
        }
        Ok(true)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(value, ttl)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();
        cache
            .set("course:content:1", &vec![1, 2, 3], Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<Vec<i32>> = cache.get("course:content:1").await.unwrap();
        assert_eq!(result, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = MemoryCache::new();
        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let cache = MemoryCache::new();
        cache.set("k", &"a".to_string(), Duration::from_secs(60)).await.unwrap();
        cache.set("k", &"b".to_string(), Duration::from_secs(60)).await.unwrap();

        let result: Option<String> = cache.get("k").await.unwrap();
        assert_eq!(result.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let cache = MemoryCache::with_capacity_and_ttl(100, Duration::from_secs(3600));
        cache
            .set("short", &"gone".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .set("long", &"kept".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.cache.run_pending_tasks().await;

        let short: Option<String> = cache.get("short").await.unwrap();
        let long: Option<String> = cache.get("long").await.unwrap();
        assert!(short.is_none());
        assert_eq!(long.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_delete_bumps_generation() {
        let cache = MemoryCache::new();
        let before = cache.generation();
        cache.delete("course:content:1").await.unwrap();
        assert_eq!(cache.generation(), before + 1);
    }

    #[tokio::test]
    async fn test_stale_value_not_written_back() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        // A reader loads the old value, then a writer invalidates the key
        let generation = cache.generation();
        cache.delete("course:content:1").await.unwrap();

        let kept = cache
            .set_unless_invalidated("course:content:1", &"stale".to_string(), ttl, generation)
            .await
            .unwrap();
        assert!(!kept);
        assert!(cache.get::<String>("course:content:1").await.unwrap().is_none());

        let generation = cache.generation();
        let kept = cache
            .set_unless_invalidated("course:content:1", &"fresh".to_string(), ttl, generation)
            .await
            .unwrap();
        assert!(kept);
        assert_eq!(
            cache.get::<String>("course:content:1").await.unwrap().as_deref(),
            Some("fresh")
        );
    }
}
