//! Fingerprint-keyed store of pipeline results.

use crate::cache::config::CacheConfig;
use crate::core::{Fingerprint, PipelineResult};

use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest TTL an entry is stored with; longer requests are capped.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CachedResult {
    value: Arc<PipelineResult>,
    ttl: Duration,
    expires_at: Instant,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<Fingerprint, CachedResult> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &Fingerprint,
        value: &CachedResult,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &Fingerprint,
        value: &CachedResult,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Point-in-time view of the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Whether the cache stores results.
    pub enabled: bool,
    /// Configured capacity in entries.
    pub max_entries: u64,
    /// TTL applied when none is given.
    #[serde(with = "crate::core::result::duration_serde")]
    pub default_ttl: Duration,
    /// Entries currently held, expired ones excluded once swept.
    pub entry_count: u64,
}

/// Bounded, TTL-aware cache of pipeline results keyed by content fingerprint.
///
/// Safe to share between concurrent invocations. An entry is visible only
/// while `now < expires_at`; expired entries are also evicted lazily by the
/// backing store.
///
/// # Example
///
/// ```rust,ignore
/// use evidencefuse::cache::{CacheConfig, ContentCache};
///
/// let cache = ContentCache::new(CacheConfig::default().with_max_entries(256));
/// if let Some(hit) = cache.get(&fingerprint).await {
///     return Ok(hit);
/// }
/// ```
#[derive(Clone)]
pub struct ContentCache {
    inner: Cache<Fingerprint, CachedResult>,
    config: CacheConfig,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("config", &self.config)
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ContentCache {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner, config }
    }

    /// The cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The TTL used by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    /// Looks up a result. Returns an owned copy.
    pub async fn get(&self, key: &Fingerprint) -> Option<PipelineResult> {
        if !self.config.enabled {
            return None;
        }

        let entry = self.inner.get(key).await?;
        if Instant::now() >= entry.expires_at {
            self.inner.invalidate(key).await;
            return None;
        }
        Some(entry.value.as_ref().clone())
    }

    /// Stores a result for `ttl`. A zero TTL stores nothing; TTLs above
    /// [`MAX_TTL`] are capped.
    pub async fn set(&self, key: Fingerprint, value: PipelineResult, ttl: Duration) {
        if !self.config.enabled || ttl.is_zero() {
            return;
        }

        let ttl = ttl.min(MAX_TTL);
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            tracing::warn!(ttl_secs = ttl.as_secs(), "Cache TTL out of range, not storing");
            return;
        };
        let entry = CachedResult {
            value: Arc::new(value),
            ttl,
            expires_at,
        };
        self.inner.insert(key, entry).await;
    }

    /// Stores a result with the default TTL.
    pub async fn insert(&self, key: Fingerprint, value: PipelineResult) {
        self.set(key, value, self.config.default_ttl).await;
    }

    /// Removes one entry.
    pub async fn invalidate(&self, key: &Fingerprint) {
        self.inner.invalidate(key).await;
    }

    /// Drops every entry.
    pub async fn invalidate_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        tracing::info!("Content cache cleared");
    }

    /// Number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    /// Snapshot of configuration and occupancy.
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.config.enabled,
            max_entries: self.config.max_entries,
            default_ttl: self.config.default_ttl,
            entry_count: self.entry_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn result(id: &str) -> PipelineResult {
        PipelineResult {
            id: id.to_string(),
            fingerprint: Fingerprint::from_hex(id),
            results_by_stage: BTreeMap::new(),
            stages_run: Vec::new(),
            stages_attempted: 0,
            early_exit: false,
            cache_hit: false,
            confidence: 0.5,
            process_time: Duration::from_millis(5),
            completed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = ContentCache::default();
        let key = Fingerprint::from_hex("aa");
        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), result("aa")).await;
        let first = cache.get(&key).await.unwrap();
        let second = cache.get(&key).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.id, "aa");
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = ContentCache::default();
        let key = Fingerprint::from_hex("bb");
        cache
            .set(key.clone(), result("bb"), Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_and_disabled() {
        let cache = ContentCache::default();
        let key = Fingerprint::from_hex("cc");
        cache.set(key.clone(), result("cc"), Duration::ZERO).await;
        assert!(cache.get(&key).await.is_none());

        let disabled = ContentCache::new(CacheConfig::disabled());
        disabled.insert(key.clone(), result("cc")).await;
        assert!(disabled.get(&key).await.is_none());
        assert!(!disabled.stats().await.enabled);
    }

    #[tokio::test]
    async fn test_huge_ttl_is_capped() {
        let cache = ContentCache::default();
        let key = Fingerprint::from_hex("dd");
        cache.set(key.clone(), result("dd"), Duration::MAX).await;
        assert_eq!(cache.get(&key).await.unwrap().id, "dd");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_set_and_get() {
        let cache = ContentCache::default();
        let mut handles = Vec::new();
        for i in 0..16u8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("{i:02x}");
                let key = Fingerprint::from_hex(&id);
                for _ in 0..50 {
                    cache.insert(key.clone(), result(&id)).await;
                    let seen = cache.get(&key).await.unwrap();
                    assert_eq!(seen.id, id);
                    assert_eq!(seen.fingerprint, key);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.entry_count().await, 16);
    }

    #[tokio::test]
    async fn test_bounded_and_clearable() {
        let cache = ContentCache::new(CacheConfig::default().with_max_entries(4));
        for i in 0..32 {
            let id = format!("{i:02x}");
            cache.insert(Fingerprint::from_hex(&id), result(&id)).await;
        }
        assert!(cache.entry_count().await <= 4);

        cache.invalidate_all().await;
        assert_eq!(cache.entry_count().await, 0);
        let stats = cache.stats().await;
        assert_eq!(stats.max_entries, 4);
        assert_eq!(stats.default_ttl, Duration::from_secs(1800));
    }
}
