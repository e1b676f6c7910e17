//! Keyed time-bound search cache
//!
//! [`SearchCache`] is the two-operation contract the orchestrator depends on.
//! Entries are readable strictly before their expiry instant and are only
//! replaced by a later `set` for the same key; nothing is evicted in the
//! background.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::config::{CacheBackend, CacheConfig};
use super::models::{AppResult, SearchKey, VideoRecord};

/// Cache strategy used by the orchestrator
#[async_trait]
pub trait SearchCache: Send + Sync {
    /// Stored value for `key` if present and not yet expired
    async fn get(&self, key: &SearchKey) -> AppResult<Option<Vec<VideoRecord>>>;

    /// Store `value` under `key` until `now + ttl`, replacing any prior entry
    async fn set(&self, key: SearchKey, value: Vec<VideoRecord>, ttl: Duration) -> AppResult<()>;
}

/// A cached result list and the instant it stops being served
#[derive(Debug, Clone)]
pub struct CacheEntry {
    videos: Arc<Vec<VideoRecord>>,
    expires_at: Instant,
}

impl CacheEntry {
    pub fn new(videos: Vec<VideoRecord>, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or_else(far_future);
        Self {
            videos: Arc::new(videos),
            expires_at,
        }
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

fn far_future() -> Instant {
    // About thirty years, enough for any ttl that overflows
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

/// In-process cache backed by a concurrent map
#[derive(Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<DashMap<SearchKey, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SearchCache for InMemoryCache {
    async fn get(&self, key: &SearchKey) -> AppResult<Option<Vec<VideoRecord>>> {
        let hit = self
            .entries
            .get(key)
            .filter(|entry| entry.is_live_at(Instant::now()))
            .map(|entry| entry.videos.as_ref().clone());

        match hit {
            Some(videos) => {
                debug!("Cache HIT for {}", key);
                Ok(Some(videos))
            }
            None => {
                debug!("Cache MISS for {}", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: SearchKey, value: Vec<VideoRecord>, ttl: Duration) -> AppResult<()> {
        debug!("Caching {} video(s) for {} ({:?})", value.len(), key, ttl);
        self.entries.insert(key, CacheEntry::new(value, ttl));
        Ok(())
    }
}

/// Cache that never stores anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl SearchCache for NullCache {
    async fn get(&self, _key: &SearchKey) -> AppResult<Option<Vec<VideoRecord>>> {
        Ok(None)
    }

    async fn set(&self, _key: SearchKey, _value: Vec<VideoRecord>, _ttl: Duration) -> AppResult<()> {
        Ok(())
    }
}

/// Build the configured cache backend
pub fn build_cache(config: &CacheConfig) -> Arc<dyn SearchCache> {
    match config.backend {
        CacheBackend::Memory => Arc::new(InMemoryCache::new()),
        CacheBackend::Disabled => Arc::new(NullCache),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(term: &str) -> SearchKey {
        SearchKey::new(term, &["UC1", "UC2"], 5)
    }

    fn videos() -> Vec<VideoRecord> {
        vec![VideoRecord {
            video_id: "v1".to_string(),
            title: "BMW".to_string(),
            description: String::new(),
            channel_id: "UC1".to_string(),
            channel_title: "One".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            view_count: 10,
            like_count: 1,
            comment_count: 0,
            url: VideoRecord::watch_url("v1"),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get_round_trip() {
        let cache = InMemoryCache::new();
        cache
            .set(key("bmw"), videos(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get(&key("bmw")).await.unwrap(), Some(videos()));
        assert_eq!(cache.get(&key("BMW ")).await.unwrap(), Some(videos()));
        assert_eq!(cache.get(&key("audi")).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_boundary_is_exclusive() {
        let cache = InMemoryCache::new();
        cache
            .set(key("bmw"), videos(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert!(cache.get(&key("bmw")).await.unwrap().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(&key("bmw")).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_resets_expiry() {
        let cache = InMemoryCache::new();
        cache
            .set(key("bmw"), videos(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        cache
            .set(key("bmw"), Vec::new(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get(&key("bmw")).await.unwrap(), Some(Vec::new()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_is_a_hit() {
        let cache = InMemoryCache::new();
        cache
            .set(key("bmw"), Vec::new(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get(&key("bmw")).await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_never_served() {
        let cache = InMemoryCache::new();
        cache
            .set(key("bmw"), videos(), Duration::ZERO)
            .await
            .unwrap();
        assert!(cache.get(&key("bmw")).await.unwrap().is_none());
    }

    #[test]
    fn test_null_cache_never_hits() {
        let cache = NullCache;
        tokio_test::block_on(async {
            cache
                .set(key("bmw"), videos(), Duration::from_secs(60))
                .await
                .unwrap();
            assert!(cache.get(&key("bmw")).await.unwrap().is_none());
        });
    }

    #[tokio::test]
    async fn test_build_cache_selects_backend() {
        let disabled = build_cache(&CacheConfig {
            backend: CacheBackend::Disabled,
            ttl_secs: 60,
        });
        disabled
            .set(key("bmw"), videos(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(disabled.get(&key("bmw")).await.unwrap().is_none());

        let memory = build_cache(&CacheConfig::default());
        memory
            .set(key("bmw"), videos(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(memory.get(&key("bmw")).await.unwrap().is_some());
    }
}
