//! Search orchestration
//!
//! [`VideoSearchManager`] glues a [`SearchCache`] to an underlying
//! [`VideoSearch`] source. A hit returns the cached list untouched; a miss
//! runs the source once and stores its outcome with the caller's TTL.
//!
//! Concurrent misses on the same key are not coalesced: each caller runs
//! the source and the last `set` wins. Both write the same data from the
//! same upstream, so the race only costs quota.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::cache::{build_cache, SearchCache};
use super::channel::ChannelRef;
use super::config::{AppConfig, SearchMode};
use super::coordinator::{sort_newest_first, FanOutCoordinator};
use super::fetcher::{parse_timestamp, ChannelFetcher, FetcherConfig};
use super::models::{
    AppError, AppResult, ChannelFailure, SearchKey, SearchReport, VideoRecord,
};
use super::youtube_api::VideoApi;

/// Underlying search run on a cache miss
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, term: &str, channels: &[ChannelRef], limit: usize) -> SearchReport;
}

/// Walks every channel's uploads through the fan-out coordinator
#[derive(Clone)]
pub struct FanOutSearch {
    coordinator: FanOutCoordinator,
    recency_window: Option<Duration>,
}

impl FanOutSearch {
    pub fn new(coordinator: FanOutCoordinator, recency_window: Option<Duration>) -> Self {
        Self {
            coordinator,
            recency_window,
        }
    }
}

#[async_trait]
impl VideoSearch for FanOutSearch {
    async fn search(&self, term: &str, channels: &[ChannelRef], limit: usize) -> SearchReport {
        let mut report = self
            .coordinator
            .search_with_report(term, channels, self.recency_window)
            .await;
        if limit > 0 {
            report.videos.truncate(limit);
        }
        report
    }
}

/// One keyword search call restricted to the channel set.
///
/// The search endpoint only takes channel ids, so handles and usernames are
/// first resolved through their uploads listing. Results carry no statistics.
#[derive(Clone)]
pub struct KeywordSearch {
    api: Arc<dyn VideoApi>,
}

/// Largest `maxResults` the search endpoint honours
const KEYWORD_SEARCH_DEFAULT_LIMIT: usize = 50;

impl KeywordSearch {
    pub fn new(api: Arc<dyn VideoApi>) -> Self {
        Self { api }
    }

    /// Channel id for `channel`, derived from the uploads listing id
    /// (`UU…` lists the uploads of `UC…`) when only a name is known
    async fn channel_id(&self, channel: &ChannelRef) -> AppResult<String> {
        if let ChannelRef::Id(id) = channel {
            return Ok(id.clone());
        }

        let playlist_id = self
            .api
            .resolve_uploads_playlist(channel)
            .await?
            .ok_or_else(|| AppError::ChannelNotFound(channel.to_string()))?;

        match playlist_id.strip_prefix("UU") {
            Some(suffix) => Ok(format!("UC{}", suffix)),
            None => Err(AppError::Parse(format!(
                "unexpected uploads listing id {}",
                playlist_id
            ))),
        }
    }
}

#[async_trait]
impl VideoSearch for KeywordSearch {
    async fn search(&self, term: &str, channels: &[ChannelRef], limit: usize) -> SearchReport {
        let mut report = SearchReport::default();
        if channels.is_empty() {
            return report;
        }

        let mut channel_ids = Vec::with_capacity(channels.len());
        for channel in channels {
            match self.channel_id(channel).await {
                Ok(id) => channel_ids.push(id),
                Err(e) => {
                    warn!("⚠️ Leaving {} out of the keyword search: {}", channel, e);
                    report.failures.push(ChannelFailure {
                        channel: channel.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        if channel_ids.is_empty() {
            return report;
        }

        let max_results = if limit == 0 {
            KEYWORD_SEARCH_DEFAULT_LIMIT
        } else {
            limit
        };

        let hits = match self.api.search_videos(term, &channel_ids, max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("❌ Keyword search for '{}' failed: {}", term, e);
                report.failures.push(ChannelFailure {
                    channel: channel_ids.join(","),
                    reason: e.to_string(),
                });
                return report;
            }
        };

        for hit in hits {
            if hit.id.kind != "youtube#video" {
                continue;
            }
            let Some(video_id) = hit.id.video_id else {
                continue;
            };
            let published_at = match hit.snippet.published_at.as_deref().map(parse_timestamp) {
                Some(Ok(timestamp)) => timestamp,
                _ => {
                    warn!("Skipping search hit {}: bad or missing timestamp", video_id);
                    continue;
                }
            };

            report.videos.push(VideoRecord {
                url: VideoRecord::watch_url(&video_id),
                video_id,
                title: hit.snippet.title.unwrap_or_default(),
                description: hit.snippet.description.unwrap_or_default(),
                channel_id: hit.snippet.channel_id.unwrap_or_default(),
                channel_title: hit.snippet.channel_title.unwrap_or_default(),
                published_at,
                view_count: 0,
                like_count: 0,
                comment_count: 0,
            });
        }

        sort_newest_first(&mut report.videos);
        if limit > 0 {
            report.videos.truncate(limit);
        }
        report
    }
}

/// Cache-aware search entry point
#[derive(Clone)]
pub struct VideoSearchManager {
    cache: Arc<dyn SearchCache>,
    source: Arc<dyn VideoSearch>,
}

impl VideoSearchManager {
    pub fn new(cache: Arc<dyn SearchCache>, source: Arc<dyn VideoSearch>) -> Self {
        Self { cache, source }
    }

    /// Build the manager described by the configuration
    pub fn from_config(config: &AppConfig, api: Arc<dyn VideoApi>) -> Self {
        let source: Arc<dyn VideoSearch> = match config.search.mode {
            SearchMode::FanOut => {
                let fetcher = ChannelFetcher::new(
                    api,
                    FetcherConfig {
                        page_size: config.search.page_size,
                        max_pages: config.search.max_pages,
                        page_delay: config.search.page_delay(),
                    },
                );
                let coordinator =
                    FanOutCoordinator::new(fetcher, config.search.max_concurrent_channels);
                Arc::new(FanOutSearch::new(
                    coordinator,
                    config.search.recency_window(),
                ))
            }
            SearchMode::Keyword => Arc::new(KeywordSearch::new(api)),
        };

        Self::new(build_cache(&config.cache), source)
    }

    /// Cached search returning only the videos
    pub async fn search(
        &self,
        term: &str,
        channels: &[ChannelRef],
        limit: usize,
        ttl: Duration,
    ) -> Vec<VideoRecord> {
        self.search_with_report(term, channels, limit, ttl)
            .await
            .videos
    }

    /// Cached search; a cache hit never carries failures.
    ///
    /// Empty outcomes with failed channels are returned but not stored, so
    /// the next call retries instead of reporting a silent empty hit.
    pub async fn search_with_report(
        &self,
        term: &str,
        channels: &[ChannelRef],
        limit: usize,
        ttl: Duration,
    ) -> SearchReport {
        let channel_keys: Vec<String> = channels.iter().map(ToString::to_string).collect();
        let key = SearchKey::new(term, &channel_keys, limit);

        match self.cache.get(&key).await {
            Ok(Some(videos)) => {
                info!("💾 Returning {} cached video(s) for {}", videos.len(), key);
                return SearchReport {
                    videos,
                    failures: Vec::new(),
                };
            }
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}, searching anyway: {}", key, e),
        }

        let report = self.source.search(term, channels, limit).await;

        // An empty list caused by failures would hide them until expiry
        if report.videos.is_empty() && report.is_partial() {
            warn!(
                "Not caching empty result for {}: {} channel(s) failed",
                key,
                report.failures.len()
            );
            return report;
        }

        if let Err(e) = self.store(key, &report.videos, ttl).await {
            warn!("Failed to cache search results: {}", e);
        }

        report
    }

    async fn store(&self, key: SearchKey, videos: &[VideoRecord], ttl: Duration) -> AppResult<()> {
        self.cache.set(key, videos.to_vec(), ttl).await
    }
}
