//! Per-channel video fetcher
//!
//! Resolves a channel's uploads listing, walks a bounded number of pages,
//! keeps the items matching the keyword (and the optional recency window),
//! then joins each survivor with its detail record. A failing channel never
//! fails the caller: [`ChannelFetcher::fetch`] degrades to an empty list and
//! [`ChannelFetcher::fetch_outcome`] reports the reason as a tagged value.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::channel::ChannelRef;
use super::models::{AppError, AppResult, ChannelOutcome, ChannelQuery, VideoRecord};
use super::youtube_api::{PlaylistItem, VideoApi, VideoDetails, MAX_PAGE_SIZE};

/// Fetcher tuning
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Items requested per listing page
    pub page_size: usize,
    /// Listing pages walked per channel
    pub max_pages: usize,
    /// Pause between successive listing pages
    pub page_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_pages: 2,
            page_delay: Duration::from_millis(500),
        }
    }
}

/// Fetches matching videos for one channel at a time
#[derive(Clone)]
pub struct ChannelFetcher {
    api: Arc<dyn VideoApi>,
    config: FetcherConfig,
}

impl ChannelFetcher {
    pub fn new(api: Arc<dyn VideoApi>, config: FetcherConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Build the query for one channel with this fetcher's page bound
    pub fn query(
        &self,
        channel: ChannelRef,
        keyword: &str,
        recency_window: Option<Duration>,
    ) -> ChannelQuery {
        ChannelQuery {
            channel,
            keyword: keyword.to_string(),
            recency_window,
            max_pages: self.config.max_pages,
        }
    }

    /// Matching videos for a channel; failures are logged and yield an empty list
    pub async fn fetch(
        &self,
        channel: &ChannelRef,
        keyword: &str,
        recency_window: Option<Duration>,
    ) -> Vec<VideoRecord> {
        let query = self.query(channel.clone(), keyword, recency_window);
        self.fetch_outcome(&query).await.into_videos()
    }

    /// Like [`fetch`](Self::fetch) but keeps the failure reason
    pub async fn fetch_outcome(&self, query: &ChannelQuery) -> ChannelOutcome {
        match self.try_fetch(query).await {
            Ok(videos) => ChannelOutcome::Fetched(videos),
            Err(AppError::ChannelNotFound(channel)) => {
                warn!("⚠️ Channel not found: {}", channel);
                ChannelOutcome::Failed {
                    reason: format!("channel not found: {}", channel),
                }
            }
            Err(e) => {
                warn!("❌ Failed to fetch channel {}: {}", query.channel, e);
                ChannelOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Run the fetch algorithm, propagating the first request failure
    pub async fn try_fetch(&self, query: &ChannelQuery) -> AppResult<Vec<VideoRecord>> {
        let playlist_id = self
            .api
            .resolve_uploads_playlist(&query.channel)
            .await?
            .ok_or_else(|| AppError::ChannelNotFound(query.channel.to_string()))?;

        debug!(
            "Channel {} resolved to uploads listing {}",
            query.channel, playlist_id
        );

        let now = Utc::now();
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        for page_index in 0..query.max_pages {
            let page = self
                .api
                .list_playlist_page(&playlist_id, self.config.page_size, page_token.as_deref())
                .await?;

            for item in &page.items {
                if let Some(record) = self.process_item(query, item, now).await? {
                    videos.push(record);
                }
            }

            page_token = page.next_page_token.filter(|token| !token.is_empty());
            if page_token.is_none() {
                break;
            }

            if page_index + 1 < query.max_pages && !self.config.page_delay.is_zero() {
                sleep(self.config.page_delay).await;
            }
        }

        info!(
            "✅ Channel {}: {} matching video(s)",
            query.channel,
            videos.len()
        );
        Ok(videos)
    }

    /// Filter one listed item and join it with its details
    async fn process_item(
        &self,
        query: &ChannelQuery,
        item: &PlaylistItem,
        now: DateTime<Utc>,
    ) -> AppResult<Option<VideoRecord>> {
        let Some(video_id) = item.video_id() else {
            debug!("Skipping listing item without a video id");
            return Ok(None);
        };

        if !matches_keyword(&query.keyword, &item.snippet.title, &item.snippet.description) {
            return Ok(None);
        }

        let listed_at = match item.published_at().map(parse_timestamp) {
            Some(Ok(timestamp)) => timestamp,
            Some(Err(e)) => {
                warn!("Skipping video {}: {}", video_id, e);
                return Ok(None);
            }
            None => {
                warn!("Skipping video {}: missing publish timestamp", video_id);
                return Ok(None);
            }
        };

        if let Some(window) = query.recency_window {
            if !within_recency(listed_at, now, window) {
                return Ok(None);
            }
        }

        let Some(details) = self.api.fetch_video_details(video_id).await? else {
            debug!("No details returned for video {}, skipping", video_id);
            return Ok(None);
        };

        match build_record(item, &details, listed_at) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Skipping video {}: {}", video_id, e);
                Ok(None)
            }
        }
    }
}

/// Case-insensitive substring match against title or description.
/// An empty keyword matches everything.
pub fn matches_keyword(keyword: &str, title: &str, description: &str) -> bool {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return true;
    }
    title.to_lowercase().contains(&keyword) || description.to_lowercase().contains(&keyword)
}

/// Whether `published` falls inside `window` before `now`, lower bound inclusive
pub fn within_recency(published: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    // Windows reaching past chrono's range cover all of history
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
        .map_or(true, |lower| published >= lower)
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| AppError::Parse(format!("invalid timestamp '{}': {}", value, e)))
}

fn build_record(
    item: &PlaylistItem,
    details: &VideoDetails,
    listed_at: DateTime<Utc>,
) -> AppResult<VideoRecord> {
    let published_at = match details.snippet.published_at.as_deref() {
        Some(value) => parse_timestamp(value)?,
        None => listed_at,
    };

    let video_id = details.id.clone();
    let url = VideoRecord::watch_url(&video_id);

    Ok(VideoRecord {
        video_id,
        title: details
            .snippet
            .title
            .clone()
            .unwrap_or_else(|| item.snippet.title.clone()),
        description: details
            .snippet
            .description
            .clone()
            .unwrap_or_else(|| item.snippet.description.clone()),
        channel_id: details
            .snippet
            .channel_id
            .clone()
            .or_else(|| item.snippet.channel_id.clone())
            .unwrap_or_default(),
        channel_title: details
            .snippet
            .channel_title
            .clone()
            .or_else(|| item.snippet.channel_title.clone())
            .unwrap_or_default(),
        published_at,
        view_count: details.statistics.views(),
        like_count: details.statistics.likes(),
        comment_count: details.statistics.comments(),
        url,
    })
}
