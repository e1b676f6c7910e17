//! In-process fake of the upstream video API shared by the pipeline tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::channel::ChannelRef;
use super::models::{AppError, AppResult, VideoRecord};
use super::youtube_api::{
    PlaylistContentDetails, PlaylistItem, PlaylistPage, PlaylistSnippet, SearchHit, SearchHitId,
    VideoApi, VideoDetails, VideoSnippet, VideoStatistics,
};

/// A video as the fake upstream knows it
#[derive(Debug, Clone)]
pub struct FakeVideo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: String,
    pub views: u64,
}

pub fn fake_video(id: &str, title: &str, published_at: &str) -> FakeVideo {
    FakeVideo {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        published_at: published_at.to_string(),
        views: 1000,
    }
}

impl FakeVideo {
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    fn listing_item(&self, channel: &str) -> PlaylistItem {
        PlaylistItem {
            snippet: PlaylistSnippet {
                title: self.title.clone(),
                description: self.description.clone(),
                published_at: Some(self.published_at.clone()),
                channel_id: Some(format!("id-{}", channel)),
                channel_title: Some(channel.to_string()),
            },
            content_details: PlaylistContentDetails {
                video_id: Some(self.id.clone()),
                video_published_at: Some(self.published_at.clone()),
            },
        }
    }

    fn details(&self, channel: &str) -> VideoDetails {
        VideoDetails {
            id: self.id.clone(),
            snippet: VideoSnippet {
                title: Some(self.title.clone()),
                description: Some(self.description.clone()),
                published_at: Some(self.published_at.clone()),
                channel_id: Some(format!("id-{}", channel)),
                channel_title: Some(channel.to_string()),
            },
            statistics: VideoStatistics {
                view_count: Some(self.views.to_string()),
                like_count: Some("10".to_string()),
                comment_count: Some("2".to_string()),
            },
        }
    }
}

enum FakeChannel {
    Uploads(String),
    Broken(String),
}

/// Call counters, readable while the fake is shared behind an `Arc`
#[derive(Debug, Default)]
pub struct CallCounts {
    pub resolve: AtomicUsize,
    pub pages: AtomicUsize,
    pub details: AtomicUsize,
    pub search: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.resolve.load(Ordering::SeqCst)
            + self.pages.load(Ordering::SeqCst)
            + self.details.load(Ordering::SeqCst)
            + self.search.load(Ordering::SeqCst)
    }
}

/// Scripted [`VideoApi`] with per-endpoint counters and an in-flight gauge
#[derive(Default)]
pub struct FakeApi {
    channels: HashMap<ChannelRef, FakeChannel>,
    playlists: HashMap<String, Vec<Vec<PlaylistItem>>>,
    details: HashMap<String, VideoDetails>,
    search_hits: Vec<SearchHit>,
    search_error: Option<String>,
    latency: Duration,
    pub calls: CallCounts,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub last_search: std::sync::Mutex<Option<(String, Vec<String>, usize)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `@handle` with one listing page per inner vector
    pub fn with_channel(mut self, handle: &str, pages: Vec<Vec<FakeVideo>>) -> Self {
        let playlist_id = format!("UU-{}", handle);
        let mut listing = Vec::with_capacity(pages.len());
        for page in pages {
            let mut items = Vec::with_capacity(page.len());
            for video in page {
                items.push(video.listing_item(handle));
                self.details
                    .insert(video.id.clone(), video.details(handle));
            }
            listing.push(items);
        }

        self.playlists.insert(playlist_id.clone(), listing);
        self.channels.insert(
            ChannelRef::Handle(handle.to_string()),
            FakeChannel::Uploads(playlist_id),
        );
        self
    }

    /// Register `@handle` whose resolution fails with an API error
    pub fn with_broken_channel(mut self, handle: &str, message: &str) -> Self {
        self.channels.insert(
            ChannelRef::Handle(handle.to_string()),
            FakeChannel::Broken(message.to_string()),
        );
        self
    }

    /// Drop the detail record so the details lookup comes back empty
    pub fn without_details(mut self, video_id: &str) -> Self {
        self.details.remove(video_id);
        self
    }

    pub fn with_search_hits(mut self, hits: Vec<SearchHit>) -> Self {
        self.search_hits = hits;
        self
    }

    pub fn with_search_error(mut self, message: &str) -> Self {
        self.search_error = Some(message.to_string());
        self
    }

    /// Simulated round-trip time of every channel resolution
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn resolve_uploads_playlist(&self, channel: &ChannelRef) -> AppResult<Option<String>> {
        self.calls.resolve.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.channels.get(channel) {
            Some(FakeChannel::Uploads(playlist_id)) => Ok(Some(playlist_id.clone())),
            Some(FakeChannel::Broken(message)) => Err(AppError::Api {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(None),
        }
    }

    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> AppResult<PlaylistPage> {
        self.calls.pages.fetch_add(1, Ordering::SeqCst);

        let pages = self
            .playlists
            .get(playlist_id)
            .ok_or_else(|| AppError::Api {
                status: 404,
                message: format!("playlist {} not found", playlist_id),
            })?;

        let index = match page_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| AppError::Parse(format!("bad page token {}", token)))?,
        };

        let items = pages
            .get(index)
            .map(|items| items.iter().take(page_size).cloned().collect())
            .unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));

        Ok(PlaylistPage {
            items,
            next_page_token,
        })
    }

    async fn fetch_video_details(&self, video_id: &str) -> AppResult<Option<VideoDetails>> {
        self.calls.details.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.get(video_id).cloned())
    }

    async fn search_videos(
        &self,
        term: &str,
        channel_ids: &[String],
        max_results: usize,
    ) -> AppResult<Vec<SearchHit>> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_search.lock() {
            *last = Some((term.to_string(), channel_ids.to_vec(), max_results));
        }

        match &self.search_error {
            Some(message) => Err(AppError::Api {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(self.search_hits.clone()),
        }
    }
}

/// A keyword search result as the search endpoint returns it
pub fn search_hit(id: &str, title: &str, published_at: &str) -> SearchHit {
    SearchHit {
        id: SearchHitId {
            kind: "youtube#video".to_string(),
            video_id: Some(id.to_string()),
        },
        snippet: VideoSnippet {
            title: Some(title.to_string()),
            description: Some(String::new()),
            published_at: Some(published_at.to_string()),
            channel_id: Some("UCaaaaaaaaaaaaaaaaaaaaaa".to_string()),
            channel_title: Some("Search Channel".to_string()),
        },
    }
}

pub fn handle(name: &str) -> ChannelRef {
    ChannelRef::Handle(name.to_string())
}

pub fn ids(videos: &[VideoRecord]) -> Vec<&str> {
    videos.iter().map(|v| v.video_id.as_str()).collect()
}
