//! YouTube Data API client
//!
//! The fetch path only depends on the [`VideoApi`] trait: resolving a
//! channel to its uploads listing, paging through a listing, and fetching
//! per-video details. [`YoutubeApiClient`] implements it over HTTPS with a
//! single API key; tests substitute an in-process fake.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::channel::ChannelRef;
use super::config::ApiConfig;
use super::models::{AppError, AppResult};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Largest page the listing endpoints accept
pub const MAX_PAGE_SIZE: usize = 50;

/// Upstream operations used by the fetcher and the keyword search
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Resolve a channel to its uploads listing id, `None` if it does not exist
    async fn resolve_uploads_playlist(&self, channel: &ChannelRef) -> AppResult<Option<String>>;

    /// Fetch one page of a listing
    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> AppResult<PlaylistPage>;

    /// Fetch snippet and statistics for one video, `None` if the response is empty
    async fn fetch_video_details(&self, video_id: &str) -> AppResult<Option<VideoDetails>>;

    /// Keyword search restricted to a set of channels
    async fn search_videos(
        &self,
        term: &str,
        channel_ids: &[String],
        max_results: usize,
    ) -> AppResult<Vec<SearchHit>>;
}

/// One page of an upload listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: PlaylistSnippet,
    #[serde(default)]
    pub content_details: PlaylistContentDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// When the item was added to the listing
    pub published_at: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistContentDetails {
    pub video_id: Option<String>,
    /// When the video itself was published
    pub video_published_at: Option<String>,
}

impl PlaylistItem {
    pub fn video_id(&self) -> Option<&str> {
        self.content_details.video_id.as_deref()
    }

    /// Best available publish timestamp for the listed video
    pub fn published_at(&self) -> Option<&str> {
        self.content_details
            .video_published_at
            .as_deref()
            .or(self.snippet.published_at.as_deref())
    }
}

/// Details of a single video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
}

/// Counters arrive as decimal strings and any of them may be hidden
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

impl VideoStatistics {
    pub fn views(&self) -> u64 {
        parse_count(self.view_count.as_deref())
    }

    pub fn likes(&self) -> u64 {
        parse_count(self.like_count.as_deref())
    }

    pub fn comments(&self) -> u64 {
        parse_count(self.comment_count.as_deref())
    }
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// One result of a keyword search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: SearchHitId,
    #[serde(default)]
    pub snippet: VideoSnippet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHitId {
    #[serde(default)]
    pub kind: String,
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTPS client for the YouTube Data API v3
#[derive(Clone)]
pub struct YoutubeApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl YoutubeApiClient {
    /// Create a client from the API section of the configuration
    pub fn new(config: &ApiConfig, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config("API key must not be empty".to_string()));
        }

        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| AppError::Config(format!("Invalid API base URL {}: {}", base, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(resource)
            .map_err(|e| AppError::Config(format!("Invalid endpoint {}: {}", resource, e)))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        debug!("GET {}", redact_key(&url));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[async_trait]
impl VideoApi for YoutubeApiClient {
    async fn resolve_uploads_playlist(&self, channel: &ChannelRef) -> AppResult<Option<String>> {
        let (selector, value) = channel.selector();
        let url = self.endpoint("channels", &[("part", "contentDetails"), (selector, value)])?;
        let response: ListResponse<ChannelResource> = self.get_json(url).await?;

        let Some(resource) = response.items.into_iter().next() else {
            return Ok(None);
        };

        resource
            .content_details
            .and_then(|details| details.related_playlists)
            .and_then(|playlists| playlists.uploads)
            .map(Some)
            .ok_or_else(|| {
                AppError::Parse(format!("Channel {} has no uploads listing", channel))
            })
    }

    async fn list_playlist_page(
        &self,
        playlist_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> AppResult<PlaylistPage> {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let url = self.endpoint("playlistItems", &params)?;
        self.get_json(url).await
    }

    async fn fetch_video_details(&self, video_id: &str) -> AppResult<Option<VideoDetails>> {
        let url = self.endpoint("videos", &[("part", "snippet,statistics"), ("id", video_id)])?;
        let response: ListResponse<VideoDetails> = self.get_json(url).await?;
        Ok(response.items.into_iter().next())
    }

    async fn search_videos(
        &self,
        term: &str,
        channel_ids: &[String],
        max_results: usize,
    ) -> AppResult<Vec<SearchHit>> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let joined = channel_ids.join(",");
        let mut params = vec![
            ("part", "id,snippet"),
            ("type", "video"),
            ("q", term),
            ("maxResults", max_results.as_str()),
        ];
        if !channel_ids.is_empty() {
            params.push(("channelId", joined.as_str()));
        }

        let url = self.endpoint("search", &params)?;
        let response: ListResponse<SearchHit> = self.get_json(url).await?;
        Ok(response.items)
    }
}
