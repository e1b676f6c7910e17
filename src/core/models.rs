//! Core data models for the channel video search

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::channel::ChannelRef;

/// Canonical watch URL prefix for a video identifier
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// A single video matched by a search

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]

pub struct VideoRecord {
    pub video_id: String,

    pub title: String,

    pub description: String,

    pub channel_id: String,

    pub channel_title: String,

    pub published_at: DateTime<Utc>,

    pub view_count: u64,

    pub like_count: u64,

    pub comment_count: u64,

    pub url: String,
}

impl VideoRecord {
    /// Build the canonical watch URL for a video id
    pub fn watch_url(video_id: &str) -> String {
        format!("{}{}", WATCH_URL_PREFIX, video_id)
    }
}

/// Per-channel fetch parameters
#[derive(Debug, Clone)]
pub struct ChannelQuery {
    pub channel: ChannelRef,

    pub keyword: String,

    pub recency_window: Option<Duration>,

    pub max_pages: usize,
}

/// Composite cache key for an orchestrated search.
///
/// The term is trimmed and lower-cased since both search paths match
/// case-insensitively. Channel order is kept because it decides tie order
/// in merged output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    term: String,
    channels: Vec<String>,
    limit: usize,
}

impl SearchKey {
    pub fn new<S: AsRef<str>>(term: &str, channels: &[S], limit: usize) -> Self {
        Self {
            term: term.trim().to_lowercase(),
            channels: channels
                .iter()
                .map(|channel| channel.as_ref().trim().to_string())
                .collect(),
            limit,
        }
    }

}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' across {} channel(s), limit {}",
            self.term,
            self.channels.len(),
            self.limit
        )
    }
}

/// Result of fetching one channel, keeping failures distinguishable from
/// channels that simply had no matches

#[derive(Debug, Clone)]

pub enum ChannelOutcome {
    Fetched(Vec<VideoRecord>),

    Failed { reason: String },
}

impl ChannelOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn into_videos(self) -> Vec<VideoRecord> {
        match self {
            Self::Fetched(videos) => videos,
            Self::Failed { .. } => Vec::new(),
        }
    }
}

/// A channel that could not be fetched during a fan-out

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]

pub struct ChannelFailure {
    pub channel: String,

    pub reason: String,
}

/// Merged fan-out result with partial-failure details

#[derive(Debug, Clone, Default)]

pub struct SearchReport {
    pub videos: Vec<VideoRecord>,

    pub failures: Vec<ChannelFailure>,
}

impl SearchReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Application error types

#[derive(Debug, thiserror::Error)]

pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        Self::Output(err.to_string())
    }
}

/// Result type alias for application operations

pub type AppResult<T> = Result<T, AppError>;
