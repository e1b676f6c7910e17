//! Channel reference parsing
//!
//! Channels reach the crate as platform IDs (`UC…`), `@handles`, legacy
//! usernames or full channel URLs. All of them are normalized into a single
//! [`ChannelRef`], which the API client resolves to the channel's uploads
//! listing through the matching selector of the channels endpoint.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

use super::models::{AppError, AppResult};

static CHANNEL_ID_PATTERN: OnceLock<Regex> = OnceLock::new();
static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn channel_id_pattern() -> &'static Regex {
    CHANNEL_ID_PATTERN.get_or_init(|| {
        Regex::new(r"^UC[0-9A-Za-z_-]{22}$").expect("channel id pattern is valid")
    })
}

fn name_pattern() -> &'static Regex {
    NAME_PATTERN
        .get_or_init(|| Regex::new(r"^[0-9A-Za-z_.\-]{1,100}$").expect("name pattern is valid"))
}

/// Path segments that never name a channel
const RESERVED_SEGMENTS: &[&str] = &[
    "watch", "results", "feed", "playlist", "shorts", "embed", "live", "hashtag",
];

/// Canonical channel identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelRef {
    /// Platform-internal channel id (`UC` + 22 characters)
    Id(String),
    /// Channel handle, stored without the leading `@`
    Handle(String),
    /// Legacy username (`youtube.com/user/<name>` or `youtube.com/<name>`)
    Username(String),
}

impl ChannelRef {
    /// Parse user input into a channel reference
    pub fn parse(input: &str) -> AppResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AppError::Config("Empty channel identifier".to_string()));
        }

        if let Some(handle) = input.strip_prefix('@') {
            return Self::handle(handle, input);
        }

        if channel_id_pattern().is_match(input) {
            return Ok(Self::Id(input.to_string()));
        }

        if input.contains('/') || input.contains("youtube.com") {
            return Self::parse_url(input);
        }

        Self::handle(input, input)
    }

    /// Query parameter selecting this channel on the channels endpoint
    pub fn selector(&self) -> (&'static str, &str) {
        match self {
            Self::Id(id) => ("id", id.as_str()),
            Self::Handle(handle) => ("forHandle", handle.as_str()),
            Self::Username(name) => ("forUsername", name.as_str()),
        }
    }

    fn handle(name: &str, original: &str) -> AppResult<Self> {
        if name_pattern().is_match(name) {
            Ok(Self::Handle(name.to_string()))
        } else {
            Err(AppError::Config(format!(
                "Invalid channel handle: {}",
                original
            )))
        }
    }

    fn username(name: &str, original: &str) -> AppResult<Self> {
        if name_pattern().is_match(name) {
            Ok(Self::Username(name.to_string()))
        } else {
            Err(AppError::Config(format!(
                "Invalid channel username: {}",
                original
            )))
        }
    }

    fn parse_url(input: &str) -> AppResult<Self> {
        let absolute = if input.starts_with("http://") || input.starts_with("https://") {
            input.to_string()
        } else if input.contains("youtube.com") {
            format!("https://{}", input.trim_start_matches('/'))
        } else {
            format!("https://www.youtube.com/{}", input.trim_start_matches('/'))
        };

        let url = Url::parse(&absolute)
            .map_err(|e| AppError::Config(format!("Invalid channel URL {}: {}", input, e)))?;

        let host = url.host_str().unwrap_or_default();
        if host != "youtube.com" && !host.ends_with(".youtube.com") {
            return Err(AppError::Config(format!(
                "Not a channel URL: {}",
                input
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [first, ..] if first.starts_with('@') => Self::handle(&first[1..], input),
            ["channel", id, ..] if channel_id_pattern().is_match(id) => {
                Ok(Self::Id(id.to_string()))
            }
            ["user", name, ..] => Self::username(name, input),
            // Custom `/c/<name>` URLs were folded into handles by the platform
            ["c", name, ..] => Self::handle(name, input),
            [name, ..] if !RESERVED_SEGMENTS.contains(name) => Self::username(name, input),
            _ => Err(AppError::Config(format!(
                "Not a channel URL: {}",
                input
            ))),
        }
    }
}

impl FromStr for ChannelRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Handle(handle) => write!(f, "@{}", handle),
            Self::Username(name) => write!(f, "user/{}", name),
        }
    }
}
