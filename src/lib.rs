//! Channel Video Search - Core Library
//!
//! Searches a fixed set of YouTube channels for videos whose title or
//! description contains a keyword. Channels are fetched concurrently, merged
//! newest first, and cached per query for a caller-supplied time.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{
    cache::{InMemoryCache, NullCache, SearchCache},
    channel::ChannelRef,
    config::{AppConfig, CacheBackend, SearchMode},
    coordinator::FanOutCoordinator,
    fetcher::{ChannelFetcher, FetcherConfig},
    manager::{FanOutSearch, KeywordSearch, VideoSearch, VideoSearchManager},
    models::{AppError, AppResult, SearchKey, SearchReport, VideoRecord},
    youtube_api::{VideoApi, YoutubeApiClient},
};

use std::sync::Arc;

/// Everything a search run needs, built once from configuration
#[derive(Clone)]
pub struct SearchApp {
    pub config: AppConfig,
    pub manager: VideoSearchManager,
    pub channels: Vec<ChannelRef>,
}

impl SearchApp {
    /// Build the HTTP client, pipeline and cache for `config`
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let api_key = config.require_api_key()?.to_string();

        let client = YoutubeApiClient::new(&config.api, api_key)
            .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;

        Self::with_api(config, Arc::new(client))
    }

    /// Same as [`new`](Self::new) with a caller-provided API implementation
    pub fn with_api(config: AppConfig, api: Arc<dyn VideoApi>) -> anyhow::Result<Self> {
        let channels = config
            .search
            .channels
            .iter()
            .map(|channel| ChannelRef::parse(channel))
            .collect::<AppResult<Vec<_>>>()?;

        let manager = VideoSearchManager::from_config(&config, api);

        Ok(Self {
            config,
            manager,
            channels,
        })
    }

    /// Run the configured search through the cache
    pub async fn run(&self) -> SearchReport {
        self.manager
            .search_with_report(
                &self.config.search.keyword,
                &self.channels,
                self.config.search.result_limit,
                self.config.cache.ttl(),
            )
            .await
    }

    /// Load the on-disk configuration, falling back to defaults when it is
    /// missing or invalid
    pub fn load_or_initialize_config() -> AppConfig {
        match AppConfig::load() {
            Ok(cfg) => {
                if let Err(err) = cfg.validate() {
                    tracing::warn!(
                        "Invalid configuration detected ({}), falling back to defaults",
                        err
                    );
                    AppConfig::default()
                } else {
                    cfg
                }
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to load configuration from disk: {}. Using defaults",
                    err
                );
                AppConfig::default()
            }
        }
    }
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with default settings
pub fn init() -> anyhow::Result<()> {
    utils::logging::init_tracing();
    tracing::info!("📚 {} v{} initialized", NAME, VERSION);
    Ok(())
}
