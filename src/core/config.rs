//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::youtube_api::{DEFAULT_BASE_URL, MAX_PAGE_SIZE};
use crate::utils::network::{get_user_agent, DEFAULT_TIMEOUT};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Environment variable overriding the search keyword
pub const KEYWORD_ENV: &str = "SEARCH_KEYWORD";

/// Environment variable overriding the channel list (comma separated)
pub const CHANNELS_ENV: &str = "SEARCH_CHANNELS";

pub const RESULT_LIMIT_ENV: &str = "SEARCH_RESULT_LIMIT";
pub const MAX_CONCURRENT_ENV: &str = "SEARCH_MAX_CONCURRENT";
/// Recency window in days; `0` or empty clears it
pub const RECENCY_DAYS_ENV: &str = "SEARCH_RECENCY_DAYS";
pub const CACHE_TTL_ENV: &str = "CACHE_TTL_SECS";
pub const CSV_PATH_ENV: &str = "OUTPUT_CSV_PATH";

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
}

/// Upstream API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Usually supplied through `YOUTUBE_API_KEY` instead of the file
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

/// Which underlying search backs the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Walk every channel's uploads concurrently and filter locally
    FanOut,
    /// One keyword search call restricted to the channel set
    Keyword,
}

/// Search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub keyword: String,
    pub channels: Vec<String>,
    /// 0 keeps every match
    pub result_limit: usize,
    pub recency_days: Option<u32>,
    pub page_size: usize,
    pub max_pages: usize,
    pub page_delay_ms: u64,
    pub max_concurrent_channels: usize,
    pub mode: SearchMode,
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    Disabled,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub ttl_secs: u64,
}

/// Report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub write_csv: bool,
    pub csv_path: PathBuf,
    pub summary_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            search: SearchConfig::default(),
            cache: CacheConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: get_user_agent().to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keyword: "BMW".to_string(),
            channels: default_channels(),
            result_limit: 0,
            recency_days: None,
            page_size: MAX_PAGE_SIZE,
            max_pages: 2,
            page_delay_ms: 500,
            max_concurrent_channels: 4,
            mode: SearchMode::FanOut,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl_secs: 3600,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_csv: true,
            csv_path: PathBuf::from("videos.csv"),
            summary_limit: 10,
        }
    }
}

/// Automotive channels searched when nothing else is configured
fn default_channels() -> Vec<String> {
    [
        "@quatrorodas",
        "@Autoesporte",
        "@motor1brasil",
        "@automaisoficial",
        "@webmotors",
        "@Acelerados",
        "@decaronacomleandro",
        "@Macchina",
        "@duasrodasbr",
        "@motociclismoonline",
        "@FullpowerTV",
        "@UltimaMarcha",
        "@FlatOutBrasil",
        "@CanalMotoPlay",
        "@Vansfaria",
        "@OntheRoadBr",
        "@pilotoleandromello",
        "@ARodaTV",
        "@CarroChefe",
        "@CassioCortes",
        "@durvalcareca",
        "@MinutoMotor",
        "@EstadaoMobilidade",
        "@AutoPapo",
        "@garagemdobellotetv",
        "@KS1951",
        "https://www.youtube.com/FalandoDeCarro",
        "https://www.youtube.com/jorgemoraes",
        "@oloopinfinito",
        "@RevistaMotoAdventureOficial",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Parsed value of an override variable; unparsable values are logged and ignored
fn parse_env<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", name, value, e);
            None
        }
    }
}

impl SearchConfig {
    pub fn recency_window(&self) -> Option<Duration> {
        self.recency_days
            .map(|days| Duration::from_secs(u64::from(days) * 24 * 60 * 60))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating a default file if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::info!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {:?}", parent)
                })?;
            }
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "channelvideosearch", "cvs")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Export configuration as JSON string
    pub fn export(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to export configuration")
    }

    /// Parse and validate configuration from a JSON string
    pub fn import(json: &str) -> Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).with_context(|| "Failed to parse imported configuration")?;

        config
            .validate()
            .with_context(|| "Imported configuration is invalid")?;

        Ok(config)
    }

    /// Apply environment overrides on top of the file values
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.api_key = Some(key.trim().to_string());
        }

        if let Some(keyword) = lookup(KEYWORD_ENV).filter(|v| !v.trim().is_empty()) {
            self.search.keyword = keyword.trim().to_string();
        }

        if let Some(channels) = lookup(CHANNELS_ENV) {
            let channels: Vec<String> = channels
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !channels.is_empty() {
                self.search.channels = channels;
            }
        }

        if let Some(limit) = parse_env(&lookup, RESULT_LIMIT_ENV) {
            self.search.result_limit = limit;
        }

        if let Some(max) = parse_env(&lookup, MAX_CONCURRENT_ENV) {
            self.search.max_concurrent_channels = max;
        }

        if let Some(days) = lookup(RECENCY_DAYS_ENV) {
            match days.trim() {
                "" | "0" => self.search.recency_days = None,
                value => match value.parse() {
                    Ok(days) => self.search.recency_days = Some(days),
                    Err(e) => tracing::warn!(
                        "Ignoring {}={:?}: {}",
                        RECENCY_DAYS_ENV,
                        value,
                        e
                    ),
                },
            }
        }

        if let Some(ttl) = parse_env(&lookup, CACHE_TTL_ENV) {
            self.cache.ttl_secs = ttl;
        }

        if let Some(path) = lookup(CSV_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.output.csv_path = PathBuf::from(path.trim());
        }
    }

    /// The API key, failing fast when it is missing
    pub fn require_api_key(&self) -> Result<&str> {
        self.api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .with_context(|| {
                format!(
                    "YouTube API key is not configured. Set the {} environment variable or add it to a .env file",
                    API_KEY_ENV
                )
            })
    }

    /// Get configuration as environment variables (for debugging)
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        let mut env_vars = HashMap::new();

        env_vars.insert(KEYWORD_ENV.to_string(), self.search.keyword.clone());
        env_vars.insert(CHANNELS_ENV.to_string(), self.search.channels.join(","));
        env_vars.insert(
            RESULT_LIMIT_ENV.to_string(),
            self.search.result_limit.to_string(),
        );
        env_vars.insert(
            MAX_CONCURRENT_ENV.to_string(),
            self.search.max_concurrent_channels.to_string(),
        );
        env_vars.insert(
            RECENCY_DAYS_ENV.to_string(),
            self.search.recency_days.unwrap_or(0).to_string(),
        );
        env_vars.insert(CACHE_TTL_ENV.to_string(), self.cache.ttl_secs.to_string());
        env_vars.insert(
            CSV_PATH_ENV.to_string(),
            self.output.csv_path.display().to_string(),
        );
        env_vars.insert(
            API_KEY_ENV.to_string(),
            if self.api.api_key.is_some() { "***" } else { "" }.to_string(),
        );

        env_vars
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("API base URL must not be empty");
        }

        if self.api.request_timeout_secs == 0 || self.api.request_timeout_secs > 300 {
            anyhow::bail!("Request timeout should be between 1 and 300 seconds");
        }

        if self.search.page_size == 0 || self.search.page_size > MAX_PAGE_SIZE {
            anyhow::bail!("Page size should be between 1 and {}", MAX_PAGE_SIZE);
        }

        if self.search.max_pages == 0 || self.search.max_pages > 10 {
            anyhow::bail!("Max pages should be between 1 and 10");
        }

        if self.search.max_concurrent_channels == 0 || self.search.max_concurrent_channels > 32 {
            anyhow::bail!("Concurrent channel fetches should be between 1 and 32");
        }

        if self.search.page_delay_ms > 60_000 {
            anyhow::bail!("Page delay should not exceed 60000 ms");
        }

        if let Some(days) = self.search.recency_days {
            if days == 0 || days > 3650 {
                anyhow::bail!("Recency window should be between 1 and 3650 days");
            }
        }

        for channel in &self.search.channels {
            crate::core::channel::ChannelRef::parse(channel)
                .with_context(|| format!("Invalid channel in configuration: {}", channel))?;
        }

        if self.output.write_csv && self.output.csv_path.as_os_str().is_empty() {
            anyhow::bail!("CSV path must be set when CSV output is enabled");
        }

        Ok(())
    }
}
