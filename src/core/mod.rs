//! Core business logic module
//!
//! This module contains the domain models, the YouTube API client, and the
//! fetch / fan-out / cache / orchestration pipeline behind a channel search.

pub mod cache;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod fetcher;
pub mod manager;
pub mod models;
pub mod report;
pub mod youtube_api;

#[cfg(test)]
mod test_support;



// Re-export commonly used types
pub use config::AppConfig;
pub use manager::VideoSearchManager;
