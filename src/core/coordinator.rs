//! Fan-out coordinator
//!
//! Runs one [`ChannelFetcher`] call per channel, concurrently but gated by a
//! semaphore, waits for all of them and merges the results newest first.
//! A channel task that panics is reported as a failed channel; this relies on
//! the release profile unwinding rather than aborting.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::channel::ChannelRef;
use super::fetcher::ChannelFetcher;
use super::models::{ChannelFailure, ChannelOutcome, SearchReport, VideoRecord};

/// Default cap on simultaneous channel fetches
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Concurrent multi-channel search
#[derive(Clone)]
pub struct FanOutCoordinator {
    fetcher: ChannelFetcher,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl FanOutCoordinator {
    pub fn new(fetcher: ChannelFetcher, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Merged matches across all channels, newest first
    pub async fn search_all_channels(
        &self,
        keyword: &str,
        channels: &[ChannelRef],
        recency_window: Option<Duration>,
    ) -> Vec<VideoRecord> {
        self.search_with_report(keyword, channels, recency_window)
            .await
            .videos
    }

    /// Merged matches plus the channels that could not be fetched
    pub async fn search_with_report(
        &self,
        keyword: &str,
        channels: &[ChannelRef],
        recency_window: Option<Duration>,
    ) -> SearchReport {
        if channels.is_empty() {
            return SearchReport::default();
        }

        info!(
            "🔍 Searching '{}' across {} channel(s), {} at a time",
            keyword,
            channels.len(),
            self.max_concurrent
        );

        let handles: Vec<_> = channels
            .iter()
            .map(|channel| {
                let fetcher = self.fetcher.clone();
                let semaphore = Arc::clone(&self.semaphore);
                let query = self
                    .fetcher
                    .query(channel.clone(), keyword, recency_window);

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return ChannelOutcome::Failed {
                                reason: format!("Failed to acquire semaphore: {}", e),
                            }
                        }
                    };
                    fetcher.fetch_outcome(&query).await
                })
            })
            .collect();

        // join_all keeps input order, so arrival order is channel order
        let results = join_all(handles).await;

        let mut outcomes = Vec::with_capacity(results.len());
        for (channel, result) in channels.iter().zip(results) {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Task join error for channel {}: {}", channel, e);
                    ChannelOutcome::Failed {
                        reason: format!("Task execution failed: {}", e),
                    }
                }
            };
            outcomes.push((channel.to_string(), outcome));
        }

        let report = merge_outcomes(outcomes);
        info!(
            "📊 Fan-out finished: {} video(s), {} failed channel(s)",
            report.videos.len(),
            report.failures.len()
        );
        report
    }
}

/// Concatenate per-channel outcomes in the given order and sort newest first.
/// The sort is stable, so equal timestamps keep their concatenation order.
pub fn merge_outcomes<I>(outcomes: I) -> SearchReport
where
    I: IntoIterator<Item = (String, ChannelOutcome)>,
{
    let mut report = SearchReport::default();

    for (channel, outcome) in outcomes {
        match outcome {
            ChannelOutcome::Fetched(videos) => report.videos.extend(videos),
            ChannelOutcome::Failed { reason } => {
                report.failures.push(ChannelFailure { channel, reason })
            }
        }
    }

    sort_newest_first(&mut report.videos);
    report
}

/// Stable sort by publish timestamp, descending
pub fn sort_newest_first(videos: &mut [VideoRecord]) {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
