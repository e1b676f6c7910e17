//! Report sink: console summary and CSV export

use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::models::{AppError, AppResult, VideoRecord};
use crate::utils::file_utils::{ensure_parent_dir, temp_sibling};

/// Records listed in the console summary by default
pub const DEFAULT_SUMMARY_LIMIT: usize = 10;

const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RULE_WIDTH: usize = 80;

/// One CSV row; field order is the column order
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    video_id: &'a str,
    title: &'a str,
    channel_title: &'a str,
    published_at: String,
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    url: &'a str,
}

impl<'a> From<&'a VideoRecord> for CsvRow<'a> {
    fn from(video: &'a VideoRecord) -> Self {
        Self {
            video_id: &video.video_id,
            title: &video.title,
            channel_title: &video.channel_title,
            published_at: video.published_at.format(CSV_TIMESTAMP_FORMAT).to_string(),
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            url: &video.url,
        }
    }
}

/// Format a count with comma thousands separators
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(ch);
    }
    formatted
}

/// Render the console summary, listing at most `limit` records
pub fn render_summary(videos: &[VideoRecord], keyword: &str, limit: usize) -> String {
    let mut out = String::new();

    if videos.is_empty() {
        let _ = writeln!(out, "No videos found for keyword '{}'.", keyword);
        return out;
    }

    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(
        out,
        "Found {} video(s) for keyword '{}'",
        videos.len(),
        keyword
    );
    let _ = writeln!(out, "{}\n", rule);

    for (i, video) in videos.iter().take(limit).enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, video.title);
        let _ = writeln!(out, "   Channel: {}", video.channel_title);
        let _ = writeln!(
            out,
            "   Published: {}",
            video.published_at.format(CSV_TIMESTAMP_FORMAT)
        );
        let _ = writeln!(out, "   Views: {}", format_count(video.view_count));
        let _ = writeln!(out, "   URL: {}", video.url);
        let _ = writeln!(out, "   {}", "-".repeat(RULE_WIDTH - 10));
    }

    if videos.len() > limit {
        let _ = writeln!(
            out,
            "\n... and {} more. See the CSV file for the full list.",
            videos.len() - limit
        );
    }

    out
}

/// Print the console summary to stdout
pub fn print_summary(videos: &[VideoRecord], keyword: &str, limit: usize) {
    print!("{}", render_summary(videos, keyword, limit));
}

/// Write `videos` as CSV to `path` and return the number of rows written.
///
/// Rows go to a temporary sibling first and are renamed into place, so a
/// failed write leaves any existing file at `path` untouched. An empty list
/// writes nothing.
pub fn write_csv(videos: &[VideoRecord], path: &Path) -> AppResult<usize> {
    if videos.is_empty() {
        warn!("No videos to save, skipping CSV {}", path.display());
        return Ok(0);
    }

    ensure_parent_dir(path).map_err(|e| AppError::Output(e.to_string()))?;

    let temp_path = temp_sibling(path);
    if let Err(e) = write_rows(videos, &temp_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(AppError::Output(format!(
            "Failed to move CSV into place at {}: {}",
            path.display(),
            e
        )));
    }

    info!("✅ Saved {} video(s) to {}", videos.len(), path.display());
    Ok(videos.len())
}

fn write_rows(videos: &[VideoRecord], path: &Path) -> AppResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for video in videos {
        writer.serialize(CsvRow::from(video))?;
    }
    writer.flush()?;
    Ok(())
}
