/// Crawl state definitions for resuming across invocations
///
/// The state is a plain serializable value: it is loaded at the start of an
/// invocation, passed through the batch step, and written back once at the end.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Batch size used when no state has been persisted yet
pub const DEFAULT_BATCH_SIZE: usize = 60;

/// Phase of the crawl, derived from the cursor and the title count
///
/// There is no persisted phase tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// No title has been processed yet
    NotStarted,
    /// Some, but not all, titles have been processed
    InProgress,
    /// The cursor reached the end of the title list
    Complete,
}

impl CrawlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resumable crawl progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlState {
    /// Index of the next unprocessed title
    #[serde(alias = "index", default)]
    pub cursor: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(with = "chrono::serde::ts_seconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_seconds_option", default)]
    pub last_run: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_added: usize,

    #[serde(default)]
    pub last_processed: usize,

    #[serde(default)]
    pub last_skipped_non_item: usize,

    #[serde(default)]
    pub last_failed: usize,

    #[serde(default)]
    pub total_titles: usize,

    #[serde(default)]
    pub total_items: usize,

    /// Titles whose fetch failed, in first-failure order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_titles: Vec<String>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl CrawlState {
    /// Fresh state with the cursor at the first title
    pub fn new(batch_size: usize, created_at: DateTime<Utc>) -> Self {
        Self {
            cursor: 0,
            batch_size: batch_size.max(1),
            created_at,
            last_run: None,
            last_added: 0,
            last_processed: 0,
            last_skipped_non_item: 0,
            last_failed: 0,
            total_titles: 0,
            total_items: 0,
            failed_titles: Vec::new(),
        }
    }

    /// Phase relative to a title list of `total_titles` entries
    pub fn phase(&self, total_titles: usize) -> CrawlPhase {
        if self.cursor >= total_titles {
            CrawlPhase::Complete
        } else if self.cursor == 0 {
            CrawlPhase::NotStarted
        } else {
            CrawlPhase::InProgress
        }
    }

    /// Index range of the next batch window
    ///
    /// A cursor past the end (title list rebuilt shorter) yields an empty
    /// window at the end of the list.
    pub fn window(&self, total_titles: usize) -> Range<usize> {
        let start = self.cursor.min(total_titles);
        let end = total_titles.min(start.saturating_add(self.batch_size.max(1)));
        start..end
    }

    /// Adds a title to the failed ledger unless already present
    pub fn record_failure(&mut self, title: &str) {
        if !self.failed_titles.iter().any(|t| t == title) {
            self.failed_titles.push(title.to_string());
        }
    }

    /// Resets progress while keeping creation time and batch size
    pub fn reset_progress(&mut self) {
        self.cursor = 0;
        self.failed_titles.clear();
    }
}
