//! Output module for run summaries and reports
//!
//! This module handles:
//! - The one-line run summary printed after every invocation
//! - Catalog statistics for `--stats`
//! - Markdown catalog summaries for `--export-summary`

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CatalogStatistics};

use crate::crawler::BatchReport;
use crate::state::CrawlState;
use std::fmt;

/// Result of one invocation, printed as a single line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Titles in the title list
    pub titles: usize,
    pub processed: usize,
    pub skipped_non_item: usize,
    pub added: usize,
    /// Fetch failures in this run
    pub failed: usize,
    /// Catalog size after the run
    pub items: usize,
    /// Cursor for the next invocation
    pub next_index: usize,
}

impl RunSummary {
    /// Builds the summary from the committed state and the batch counters
    pub fn from_run(state: &CrawlState, report: &BatchReport) -> Self {
        Self {
            titles: state.total_titles,
            processed: report.processed,
            skipped_non_item: report.skipped_non_item,
            added: report.added,
            failed: report.failed,
            items: state.total_items,
            next_index: state.cursor,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Titles: {} | Processed: {} | SkippedNonItem: {} | Added: {} | Items: {} | Next index: {}",
            self.titles,
            self.processed,
            self.skipped_non_item,
            self.added,
            self.items,
            self.next_index
        )?;
        if self.failed > 0 {
            write!(f, " | Failed: {}", self.failed)?;
        }
        Ok(())
    }
}
