//! Statistics generation from persisted crawl data
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::catalog::SlotHint;
use crate::state::{CrawlPhase, CrawlState};
use crate::storage::{Storage, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Number of titles in the persisted title list
    pub total_titles: usize,

    /// When the title list was generated, if recorded
    pub titles_generated_at: Option<DateTime<Utc>>,

    /// Persisted crawl state, if any run has completed
    pub state: Option<CrawlState>,

    /// Catalog entries per slot
    pub items_by_slot: BTreeMap<SlotHint, usize>,

    /// Total catalog entries
    pub total_items: usize,
}

impl CatalogStatistics {
    /// Phase derived from the cursor
    pub fn phase(&self) -> CrawlPhase {
        match &self.state {
            Some(state) => state.phase(self.total_titles),
            None if self.total_titles == 0 => CrawlPhase::Complete,
            None => CrawlPhase::NotStarted,
        }
    }

    /// Share of titles processed, in percent
    pub fn progress(&self) -> f64 {
        if self.total_titles == 0 {
            return 100.0;
        }
        let cursor = self
            .state
            .as_ref()
            .map(|state| state.cursor.min(self.total_titles))
            .unwrap_or(0);
        (cursor as f64 / self.total_titles as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to read persisted data
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<CatalogStatistics> {
    let titles = storage.load_titles()?;
    let state = storage.load_state()?;
    let catalog = storage.load_catalog()?;

    let mut items_by_slot = BTreeMap::new();
    for entry in &catalog {
        *items_by_slot.entry(entry.slot).or_insert(0) += 1;
    }

    Ok(CatalogStatistics {
        total_titles: titles.as_ref().map(|t| t.len()).unwrap_or(0),
        titles_generated_at: titles.and_then(|t| t.generated_at),
        state,
        items_by_slot,
        total_items: catalog.len(),
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Phase: {}", stats.phase());
    println!("  Titles: {}", stats.total_titles);
    if let Some(generated) = stats.titles_generated_at {
        println!("  Titles generated: {}", generated.to_rfc3339());
    }
    println!("  Progress: {:.1}%", stats.progress());
    println!("  Catalog items: {}", stats.total_items);
    println!();

    if let Some(state) = &stats.state {
        println!("Last Run:");
        println!("  Cursor: {} (batch size {})", state.cursor, state.batch_size);
        match state.last_run {
            Some(at) => println!("  At: {}", at.to_rfc3339()),
            None => println!("  At: never"),
        }
        println!("  Processed: {}", state.last_processed);
        println!("  Added: {}", state.last_added);
        println!("  Skipped non-item: {}", state.last_skipped_non_item);
        println!("  Failed: {}", state.last_failed);
        println!();

        if !state.failed_titles.is_empty() {
            println!(
                "Failed Titles ({}), retry with --retry-failed:",
                state.failed_titles.len()
            );
            for title in &state.failed_titles {
                println!("  - {}", title);
            }
            println!();
        }
    }

    if !stats.items_by_slot.is_empty() {
        println!("Items by Slot:");
        for (slot, count) in &stats.items_by_slot {
            println!("  {}: {}", slot, count);
        }
    }
}
