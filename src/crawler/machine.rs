//! Resumable batch state machine
//!
//! One call to [`CrawlStateMachine::advance_one_batch`] processes the next
//! window of the title list and returns the successor state. Nothing is
//! persisted here; the caller commits catalog and state together.

use crate::catalog::{CatalogEntry, CatalogStore, SlotHint};
use crate::classify::PageClassifier;
use crate::crawler::source::PageTextSource;
use crate::discovery::TitleRecord;
use crate::extract::AttributeExtractor;
use crate::state::{CrawlPhase, CrawlState};
use crate::url::{display_name, page_url};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// What happened to one title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleOutcome {
    FetchFailed,
    /// Classified `NonItem` or `Ambiguous`
    NonItem,
    /// Item page without any resistance
    NoResistances,
    /// Already catalogued under the same source
    Duplicate,
    Added,
}

/// Counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub window_start: usize,
    pub window_end: usize,
    pub processed: usize,
    pub added: usize,
    pub skipped_non_item: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: TitleOutcome) {
        match outcome {
            TitleOutcome::FetchFailed => self.failed += 1,
            TitleOutcome::NonItem => {
                self.processed += 1;
                self.skipped_non_item += 1;
            }
            TitleOutcome::NoResistances | TitleOutcome::Duplicate => self.processed += 1,
            TitleOutcome::Added => {
                self.processed += 1;
                self.added += 1;
            }
        }
    }
}

/// Drives fetch, classify, extract and record over a title window
pub struct CrawlStateMachine<'a> {
    source: &'a dyn PageTextSource,
    classifier: &'a dyn PageClassifier,
    extractor: AttributeExtractor,
    base_url: String,
    request_delay: Duration,
}

impl<'a> CrawlStateMachine<'a> {
    pub fn new(
        source: &'a dyn PageTextSource,
        classifier: &'a dyn PageClassifier,
        base_url: impl Into<String>,
        request_delay: Duration,
    ) -> Self {
        Self {
            source,
            classifier,
            extractor: AttributeExtractor::new(),
            base_url: base_url.into(),
            request_delay,
        }
    }

    /// Processes the next window and returns the successor state
    ///
    /// # Cursor
    ///
    /// The cursor always moves to the end of the window, whatever happened to
    /// the titles inside it, and never past `titles.len()`. A cursor already
    /// past the end (title list rebuilt shorter) is clamped.
    ///
    /// # Completion
    ///
    /// Once the crawl is complete the call is a no-op that only refreshes
    /// `last_run`.
    pub async fn advance_one_batch<C: CatalogStore + ?Sized>(
        &self,
        state: &CrawlState,
        titles: &[TitleRecord],
        catalog: &mut C,
        now: DateTime<Utc>,
    ) -> (CrawlState, BatchReport) {
        let mut next = state.clone();
        let total = titles.len();

        if next.cursor > total {
            tracing::warn!(
                "Cursor {} is past the end of the title list ({}); clamping",
                next.cursor,
                total
            );
            next.cursor = total;
        }

        if next.phase(total) == CrawlPhase::Complete {
            tracing::info!("Crawl complete ({} titles); nothing to do", total);
            next.last_run = Some(now);
            let report = BatchReport {
                window_start: total,
                window_end: total,
                ..BatchReport::default()
            };
            return (next, report);
        }

        let window = next.window(total);
        tracing::info!(
            "Processing titles {}..{} of {} (batch size {})",
            window.start,
            window.end,
            total,
            next.batch_size
        );

        let mut report = BatchReport {
            window_start: window.start,
            window_end: window.end,
            ..BatchReport::default()
        };

        for record in &titles[window.clone()] {
            let outcome = self.process_title(&record.title, record.slot, catalog).await;
            if outcome == TitleOutcome::FetchFailed {
                next.record_failure(&record.title);
            }
            report.record(outcome);
        }

        next.cursor = window.end;
        self.finish_run(&mut next, &report, total, catalog.len(), now);

        (next, report)
    }

    /// Re-runs the pipeline over the failed-title ledger
    ///
    /// Titles that fetch successfully leave the ledger whatever their
    /// classification; the rest stay. The cursor is untouched.
    pub async fn retry_failed<C: CatalogStore + ?Sized>(
        &self,
        state: &CrawlState,
        titles: &[TitleRecord],
        catalog: &mut C,
        now: DateTime<Utc>,
    ) -> (CrawlState, BatchReport) {
        let mut next = state.clone();
        let pending = std::mem::take(&mut next.failed_titles);
        tracing::info!("Retrying {} previously failed titles", pending.len());

        let mut report = BatchReport {
            window_start: next.cursor,
            window_end: next.cursor,
            ..BatchReport::default()
        };

        for title in &pending {
            let slot = titles
                .iter()
                .find(|record| &record.title == title)
                .map(|record| record.slot)
                .unwrap_or_default();

            let outcome = self.process_title(title, slot, catalog).await;
            if outcome == TitleOutcome::FetchFailed {
                next.record_failure(title);
            }
            report.record(outcome);
        }

        self.finish_run(&mut next, &report, titles.len(), catalog.len(), now);
        (next, report)
    }

    /// Fetch, classify, extract and record one title
    async fn process_title<C: CatalogStore + ?Sized>(
        &self,
        title: &str,
        slot: SlotHint,
        catalog: &mut C,
    ) -> TitleOutcome {
        let fetched = self.source.page_text(title).await;
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let text = match fetched {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", title, e);
                return TitleOutcome::FetchFailed;
            }
        };

        let classification = self.classifier.classify(&text);
        if !classification.is_item() {
            tracing::debug!("{}: {:?}, skipped", title, classification);
            return TitleOutcome::NonItem;
        }

        let record = self.extractor.extract(&text);
        if !record.is_catalog_worthy() {
            tracing::debug!("{}: item without resistances", title);
            return TitleOutcome::NoResistances;
        }

        let source = page_url(&self.base_url, title);
        if catalog.contains(&source) {
            tracing::debug!("{}: already catalogued", title);
            return TitleOutcome::Duplicate;
        }

        let entry = CatalogEntry::new(display_name(title), slot, source, record);
        if catalog.append(entry) {
            tracing::debug!("{}: added", title);
            TitleOutcome::Added
        } else {
            TitleOutcome::Duplicate
        }
    }

    fn finish_run(
        &self,
        state: &mut CrawlState,
        report: &BatchReport,
        total_titles: usize,
        total_items: usize,
        now: DateTime<Utc>,
    ) {
        state.last_run = Some(now);
        state.last_added = report.added;
        state.last_processed = report.processed;
        state.last_skipped_non_item = report.skipped_non_item;
        state.last_failed = report.failed;
        state.total_titles = total_titles;
        state.total_items = total_items;
    }
}
