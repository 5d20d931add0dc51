//! Crawler coordinator - one invocation of the catalog builder
//!
//! This module ties the pieces of a run together:
//! - Loading or discovering the title list
//! - Loading or initializing the crawl state
//! - Advancing the state machine by one batch (or retrying failures)
//! - Committing catalog and state in a single write

use crate::catalog::Catalog;
use crate::classify::MarkerClassifier;
use crate::config::Config;
use crate::crawler::machine::CrawlStateMachine;
use crate::crawler::source::{LinkSource, PageTextSource};
use crate::discovery::{seeds_fingerprint, LinkFilter, TitleDiscoverer, TitleList};
use crate::output::RunSummary;
use crate::state::{CrawlPhase, CrawlState, DEFAULT_BATCH_SIZE};
use crate::storage::{open_storage, Storage};
use crate::url::host_of;
use crate::EqError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::ops::Range;
use std::time::Duration;

/// Flags that change what one invocation does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Rebuild the title list and reset the cursor
    pub fresh: bool,
    /// Process the failed-title ledger instead of the next window
    pub retry_failed: bool,
}

/// What the next invocation would do, computed without network access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPreview {
    /// Persisted title count; `None` when discovery will run first
    pub titles: Option<usize>,
    pub seeds: usize,
    pub cursor: usize,
    pub batch_size: usize,
    pub window: Range<usize>,
    pub failed_titles: usize,
    pub retry_failed: bool,
}

impl RunPreview {
    pub fn phase(&self) -> Option<CrawlPhase> {
        let total = self.titles?;
        Some(if self.cursor >= total {
            CrawlPhase::Complete
        } else if self.cursor == 0 {
            CrawlPhase::NotStarted
        } else {
            CrawlPhase::InProgress
        })
    }
}

impl fmt::Display for RunPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = match self.titles {
            Some(total) => total,
            None => {
                return write!(
                    f,
                    "Title list will be discovered from {} seeds; first batch covers up to {} titles",
                    self.seeds, self.batch_size
                )
            }
        };

        if self.retry_failed {
            return write!(
                f,
                "Would retry {} failed titles; cursor stays at {} of {}",
                self.failed_titles, self.cursor, total
            );
        }

        if self.phase() == Some(CrawlPhase::Complete) {
            write!(f, "Crawl complete ({} titles); next run is a no-op", total)
        } else {
            write!(
                f,
                "Next window: titles {}..{} of {} (batch size {})",
                self.window.start, self.window.end, total, self.batch_size
            )
        }
    }
}

/// Runs one invocation against persisted storage
pub struct Coordinator {
    config: Config,
    storage: Box<dyn Storage>,
    request_delay: Duration,
}

impl Coordinator {
    /// Creates a coordinator using the configured storage backend
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage opened
    /// * `Err(EqError)` - The database could not be opened
    pub fn new(config: Config) -> Result<Self, EqError> {
        let storage = open_storage(&config.output)?;
        Ok(Self::with_storage(config, storage))
    }

    /// Creates a coordinator over an already opened backend
    pub fn with_storage(config: Config, storage: Box<dyn Storage>) -> Self {
        let request_delay = config.crawler.request_delay();
        Self {
            config,
            storage,
            request_delay,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    /// Applies a robots.txt `Crawl-delay` when it is slower than the configured delay
    pub fn raise_request_delay(&mut self, crawl_delay: Option<Duration>) {
        if let Some(delay) = crawl_delay {
            if delay > self.request_delay {
                tracing::info!(
                    "robots.txt Crawl-delay raises request delay to {:?}",
                    delay
                );
                self.request_delay = delay;
            }
        }
    }

    /// Returns the persisted title list, discovering it first when needed
    ///
    /// Discovery runs when no list is stored, when the stored list is empty,
    /// or when `fresh` is set. A stored list is never modified otherwise,
    /// even if the configured seeds changed since it was built.
    ///
    /// With `fresh`, persisted progress is reset before the new list is
    /// saved, so an interrupted run never pairs the new list with an old cursor.
    pub async fn ensure_titles(
        &mut self,
        source: &dyn LinkSource,
        fresh: bool,
        now: DateTime<Utc>,
    ) -> Result<TitleList, EqError> {
        let seeds = self.config.discovery_seeds();
        let fingerprint = seeds_fingerprint(&seeds);

        if !fresh {
            if let Some(titles) = self.storage.load_titles()? {
                if !titles.is_empty() {
                    if titles
                        .seeds_hash
                        .as_deref()
                        .is_some_and(|stored| stored != fingerprint)
                    {
                        tracing::warn!(
                            "Configured seeds changed since the title list was built; run with --fresh to rediscover"
                        );
                    }
                    tracing::info!("Loaded {} titles", titles.len());
                    return Ok(titles);
                }
            }
        }

        tracing::info!("Discovering titles from {} seeds", seeds.len());
        let filter = LinkFilter::new(
            self.config.wiki.home_page.clone(),
            self.config.wiki.meta_namespaces.clone(),
        );
        let discoverer = TitleDiscoverer::new(filter, self.config.crawler.seed_delay());
        let records = discoverer.discover(&seeds, source).await?;

        let titles = TitleList::new(
            records,
            host_of(&self.config.wiki.base_url),
            Some(fingerprint),
            now,
        );
        if fresh {
            self.reset_persisted_progress()?;
        }
        self.storage.save_titles(&titles)?;
        tracing::info!("Saved title list with {} titles", titles.len());

        Ok(titles)
    }

    /// Runs one invocation: titles, one batch, commit
    ///
    /// Per-title fetch failures are absorbed into the summary and the
    /// failed-title ledger; only discovery, storage and classifier setup
    /// errors are returned.
    pub async fn run<S>(
        &mut self,
        source: &S,
        options: RunOptions,
        now: DateTime<Utc>,
    ) -> Result<RunSummary, EqError>
    where
        S: PageTextSource + LinkSource,
    {
        let titles = self.ensure_titles(source, options.fresh, now).await?;

        let state = self.load_or_create_state(now)?;
        let mut catalog = Catalog::from_entries(self.storage.load_catalog()?);
        tracing::debug!("Loaded {} catalog entries", catalog.entries().len());

        let classifier = MarkerClassifier::new(
            self.config.classifier.creature_markers.as_slice(),
            self.config.classifier.item_markers.as_slice(),
        )?;
        let machine = CrawlStateMachine::new(
            source,
            &classifier,
            self.config.wiki.base_url.clone(),
            self.request_delay,
        );

        let (next, report) = if options.retry_failed {
            if state.failed_titles.is_empty() {
                tracing::info!("No failed titles to retry");
            }
            machine
                .retry_failed(&state, &titles.items, &mut catalog, now)
                .await
        } else {
            machine
                .advance_one_batch(&state, &titles.items, &mut catalog, now)
                .await
        };

        self.storage.commit(catalog.entries(), &next)?;
        tracing::info!(
            "Committed {} catalog entries; next index {}",
            next.total_items,
            next.cursor
        );

        Ok(RunSummary::from_run(&next, &report))
    }

    /// Describes the next invocation from persisted data only
    pub fn preview(&self, options: RunOptions) -> Result<RunPreview, EqError> {
        let now = Utc::now();
        let titles = if options.fresh {
            None
        } else {
            self.storage
                .load_titles()?
                .filter(|titles| !titles.is_empty())
                .map(|titles| titles.len())
        };

        let mut state = self.load_or_create_state(now)?;
        if options.fresh {
            state.reset_progress();
        }

        let window = match titles {
            Some(total) => state.window(total),
            None => 0..0,
        };

        Ok(RunPreview {
            titles,
            seeds: self.config.discovery_seeds().len(),
            cursor: state.cursor,
            batch_size: state.batch_size,
            window,
            failed_titles: state.failed_titles.len(),
            retry_failed: options.retry_failed,
        })
    }

    /// Rewinds the stored cursor and clears the failed-title ledger
    fn reset_persisted_progress(&mut self) -> Result<(), EqError> {
        let Some(mut state) = self.storage.load_state()? else {
            return Ok(());
        };
        tracing::info!("Fresh run: resetting cursor and failed-title ledger");
        state.reset_progress();

        let catalog = self.storage.load_catalog()?;
        self.storage.commit(&catalog, &state)?;
        Ok(())
    }

    /// Persisted state, or a fresh one; a configured batch size always wins
    fn load_or_create_state(&self, now: DateTime<Utc>) -> Result<CrawlState, EqError> {
        let configured = self.config.crawler.batch_size;

        let mut state = match self.storage.load_state()? {
            Some(state) => state,
            None => {
                tracing::info!("No crawl state found; starting at the first title");
                CrawlState::new(configured.unwrap_or(DEFAULT_BATCH_SIZE), now)
            }
        };

        if let Some(batch_size) = configured {
            if batch_size != state.batch_size {
                tracing::info!(
                    "Batch size {} from config overrides persisted {}",
                    batch_size,
                    state.batch_size
                );
                state.batch_size = batch_size.max(1);
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SlotHint;
    use crate::config::parse_config;
    use crate::crawler::FetchError;
    use crate::storage::JsonStorage;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[wiki]
base-url = "https://tibia.fandom.com"

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[crawler]
batch-size = 2
request-delay-ms = 0
seed-delay-ms = 0

[[seed]]
slot = "helmet"
page = "Helmets"

[[seed]]
slot = "armor"
category = "Armors"
"#;

    /// Serves seed links, category members and page text from maps
    #[derive(Default)]
    struct FakeWiki {
        links: HashMap<String, Vec<String>>,
        members: HashMap<String, Vec<String>>,
        pages: HashMap<String, Option<String>>,
    }

    impl FakeWiki {
        fn scenario() -> Self {
            let mut wiki = Self::default();
            wiki.links.insert(
                "Helmets".to_string(),
                vec![
                    "/wiki/Item_A".to_string(),
                    "/wiki/Creature_B".to_string(),
                    "/wiki/Category:Helmets".to_string(),
                ],
            );
            wiki.members
                .insert("Armors".to_string(), vec!["Item C".to_string()]);
            wiki.pages.insert(
                "Item_A".to_string(),
                Some("You see item A. It weighs 10 oz. protection fire 5%.".to_string()),
            );
            wiki.pages.insert(
                "Creature_B".to_string(),
                Some(
                    "Creature B. Hitpoints 500. Experience Points 200. It has protection from holy 10%."
                        .to_string(),
                ),
            );
            wiki.pages.insert(
                "Item_C".to_string(),
                Some("You see item C. It weighs 5 oz. Imbuements: Empty Slot.".to_string()),
            );
            wiki
        }
    }

    #[async_trait]
    impl PageTextSource for FakeWiki {
        async fn page_text(&self, page: &str) -> Result<String, FetchError> {
            match self.pages.get(page) {
                Some(Some(text)) => Ok(text.clone()),
                _ => Err(FetchError::Http {
                    url: page.to_string(),
                    status: 503,
                }),
            }
        }
    }

    #[async_trait]
    impl LinkSource for FakeWiki {
        async fn page_links(&self, page: &str) -> Result<Vec<String>, FetchError> {
            self.links
                .get(page)
                .cloned()
                .ok_or_else(|| FetchError::MissingContent {
                    page: page.to_string(),
                })
        }

        async fn category_members(&self, category: &str) -> Result<Vec<String>, FetchError> {
            Ok(self.members.get(category).cloned().unwrap_or_default())
        }
    }

    fn coordinator(dir: &TempDir) -> Coordinator {
        let config = parse_config(CONFIG).unwrap();
        Coordinator::with_storage(config, Box::new(JsonStorage::in_dir(dir.path())))
    }

    #[tokio::test]
    async fn test_first_run_discovers_and_processes_one_batch() {
        let dir = TempDir::new().unwrap();
        let wiki = FakeWiki::scenario();
        let mut coordinator = coordinator(&dir);

        let summary = coordinator
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();

        // Titles are sorted: Creature_B, Item_A, Item_C
        assert_eq!(summary.titles, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped_non_item, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.items, 1);
        assert_eq!(summary.next_index, 2);

        let titles = coordinator.storage().load_titles().unwrap().unwrap();
        assert_eq!(titles.slot_of("Item_C"), Some(SlotHint::Armor));
        assert_eq!(titles.source.as_deref(), Some("tibia.fandom.com"));
        assert!(titles.seeds_hash.is_some());
    }

    #[tokio::test]
    async fn test_resumes_across_coordinators() {
        let dir = TempDir::new().unwrap();
        let wiki = FakeWiki::scenario();

        coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        let second = coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();

        assert_eq!(second.processed, 1);
        assert_eq!(second.added, 0);
        assert_eq!(second.items, 1);
        assert_eq!(second.next_index, 3);

        let third = coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(third.processed, 0);
        assert_eq!(third.next_index, 3);
        assert_eq!(third.items, 1);
    }

    #[tokio::test]
    async fn test_stored_titles_are_not_rediscovered() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        coordinator
            .ensure_titles(&FakeWiki::scenario(), false, Utc::now())
            .await
            .unwrap();

        // Seed pages are gone; a stored list must not trigger discovery
        let titles = coordinator
            .ensure_titles(&FakeWiki::default(), false, Utc::now())
            .await
            .unwrap();
        assert_eq!(titles.len(), 3);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_fatal_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        let result = coordinator
            .run(&FakeWiki::default(), RunOptions::default(), Utc::now())
            .await;

        assert!(matches!(result, Err(EqError::Discovery { .. })));
        assert!(coordinator.storage().load_titles().unwrap().is_none());
        assert!(coordinator.storage().load_state().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fresh_resets_cursor_but_keeps_catalog() {
        let dir = TempDir::new().unwrap();
        let wiki = FakeWiki::scenario();

        coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();

        let options = RunOptions {
            fresh: true,
            ..RunOptions::default()
        };
        let summary = coordinator(&dir)
            .run(&wiki, options, Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.next_index, 2);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.items, 1);
    }

    #[tokio::test]
    async fn test_interrupted_fresh_discovery_does_not_skip_titles() {
        let dir = TempDir::new().unwrap();
        let wiki = FakeWiki::scenario();

        coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        let done = coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(done.next_index, 3);

        // New titles sort before the old cursor
        let mut grown = FakeWiki::scenario();
        grown.links.get_mut("Helmets").unwrap().extend([
            "/wiki/Amulet_A0".to_string(),
            "/wiki/Amulet_A1".to_string(),
        ]);
        grown.pages.insert(
            "Amulet_A0".to_string(),
            Some("You see amulet A0. protection death 4%.".to_string()),
        );
        grown.pages.insert(
            "Amulet_A1".to_string(),
            Some("You see amulet A1. protection earth 6%.".to_string()),
        );

        // Discovery alone, as if the process died before the batch commit
        let titles = coordinator(&dir)
            .ensure_titles(&grown, true, Utc::now())
            .await
            .unwrap();
        assert_eq!(titles.len(), 5);

        let state = coordinator(&dir).storage().load_state().unwrap().unwrap();
        assert_eq!(state.cursor, 0);

        let resumed = coordinator(&dir)
            .run(&grown, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(resumed.titles, 5);
        assert_eq!(resumed.processed, 2);
        assert_eq!(resumed.added, 2);
        assert_eq!(resumed.items, 3);
        assert_eq!(resumed.next_index, 2);
    }

    #[tokio::test]
    async fn test_retry_failed_keeps_cursor() {
        let dir = TempDir::new().unwrap();
        let mut wiki = FakeWiki::scenario();
        wiki.pages.insert("Item_A".to_string(), None);

        let first = coordinator(&dir)
            .run(&wiki, RunOptions::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(first.failed, 1);
        assert_eq!(first.next_index, 2);

        let wiki = FakeWiki::scenario();
        let options = RunOptions {
            retry_failed: true,
            ..RunOptions::default()
        };
        let retry = coordinator(&dir)
            .run(&wiki, options, Utc::now())
            .await
            .unwrap();

        assert_eq!(retry.added, 1);
        assert_eq!(retry.failed, 0);
        assert_eq!(retry.next_index, 2);

        let state = coordinator(&dir).storage().load_state().unwrap().unwrap();
        assert!(state.failed_titles.is_empty());
    }

    #[tokio::test]
    async fn test_preview() {
        let dir = TempDir::new().unwrap();
        let coordinator_before = coordinator(&dir);

        let preview = coordinator_before.preview(RunOptions::default()).unwrap();
        assert_eq!(preview.titles, None);
        assert_eq!(preview.seeds, 2);
        assert!(preview.to_string().starts_with("Title list will be discovered"));

        coordinator(&dir)
            .run(&FakeWiki::scenario(), RunOptions::default(), Utc::now())
            .await
            .unwrap();

        let preview = coordinator(&dir).preview(RunOptions::default()).unwrap();
        assert_eq!(preview.titles, Some(3));
        assert_eq!(preview.window, 2..3);
        assert_eq!(preview.phase(), Some(CrawlPhase::InProgress));
        assert_eq!(
            preview.to_string(),
            "Next window: titles 2..3 of 3 (batch size 2)"
        );
    }

    #[test]
    fn test_raise_request_delay_only_increases() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir);

        coordinator.raise_request_delay(None);
        assert_eq!(coordinator.request_delay(), Duration::ZERO);

        coordinator.raise_request_delay(Some(Duration::from_secs(2)));
        assert_eq!(coordinator.request_delay(), Duration::from_secs(2));

        coordinator.raise_request_delay(Some(Duration::from_secs(1)));
        assert_eq!(coordinator.request_delay(), Duration::from_secs(2));
    }
}
