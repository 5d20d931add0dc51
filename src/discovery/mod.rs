//! Title discovery
//!
//! Harvests candidate item titles from seed pages once, before any batch runs.
//! The resulting list is sorted and persisted, and treated as immutable input
//! by every later invocation.

mod links;

pub use links::{to_page_id, LinkFilter, DEFAULT_HOME_PAGE, DEFAULT_META_NAMESPACES};

use crate::catalog::{deserialize_slot, SlotHint};
use crate::crawler::LinkSource;
use crate::EqError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// A candidate page title and the slot its seed implies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Exact wiki page identifier
    pub title: String,

    #[serde(default, deserialize_with = "deserialize_slot")]
    pub slot: SlotHint,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>, slot: SlotHint) -> Self {
        Self {
            title: title.into(),
            slot,
        }
    }
}

/// The persisted, ordered title list plus provenance metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleList {
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    /// Host the titles were harvested from
    #[serde(default)]
    pub source: Option<String>,

    /// Fingerprint of the seed list that produced these titles
    #[serde(default)]
    pub seeds_hash: Option<String>,

    #[serde(default)]
    pub count: usize,

    /// Titles per slot
    #[serde(default)]
    pub slots: BTreeMap<String, usize>,

    pub items: Vec<TitleRecord>,
}

impl TitleList {
    /// Wraps discovered titles with metadata
    pub fn new(
        items: Vec<TitleRecord>,
        source: Option<String>,
        seeds_hash: Option<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut slots = BTreeMap::new();
        for record in &items {
            *slots.entry(record.slot.to_string()).or_insert(0) += 1;
        }

        Self {
            generated_at: Some(generated_at),
            source,
            seeds_hash,
            count: items.len(),
            slots,
            items,
        }
    }

    /// A list read from a bare `[{title, slot}]` array carries no metadata
    pub fn from_records(items: Vec<TitleRecord>) -> Self {
        Self {
            generated_at: None,
            source: None,
            seeds_hash: None,
            count: items.len(),
            slots: BTreeMap::new(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slot recorded for a title, if it is in the list
    pub fn slot_of(&self, title: &str) -> Option<SlotHint> {
        self.items
            .iter()
            .find(|record| record.title == title)
            .map(|record| record.slot)
    }
}

/// Where a seed's candidate titles come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedTarget {
    /// Outgoing links of a rendered page
    Page(String),
    /// Members of a wiki category
    Category(String),
}

/// One discovery seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub slot: SlotHint,
    pub target: SeedTarget,
}

impl Seed {
    pub fn page(slot: SlotHint, page: impl Into<String>) -> Self {
        Self {
            slot,
            target: SeedTarget::Page(page.into()),
        }
    }

    pub fn category(slot: SlotHint, category: impl Into<String>) -> Self {
        Self {
            slot,
            target: SeedTarget::Category(category.into()),
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SeedTarget::Page(page) => write!(f, "{}:{}", self.slot, page),
            SeedTarget::Category(category) => write!(f, "{}:Category:{}", self.slot, category),
        }
    }
}

/// Computes a SHA-256 fingerprint of a seed list
///
/// Used to notice that the configured seeds no longer match the persisted
/// title list.
pub fn seeds_fingerprint(seeds: &[Seed]) -> String {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Builds the title list from seeds
#[derive(Debug, Clone)]
pub struct TitleDiscoverer {
    filter: LinkFilter,
    seed_delay: Duration,
}

impl TitleDiscoverer {
    pub fn new(filter: LinkFilter, seed_delay: Duration) -> Self {
        Self { filter, seed_delay }
    }

    /// Fetches every seed once and merges the candidates
    ///
    /// # Merge policy
    ///
    /// The first seed to reach a title assigns its slot. Later seeds, including
    /// unknown-slot set pages, never overwrite it.
    ///
    /// # Errors
    ///
    /// Any seed fetch failure aborts discovery; partial lists are never returned.
    pub async fn discover(
        &self,
        seeds: &[Seed],
        source: &dyn LinkSource,
    ) -> Result<Vec<TitleRecord>, EqError> {
        let mut titles: BTreeMap<String, SlotHint> = BTreeMap::new();

        for (index, seed) in seeds.iter().enumerate() {
            if index > 0 && !self.seed_delay.is_zero() {
                tokio::time::sleep(self.seed_delay).await;
            }

            tracing::info!("Harvesting seed {}", seed);
            let candidates: Vec<String> = match &seed.target {
                SeedTarget::Page(page) => source.page_links(page).await.map(|hrefs| {
                    hrefs
                        .iter()
                        .filter_map(|href| self.filter.title_from_href(href))
                        .collect()
                }),
                SeedTarget::Category(category) => {
                    source.category_members(category).await.map(|members| {
                        members
                            .iter()
                            .filter_map(|member| self.filter.title_from_member(member))
                            .collect()
                    })
                }
            }
            .map_err(|source| EqError::Discovery {
                seed: seed.to_string(),
                source,
            })?;

            let mut added = 0usize;
            for title in candidates {
                if let Entry::Vacant(vacant) = titles.entry(title) {
                    vacant.insert(seed.slot);
                    added += 1;
                }
            }
            tracing::debug!("Seed {} contributed {} new titles", seed, added);
        }

        tracing::info!("Discovered {} candidate titles", titles.len());

        Ok(titles
            .into_iter()
            .map(|(title, slot)| TitleRecord { title, slot })
            .collect())
    }
}
