//! Catalog module
//!
//! Holds the typed item model and the append-only, source-keyed catalog that
//! accepted items are recorded into.

mod types;

pub use types::{
    deserialize_slot, AttributeRecord, CatalogEntry, Element, SlotHint, VocationTag,
};

use std::collections::HashSet;

/// Membership and append operations over the item catalog
///
/// Entries are unique by source for the lifetime of the crawl and are never
/// updated or removed once recorded.
pub trait CatalogStore {
    /// Returns true if an entry with this source is already catalogued
    fn contains(&self, source: &str) -> bool;

    /// Appends an entry unless its source is already present
    ///
    /// Returns true if the entry was added.
    fn append(&mut self, entry: CatalogEntry) -> bool;

    /// Number of catalogued entries
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory catalog loaded from and committed back to storage
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    sources: HashSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from persisted entries, preserving their order
    ///
    /// Duplicate sources in the input keep only the first occurrence.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        let total = entries.len();
        for entry in entries {
            catalog.append(entry);
        }
        if catalog.len() < total {
            tracing::warn!(
                "Dropped {} duplicate catalog entries while loading",
                total - catalog.len()
            );
        }
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

impl CatalogStore for Catalog {
    fn contains(&self, source: &str) -> bool {
        self.sources.contains(source.trim())
    }

    fn append(&mut self, entry: CatalogEntry) -> bool {
        if !self.sources.insert(entry.dedup_key().to_string()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
