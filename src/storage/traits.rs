//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::catalog::CatalogEntry;
use crate::discovery::TitleList;
use crate::state::CrawlState;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to move file into place: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Absent data is `None`/empty, never an error. `commit` is the only write
/// made during a batch run and must leave the catalog at least as new as the
/// state.
pub trait Storage {
    // ===== Title List =====

    /// Loads the persisted title list
    fn load_titles(&self) -> StorageResult<Option<TitleList>>;

    /// Replaces the persisted title list
    fn save_titles(&mut self, titles: &TitleList) -> StorageResult<()>;

    // ===== Crawl Progress =====

    /// Loads the crawl state
    fn load_state(&self) -> StorageResult<Option<CrawlState>>;

    /// Loads the catalog in stored order
    fn load_catalog(&self) -> StorageResult<Vec<CatalogEntry>>;

    /// Persists catalog and state at the end of an invocation
    fn commit(&mut self, catalog: &[CatalogEntry], state: &CrawlState) -> StorageResult<()>;
}
