//! Storage module for persisting crawl data
//!
//! This module handles everything that outlives one invocation:
//! - the discovered title list and its provenance
//! - the resumable crawl state
//! - the append-only item catalog
//!
//! Two interchangeable backends sit behind the [`Storage`] trait: plain JSON
//! files (the default, compatible with existing data files) and SQLite.

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::{OutputConfig, StorageBackend};
use std::path::Path;

/// Opens the backend selected in the output configuration
///
/// # Arguments
///
/// * `config` - The output configuration
///
/// # Returns
///
/// * `Ok(Box<dyn Storage>)` - Ready-to-use storage
/// * `Err(StorageError)` - Failed to open the database
pub fn open_storage(config: &OutputConfig) -> StorageResult<Box<dyn Storage>> {
    match config.backend {
        StorageBackend::Json => {
            tracing::debug!("Using JSON storage ({})", config.state_path);
            Ok(Box::new(JsonStorage::new(
                &config.titles_path,
                &config.state_path,
                &config.catalog_path,
            )))
        }
        StorageBackend::Sqlite => {
            tracing::debug!("Using SQLite storage ({})", config.database_path);
            Ok(Box::new(SqliteStorage::new(Path::new(
                &config.database_path,
            ))?))
        }
    }
}
