//! EQ Catalog: a resumable equipment catalog builder
//!
//! This crate crawls a MediaWiki-backed game wiki, discovers candidate item pages
//! from seed pages, separates genuine equipment pages from noise, extracts
//! elemental resistances and wear requirements from page prose, and persists
//! progress so a crawl can advance one bounded batch per invocation.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod extract;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

pub use crawler::FetchError;

/// Main error type for catalog operations
#[derive(Debug, Error)]
pub enum EqError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Title discovery failed at seed '{seed}': {source}")]
    Discovery { seed: String, source: FetchError },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid marker: {0}")]
    InvalidPattern(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, EqError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{AttributeRecord, Catalog, CatalogEntry, CatalogStore, Element, SlotHint, VocationTag};
pub use classify::{Classification, MarkerClassifier, PageClassifier};
pub use config::Config;
pub use discovery::{TitleDiscoverer, TitleList, TitleRecord};
pub use extract::AttributeExtractor;
pub use crawler::{Coordinator, RunOptions, WikiClient};
pub use output::RunSummary;
pub use state::{CrawlPhase, CrawlState};
