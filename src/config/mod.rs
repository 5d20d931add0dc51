//! Configuration module for the catalog builder
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use eq_catalog::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("eq-catalog.toml")).unwrap();
//! println!("Crawling {}", config.wiki.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, OutputConfig, SeedEntry, StorageBackend,
    UserAgentConfig, WikiConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
