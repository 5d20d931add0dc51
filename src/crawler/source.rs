//! Ports between the crawl logic and the wiki
//!
//! The discoverer and the batch state machine only see these traits, so they
//! can be driven by the HTTP client in production and by in-memory fakes in
//! tests.

use async_trait::async_trait;
use thiserror::Error;

/// Failure to retrieve a page or a listing from the wiki
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Wiki API error for '{page}': {code}: {info}")]
    Api {
        page: String,
        code: String,
        info: String,
    },

    #[error("No rendered content for '{page}'")]
    MissingContent { page: String },

    #[error("Disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },
}

/// Rendered page text by page identifier
#[async_trait]
pub trait PageTextSource: Send + Sync {
    /// Returns the flattened visible text of a page
    async fn page_text(&self, page: &str) -> Result<String, FetchError>;
}

/// Link and category listings used by title discovery
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Raw href values of the links in a page's rendered body
    async fn page_links(&self, page: &str) -> Result<Vec<String>, FetchError>;

    /// Display titles of the main-namespace pages in a category
    async fn category_members(&self, category: &str) -> Result<Vec<String>, FetchError>;
}
