//! Crawler module for wiki fetching and batch processing
//!
//! This module contains the core crawling logic, including:
//! - Fetch ports (`PageTextSource`, `LinkSource`) and their MediaWiki client
//! - HTML rendering and seed link extraction
//! - The resumable batch state machine
//! - Overall invocation coordination

mod coordinator;
mod fetcher;
mod machine;
mod parser;
mod source;

pub use coordinator::{Coordinator, RunOptions, RunPreview};
pub use fetcher::{build_http_client, WikiClient};
pub use machine::{BatchReport, CrawlStateMachine, TitleOutcome};
pub use parser::{extract_hrefs, render_text};
pub use source::{FetchError, LinkSource, PageTextSource};

use crate::config::Config;
use crate::output::RunSummary;
use crate::EqError;
use chrono::Utc;

/// Runs one invocation against the live wiki
///
/// This is the main entry point for a scheduled run. It will:
/// 1. Build the HTTP client (fetching robots.txt when enabled)
/// 2. Open storage
/// 3. Load or discover the title list
/// 4. Process one batch and commit catalog and state
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `options` - Fresh/retry flags
///
/// # Returns
///
/// * `Ok(RunSummary)` - The invocation completed, possibly with per-title failures
/// * `Err(EqError)` - Storage, client or discovery failure
pub async fn run_once(config: Config, options: RunOptions) -> Result<RunSummary, EqError> {
    let client = WikiClient::from_config(&config).await?;
    let mut coordinator = Coordinator::new(config)?;
    coordinator.raise_request_delay(client.crawl_delay());
    coordinator.run(&client, options, Utc::now()).await
}
