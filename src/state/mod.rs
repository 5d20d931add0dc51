//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the resumable cursor and last-run counters persisted between invocations
//! - `CrawlPhase`: NotStarted / InProgress / Complete, derived from the cursor

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState, DEFAULT_BATCH_SIZE};
