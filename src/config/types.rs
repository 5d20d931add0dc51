use crate::catalog::SlotHint;
use crate::classify::{DEFAULT_CREATURE_MARKERS, DEFAULT_ITEM_MARKERS};
use crate::discovery::{Seed, DEFAULT_HOME_PAGE, DEFAULT_META_NAMESPACES};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the catalog builder
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wiki: WikiConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(rename = "seed", default)]
    pub seeds: Vec<SeedEntry>,
}

impl Config {
    /// Seeds in configured order
    pub fn discovery_seeds(&self) -> Vec<Seed> {
        self.seeds.iter().filter_map(SeedEntry::to_seed).collect()
    }
}

/// Wiki location and link filtering
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    /// Site root, e.g. `https://tibia.fandom.com`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the MediaWiki API endpoint relative to the site root
    #[serde(rename = "api-path", default = "default_api_path")]
    pub api_path: String,

    /// Landing page excluded from discovery
    #[serde(rename = "home-page", default = "default_home_page")]
    pub home_page: String,

    /// Title prefixes of administrative/meta namespaces
    #[serde(rename = "meta-namespaces", default = "default_meta_namespaces")]
    pub meta_namespaces: Vec<String>,
}

impl WikiConfig {
    pub fn api_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_path.trim_start_matches('/')
        )
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl UserAgentConfig {
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        match &self.contact_email {
            Some(email) => format!(
                "{}/{} (+{}; {})",
                self.crawler_name, self.crawler_version, self.contact_url, email
            ),
            None => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            ),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Titles per invocation; overrides the persisted batch size when set
    #[serde(rename = "batch-size", default)]
    pub batch_size: Option<usize>,

    /// Delay after every page fetch (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_delay_ms")]
    pub request_delay_ms: u64,

    /// Delay between seed fetches during discovery (milliseconds)
    #[serde(rename = "seed-delay-ms", default = "default_delay_ms")]
    pub seed_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Honour robots.txt disallow rules and Crawl-delay
    #[serde(rename = "respect-robots", default)]
    pub respect_robots: bool,
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn seed_delay(&self) -> Duration {
        Duration::from_millis(self.seed_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: None,
            request_delay_ms: default_delay_ms(),
            seed_delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            respect_robots: false,
        }
    }
}

/// Persistence backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the persisted title list (json backend)
    #[serde(rename = "titles-path", default = "default_titles_path")]
    pub titles_path: String,

    /// Path to the persisted crawl state (json backend)
    #[serde(rename = "state-path", default = "default_state_path")]
    pub state_path: String,

    /// Path to the persisted catalog (json backend)
    #[serde(rename = "catalog-path", default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path to the SQLite database file (sqlite backend)
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            titles_path: default_titles_path(),
            state_path: default_state_path(),
            catalog_path: default_catalog_path(),
            database_path: default_database_path(),
            summary_path: default_summary_path(),
        }
    }
}

/// Marker lists for the page classifier
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(rename = "creature-markers", default = "default_creature_markers")]
    pub creature_markers: Vec<String>,

    #[serde(rename = "item-markers", default = "default_item_markers")]
    pub item_markers: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            creature_markers: default_creature_markers(),
            item_markers: default_item_markers(),
        }
    }
}

/// One `[[seed]]` table
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    pub slot: SlotHint,

    /// Page whose rendered links are harvested
    #[serde(default)]
    pub page: Option<String>,

    /// Category whose members are listed
    #[serde(default)]
    pub category: Option<String>,
}

impl SeedEntry {
    /// None unless exactly one of `page`/`category` is set
    pub fn to_seed(&self) -> Option<Seed> {
        match (&self.page, &self.category) {
            (Some(page), None) => Some(Seed::page(self.slot, page.trim())),
            (None, Some(category)) => {
                let name = category.trim();
                let name = name.strip_prefix("Category:").unwrap_or(name);
                Some(Seed::category(self.slot, name))
            }
            _ => None,
        }
    }
}

fn default_api_path() -> String {
    "/api.php".to_string()
}

fn default_home_page() -> String {
    DEFAULT_HOME_PAGE.to_string()
}

fn default_meta_namespaces() -> Vec<String> {
    DEFAULT_META_NAMESPACES.iter().map(|s| s.to_string()).collect()
}

fn default_delay_ms() -> u64 {
    250
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_titles_path() -> String {
    "data/eq_titles.json".to_string()
}

fn default_state_path() -> String {
    "data/eq_state.json".to_string()
}

fn default_catalog_path() -> String {
    "data/eq_items.json".to_string()
}

fn default_database_path() -> String {
    "data/eq_catalog.db".to_string()
}

fn default_summary_path() -> String {
    "data/eq_summary.md".to_string()
}

fn default_creature_markers() -> Vec<String> {
    DEFAULT_CREATURE_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_item_markers() -> Vec<String> {
    DEFAULT_ITEM_MARKERS.iter().map(|s| s.to_string()).collect()
}
