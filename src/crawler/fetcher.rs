//! MediaWiki API client
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - `action=parse` requests for rendered page bodies
//! - `list=categorymembers` queries with continuation
//! - Error classification into [`FetchError`]
//! - The optional robots.txt gate

use crate::config::{Config, UserAgentConfig};
use crate::crawler::parser::{extract_hrefs, render_text};
use crate::crawler::source::{FetchError, LinkSource, PageTextSource};
use crate::robots::{fetch_robots, ParsedRobots};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Members requested per categorymembers call
const CATEGORY_PAGE_LIMIT: u32 = 500;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```
/// use eq_catalog::config::UserAgentConfig;
/// use eq_catalog::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "TibiaSweden-EQOpt".to_string(),
///     crawler_version: "1.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: None,
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsePayload>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParsePayload {
    text: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    query: Option<CategoryQuery>,
    #[serde(rename = "continue")]
    continuation: Option<CategoryContinue>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    #[serde(default)]
    categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
struct CategoryMember {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryContinue {
    cmcontinue: Option<String>,
}

/// Client for one wiki's API endpoint
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: Client,
    api_url: String,
    user_agent: String,
    continue_delay: Duration,
    robots: Option<ParsedRobots>,
}

impl WikiClient {
    /// Builds a client from configuration
    ///
    /// robots.txt is fetched here, once, when `respect-robots` is enabled.
    pub async fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.user_agent, config.crawler.timeout())?;

        let robots = if config.crawler.respect_robots {
            Some(fetch_robots(&client, &config.wiki.base_url).await)
        } else {
            None
        };

        Ok(Self {
            client,
            api_url: config.wiki.api_url(),
            user_agent: config.user_agent.crawler_name.clone(),
            continue_delay: config.crawler.seed_delay(),
            robots,
        })
    }

    /// Builds a client around an existing HTTP client, without a robots gate
    pub fn new(client: Client, api_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            user_agent: user_agent.into(),
            continue_delay: Duration::ZERO,
            robots: None,
        }
    }

    /// Installs a parsed robots.txt
    pub fn with_robots(mut self, robots: ParsedRobots) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Crawl-delay requested by robots.txt, if the gate is active
    pub fn crawl_delay(&self) -> Option<Duration> {
        self.robots
            .as_ref()
            .and_then(|robots| robots.crawl_delay(&self.user_agent))
    }

    /// Fetches the rendered HTML body of a page
    pub async fn page_html(&self, page: &str) -> Result<String, FetchError> {
        let params = [
            ("action", "parse"),
            ("page", page),
            ("prop", "text"),
            ("format", "json"),
            ("origin", "*"),
        ];
        let response: ParseResponse = self.get_json(&params).await?;

        if let Some(error) = response.error {
            return Err(FetchError::Api {
                page: page.to_string(),
                code: error.code,
                info: error.info,
            });
        }

        response
            .parse
            .and_then(|parse| parse.text)
            .and_then(|mut text| text.remove("*"))
            .ok_or_else(|| FetchError::MissingContent {
                page: page.to_string(),
            })
    }

    /// Lists main-namespace page titles in a category, following continuation
    pub async fn list_category(&self, category: &str) -> Result<Vec<String>, FetchError> {
        let cmtitle = format!("Category:{}", category);
        let limit = CATEGORY_PAGE_LIMIT.to_string();
        let mut titles = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("action", "query"),
                ("list", "categorymembers"),
                ("cmtitle", cmtitle.as_str()),
                ("cmnamespace", "0"),
                ("cmtype", "page"),
                ("cmlimit", limit.as_str()),
                ("format", "json"),
            ];
            if let Some(token) = &continue_token {
                params.push(("cmcontinue", token.as_str()));
            }

            let response: CategoryResponse = self.get_json(&params).await?;
            if let Some(error) = response.error {
                return Err(FetchError::Api {
                    page: cmtitle,
                    code: error.code,
                    info: error.info,
                });
            }

            if let Some(query) = response.query {
                titles.extend(
                    query
                        .categorymembers
                        .into_iter()
                        .filter_map(|member| member.title),
                );
            }

            continue_token = response.continuation.and_then(|next| next.cmcontinue);
            if continue_token.is_none() {
                break;
            }

            tracing::debug!("Continuing {} after {} members", cmtitle, titles.len());
            if !self.continue_delay.is_zero() {
                tokio::time::sleep(self.continue_delay).await;
            }
        }

        Ok(titles)
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, FetchError> {
        let url = Url::parse_with_params(&self.api_url, params).map_err(|e| {
            FetchError::Api {
                page: self.api_url.clone(),
                code: "bad-url".to_string(),
                info: e.to_string(),
            }
        })?;
        let url_string = url.to_string();

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(&url_string, &self.user_agent) {
                return Err(FetchError::RobotsDenied { url: url_string });
            }
        }

        tracing::trace!("GET {}", url_string);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_string.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url_string,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_string,
                source,
            })
    }
}

#[async_trait]
impl PageTextSource for WikiClient {
    async fn page_text(&self, page: &str) -> Result<String, FetchError> {
        let html = self.page_html(page).await?;
        Ok(render_text(&html))
    }
}

#[async_trait]
impl LinkSource for WikiClient {
    async fn page_links(&self, page: &str) -> Result<Vec<String>, FetchError> {
        let html = self.page_html(page).await?;
        Ok(extract_hrefs(&html))
    }

    async fn category_members(&self, category: &str) -> Result<Vec<String>, FetchError> {
        self.list_category(category).await
    }
}
