use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, OutputConfig, SeedEntry, StorageBackend,
    UserAgentConfig, WikiConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted batch size
const MAX_BATCH_SIZE: usize = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_wiki_config(&config.wiki)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_classifier_config(&config.classifier)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates wiki location
fn validate_wiki_config(config: &WikiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if config.api_path.trim().is_empty() {
        return Err(ConfigError::Validation("api_path cannot be empty".to_string()));
    }

    if config.home_page.trim().is_empty() {
        return Err(ConfigError::Validation("home_page cannot be empty".to_string()));
    }

    if config.meta_namespaces.iter().any(|ns| ns.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "meta_namespaces cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(batch_size) = config.batch_size {
        if !(1..=MAX_BATCH_SIZE).contains(&batch_size) {
            return Err(ConfigError::Validation(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, batch_size
            )));
        }
    }

    if !(1..=300).contains(&config.timeout_secs) {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let required: Vec<(&str, &str)> = match config.backend {
        StorageBackend::Json => vec![
            ("titles_path", config.titles_path.as_str()),
            ("state_path", config.state_path.as_str()),
            ("catalog_path", config.catalog_path.as_str()),
        ],
        StorageBackend::Sqlite => vec![("database_path", config.database_path.as_str())],
    };

    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates classifier marker lists
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    validate_markers("creature_markers", &config.creature_markers)?;
    validate_markers("item_markers", &config.item_markers)?;
    Ok(())
}

fn validate_markers(name: &str, markers: &[String]) -> Result<(), ConfigError> {
    if markers.is_empty() {
        return Err(ConfigError::InvalidPattern(format!("{} cannot be empty", name)));
    }

    if markers.iter().any(|marker| marker.trim().is_empty()) {
        return Err(ConfigError::InvalidPattern(format!(
            "{} cannot contain blank entries",
            name
        )));
    }

    Ok(())
}

/// Validates seed entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "At least one [[seed]] is required".to_string(),
        ));
    }

    for (index, seed) in seeds.iter().enumerate() {
        match (&seed.page, &seed.category) {
            (Some(target), None) | (None, Some(target)) => {
                if target.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "Seed #{} ({}) has a blank target",
                        index + 1,
                        seed.slot
                    )));
                }
            }
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Seed #{} ({}) must name exactly one of 'page' or 'category'",
                    index + 1,
                    seed.slot
                )));
            }
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Basic email format check: must contain @ and have text on both sides
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
