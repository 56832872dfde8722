use crate::config::types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, OutputFormat, UserAgentConfig,
};
use crate::crawler::SelectorExtractor;
use crate::marketplace::{profile_for, MarketplaceProfile};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
pub const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    for profile in &config.marketplaces {
        validate_profile(profile)?;
    }

    let profile = profile_for(&config.crawler.marketplace, &config.marketplaces)?;
    validate_profile(&profile)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.search_term.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search_term cannot be empty".to_string(),
        ));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.last_page < config.start_page {
        return Err(ConfigError::Validation(format!(
            "last_page ({}) must be >= start_page ({})",
            config.last_page, config.start_page
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::Validation(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.format {
        OutputFormat::Json => {
            if config.directory.is_empty() {
                return Err(ConfigError::Validation(
                    "directory cannot be empty".to_string(),
                ));
            }
        }
        OutputFormat::Sqlite => {
            if config.database_path.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(
                    "database_path is required for sqlite output".to_string(),
                ));
            }
        }
    }

    Ok(())
}

/// Validates a marketplace profile: name, feed template and selectors
fn validate_profile(profile: &MarketplaceProfile) -> Result<(), ConfigError> {
    if profile.name.is_empty()
        || !profile
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "marketplace name must be non-empty and contain only [A-Za-z0-9_-], got '{}'",
            profile.name
        )));
    }

    let template = profile.feed_template();
    if !template.is_complete() {
        return Err(ConfigError::Validation(format!(
            "feed_url of '{}' must contain {{query}} and {{page}}, got '{}'",
            profile.name,
            template.as_str()
        )));
    }

    Url::parse(&template.build("sample", 1)).map_err(|e| {
        ConfigError::Validation(format!("Invalid feed_url of '{}': {}", profile.name, e))
    })?;

    SelectorExtractor::new(profile)?;

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
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
