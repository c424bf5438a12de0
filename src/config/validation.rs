use crate::config::types::{BatchConfig, Config, PathsConfig, ResolverConfig, ToolsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_paths(&config.paths)?;
    validate_resolver(&config.resolver)?;
    validate_tools(&config.tools)?;
    validate_batch(&config.batch)?;

    if let Some(key) = config.removable_keys.iter().find(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "removable-keys cannot contain blank entries, got '{}'",
            key
        )));
    }

    Url::parse(&config.youtube.api_base).map_err(|e| {
        ConfigError::Validation(format!(
            "youtube.api-base '{}' is not a URL: {}",
            config.youtube.api_base, e
        ))
    })?;

    Ok(())
}

fn validate_paths(paths: &PathsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("references", &paths.references),
        ("transcripts", &paths.transcripts),
        ("logs", &paths.logs),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "paths.{} cannot be empty",
                name
            )));
        }
    }
    Ok(())
}

fn validate_resolver(config: &ResolverConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "resolver.timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "resolver.max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "resolver.user-agent cannot be empty".to_string(),
        ));
    }

    for pattern in &config.rate_limited_domains {
        validate_domain_pattern(pattern)?;
    }

    for trap in &config.homepage_traps {
        Url::parse(trap).map_err(|e| {
            ConfigError::Validation(format!("Invalid homepage trap '{}': {}", trap, e))
        })?;
    }

    Ok(())
}

fn validate_tools(config: &ToolsConfig) -> Result<(), ConfigError> {
    if config.page_dump.trim().is_empty() || config.downloader.trim().is_empty() {
        return Err(ConfigError::Validation(
            "tools.page-dump and tools.downloader cannot be empty".to_string(),
        ));
    }

    if config.tool_timeout_secs == 0 || config.transcript_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "tool timeouts must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_batch(config: &BatchConfig) -> Result<(), ConfigError> {
    // An hour between URLs is certainly a typo
    if config.delay_ms > 3_600_000 {
        return Err(ConfigError::Validation(format!(
            "batch.delay-ms must be <= 3600000, got {}",
            config.delay_ms
        )));
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'medium.com')",
            domain
        )));
    }

    Ok(())
}
