use crate::config::types::{Config, OutputConfig, ScrapeConfig, SiteAlias};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scrape_config(&config.scrape)?;
    validate_output_config(&config.output)?;
    validate_aliases(&config.aliases)?;
    Ok(())
}

/// Validates scrape configuration
fn validate_scrape_config(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.post_limit < 1 || config.post_limit > 1_000 {
        return Err(ConfigError::Validation(format!(
            "post_limit must be between 1 and 1000, got {}",
            config.post_limit
        )));
    }

    if !config.delay_between_requests.is_finite()
        || config.delay_between_requests < 0.0
        || config.delay_between_requests > 600.0
    {
        return Err(ConfigError::Validation(format!(
            "delay_between_requests must be between 0 and 600 seconds, got {}",
            config.delay_between_requests
        )));
    }

    if config.slow_mo > 10_000 {
        return Err(ConfigError::Validation(format!(
            "slow_mo must be <= 10000ms, got {}ms",
            config.slow_mo
        )));
    }

    if config.timeout < 1_000 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1000ms, got {}ms",
            config.timeout
        )));
    }

    if config.wait_time >= config.timeout {
        return Err(ConfigError::Validation(format!(
            "wait_time ({}ms) must be shorter than timeout ({}ms)",
            config.wait_time, config.timeout
        )));
    }

    if config.max_listing_pages < 1 {
        return Err(ConfigError::Validation(
            "max_listing_pages must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if let Some(api_url) = &config.api_url {
        let url = Url::parse(api_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api_url '{}': {}", api_url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "api_url '{}' must use HTTP or HTTPS",
                api_url
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates site alias entries
fn validate_aliases(aliases: &[SiteAlias]) -> Result<(), ConfigError> {
    for alias in aliases {
        validate_domain_pattern(&alias.domain)?;
    }
    Ok(())
}

/// Validates a host pattern (supports a leading wildcard)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);

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
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is not a valid host name",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::Site;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_domain_pattern() {
        assert!(validate_domain_pattern("mirror.example.com").is_ok());
        assert!(validate_domain_pattern("*.example.com").is_ok());
        assert!(validate_domain_pattern("localhost").is_ok());
        assert!(validate_domain_pattern("127.0.0.1").is_ok());

        assert!(validate_domain_pattern("").is_err());
        assert!(validate_domain_pattern("*.").is_err());
        assert!(validate_domain_pattern(".example.com").is_err());
        assert!(validate_domain_pattern("example..com").is_err());
        assert!(validate_domain_pattern("exa mple.com").is_err());
    }

    #[test]
    fn test_rejects_zero_post_limit() {
        let mut config = Config::default();
        config.scrape.post_limit = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_negative_delay() {
        let mut config = Config::default();
        config.scrape.delay_between_requests = -1.0;
        assert!(validate(&config).is_err());

        config.scrape.delay_between_requests = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_wait_time_beyond_timeout() {
        let mut config = Config::default();
        config.scrape.timeout = 2_000;
        config.scrape.wait_time = 2_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_api_url() {
        let mut config = Config::default();
        config.scrape.api_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.scrape.api_url = Some("ftp://api.example.com/posts".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.scrape.api_url = Some("https://api.example.com/posts".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_bad_alias() {
        let mut config = Config::default();
        config.aliases.push(SiteAlias {
            domain: "bad domain".to_string(),
            site: Site::Clien,
        });
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }
}
