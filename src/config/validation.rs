use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_details < 1 || config.max_concurrent_details > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be between 1 and 64, got {}",
            config.max_concurrent_details
        )));
    }

    if config.detail_wait_timeout_ms < 1_000 {
        return Err(ConfigError::Validation(format!(
            "detail_wait_timeout_ms must be >= 1000ms, got {}ms",
            config.detail_wait_timeout_ms
        )));
    }

    if config.load_more_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "load_more_attempts must be >= 1, got {}",
            config.load_more_attempts
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

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.records_path.is_empty() {
        return Err(ConfigError::Validation(
            "records_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email shape check: one `@` with non-empty local and domain parts,
/// and a dot in the domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid contact_email: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default();
        config.crawler.max_concurrent_details = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_tiny_wait_timeout_rejected() {
        let mut config = Config::default();
        config.crawler.detail_wait_timeout_ms = 50;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_crawler_name_rejected() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "bad name!".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut config = Config::default();
        config.user_agent.contact_email = "not-an-email".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_records_path_rejected() {
        let mut config = Config::default();
        config.output.records_path = String::new();
        assert!(validate(&config).is_err());
    }
}
