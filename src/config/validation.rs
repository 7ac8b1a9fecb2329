use crate::config::types::{Config, HarvestConfig, ServerConfig, SourceConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_harvest_config(&config.harvest)?;
    validate_storage_config(&config.storage)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates the source site configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    if config.base_url.is_empty() {
        return Err(ConfigError::Validation(
            "base_url cannot be empty".to_string(),
        ));
    }

    // The base URL must parse once an id is appended; appending "1" keeps
    // query-style bases like "...?news=" valid during the check.
    let probe = format!("{}1", config.base_url);
    let url = Url::parse(&probe)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}

/// Validates the harvest loop configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.empty_streak_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "empty_streak_threshold must be >= 1, got {}",
            config.empty_streak_threshold
        )));
    }

    if config.empty_ceiling < 1 {
        return Err(ConfigError::Validation(format!(
            "empty_ceiling must be >= 1, got {}",
            config.empty_ceiling
        )));
    }

    if config.long_sleep_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "long_sleep_secs must be >= 1, got {}",
            config.long_sleep_secs
        )));
    }

    if config.slow_response_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "slow_response_secs must be >= 1, got {}",
            config.slow_response_secs
        )));
    }

    if config.watchdog_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "watchdog_secs must be >= 1, got {}",
            config.watchdog_secs
        )));
    }

    // retry_backoff_secs is deliberately not checked: 0 means retries
    // wait no time between attempts

    if config.fetch_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch_retries must be >= 1, got {}",
            config.fetch_retries
        )));
    }

    if config.start_id < 1 {
        return Err(ConfigError::Validation(format!(
            "start_id must be >= 1, got {}",
            config.start_id
        )));
    }

    Ok(())
}

/// Validates the storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the status server configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.listen_port == 0 {
        return Err(ConfigError::Validation(
            "listen_port cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        toml::from_str(
            r#"
[source]
base-url = "https://example.com/news.php?news="

[harvest]

[storage]
database-path = "./khobor.db"

[server]
listen-port = 3100
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = valid_config();
        config.source.base_url = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut config = valid_config();
        config.source.base_url = "ftp://example.com/news=".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_query_style_base_url_accepted() {
        let mut config = valid_config();
        config.source.base_url = "http://127.0.0.1:8080/news.php?news=".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = valid_config();
        config.harvest.concurrency = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_streak_threshold_rejected() {
        let mut config = valid_config();
        config.harvest.empty_streak_threshold = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_retry_backoff_allowed() {
        let mut config = valid_config();
        config.harvest.retry_backoff_secs = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_start_id_rejected() {
        let mut config = valid_config();
        config.harvest.start_id = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let mut config = valid_config();
        config.storage.database_path = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = valid_config();
        config.server.listen_port = 0;
        assert!(validate(&config).is_err());
    }
}
