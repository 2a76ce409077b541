use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Feed URLs are http(s)
/// - Ingest batch size and query cache bounds are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Feed validation
    for (name, url) in [
        ("feed.full_url", &config.feed.full_url),
        ("feed.diff_url", &config.feed.diff_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an http(s) URL, got '{}'",
                name, url
            )));
        }
    }

    // Ingest validation
    if config.ingest.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.batch_size cannot be 0".to_string(),
        ));
    }

    // Query validation
    if config.query.cache_entries == 0 {
        return Err(ConfigError::ValidationError(
            "query.cache_entries cannot be 0".to_string(),
        ));
    }
    if config.query.max_search_results == 0 {
        return Err(ConfigError::ValidationError(
            "query.max_search_results cannot be 0".to_string(),
        ));
    }

    Ok(())
}
