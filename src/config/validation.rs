use crate::config::types::{ApiConfig, Config, LimitsConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Largest `limit` the catalog API accepts
pub const MAX_PAGE_SIZE: usize = 500;

/// Largest multiquery the catalog API accepts
pub const MAX_MULTIQUERY_SIZE: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_limits_config(&config.limits)?;
    validate_retry_config(&config.retry)?;
    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("token-url", &config.token_url)?;

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_active_queries < 1 || config.max_active_queries > 64 {
        return Err(ConfigError::Validation(format!(
            "max-active-queries must be between 1 and 64, got {}",
            config.max_active_queries
        )));
    }

    if !config.max_query_rate.is_finite() || config.max_query_rate <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "max-query-rate must be a positive number, got {}",
            config.max_query_rate
        )));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.multiquery_max < 1 || config.multiquery_max > MAX_MULTIQUERY_SIZE {
        return Err(ConfigError::Validation(format!(
            "multiquery-max must be between 1 and {}, got {}",
            MAX_MULTIQUERY_SIZE, config.multiquery_max
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.base_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-ms ({}) cannot exceed max-delay-ms ({})",
            config.base_delay_ms, config.max_delay_ms
        )));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            key, value
        )));
    }

    Ok(())
}
