use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.igdb.com/v4/";
pub const DEFAULT_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Main configuration structure
///
/// Every table and key is optional; a missing file means all defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Remote endpoints and client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL every endpoint path is joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 client-credentials token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Admission and paging limits
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum number of requests in flight at once
    #[serde(default = "default_max_active_queries")]
    pub max_active_queries: usize,

    /// Maximum request admissions per second
    #[serde(default = "default_max_query_rate")]
    pub max_query_rate: f64,

    /// Items per page (the API caps `limit` at 500)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Sub-queries per multiquery request
    #[serde(default = "default_multiquery_max")]
    pub multiquery_max: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_active_queries: default_max_active_queries(),
            max_query_rate: default_max_query_rate(),
            page_size: default_page_size(),
            multiquery_max: default_multiquery_max(),
        }
    }
}

/// Retry and backoff behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds); doubles each retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single backoff delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_active_queries() -> usize {
    8
}

fn default_max_query_rate() -> f64 {
    4.0
}

fn default_page_size() -> usize {
    500
}

fn default_multiquery_max() -> usize {
    20
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}
