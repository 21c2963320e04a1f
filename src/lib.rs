//! igdb-scrape: IGDB playlist scraper
//!
//! This crate fetches game metadata from the IGDB catalog API for a fixed
//! catalog of platform/engine playlists. Requests are paged, bundled into
//! multiqueries, admitted through a concurrency + rate gate and retried on
//! transient failures. Each playlist ends up as one name-sorted JSON file.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod output;
pub mod query;
pub mod scrape;
pub mod state;

use thiserror::Error;

/// Main error type for scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Page size must be at least 1, got {0}")]
    InvalidPageSize(usize),

    #[error("Multiquery batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),

    #[error("Query rate must be a positive number, got {0}")]
    InvalidRate(f64),

    #[error("Transport failure for {url}: {source}")]
    TransportFailure { url: String, source: reqwest::Error },

    #[error("Retryable HTTP status {status}: {body}")]
    RetryableStatus { status: u16, body: String },

    #[error("Request failed with HTTP status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Gave up after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: u32,
        source: Box<ScrapeError>,
    },

    #[error("Invalid count response for '{playlist}': {reason}")]
    InvalidCountResponse { playlist: String, reason: String },

    #[error("Client ID and client secret are required (use --client-id/--client-secret or TWITCH_CLIENT_ID/TWITCH_CLIENT_SECRET)")]
    CredentialMissing,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("All listed playlists are unknown: {}", .0.join(", "))]
    UnknownPlaylists(Vec<String>),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PlaylistState,
        to: state::PlaylistState,
    },

    #[error("Request gate was closed")]
    GateClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ScrapeError {
    /// Returns true for failures worth another attempt
    ///
    /// Only transport-level failures and the retryable status set qualify.
    /// Everything else, including malformed 2xx bodies, is final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure { .. } | Self::RetryableStatus { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{load_catalog, Playlist};
pub use config::Config;
pub use query::{MultiqueryBatch, Query, Sort, SortDirection};
pub use state::PlaylistState;
