//! Configuration module
//!
//! Settings come from an optional TOML file. Every key has a default, so the
//! scraper runs without one.
//!
//! # Example
//!
//! ```no_run
//! use igdb_scrape::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("igdb-scrape.toml")).unwrap();
//! println!("At most {} requests in flight", config.limits.max_active_queries);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ApiConfig, Config, LimitsConfig, RetryConfig, DEFAULT_API_BASE_URL, DEFAULT_TOKEN_URL,
};
pub use validation::{validate, MAX_MULTIQUERY_SIZE, MAX_PAGE_SIZE};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
