//! Scrape module for playlist fetching and merging
//!
//! This module contains the core scraping logic, including:
//! - Paging a playlist's result set and bundling pages into multiqueries
//! - Admitting requests through a shared concurrency and rate gate
//! - Retrying transient failures with exponential backoff
//! - Validating responses, merging and sorting results
//! - Per-playlist coordination and reporting

mod coordinator;
mod executor;
mod gate;
mod merge;
mod pager;

pub use coordinator::{Coordinator, ScrapeSettings, COUNT_ENDPOINT, MULTIQUERY_ENDPOINT};
pub use executor::{Executor, RetryPolicy};
pub use gate::{Gate, GatePermit};
pub use merge::{merge_results, parse_batch, parse_count, sort_by_name, MAX_COUNT};
pub use pager::{batch_pages, plan_pages, window_label, PageWindow};

use crate::catalog::{Catalog, Playlist};
use crate::client::CatalogClient;
use crate::config::Config;
use crate::output::ScrapeReport;
use crate::ScrapeError;
use std::path::PathBuf;
use std::sync::Arc;

/// Picks the playlists to scrape from the catalog
///
/// An empty request means every playlist. Unknown names are logged and
/// skipped; if nothing requested is known the run is refused.
pub fn select_playlists<S: AsRef<str>>(
    catalog: &Catalog,
    names: &[S],
) -> Result<Vec<Playlist>, ScrapeError> {
    let (playlists, unknown) = catalog.select(names);

    for name in &unknown {
        tracing::warn!("Unknown playlist '{}', skipping", name);
    }

    if playlists.is_empty() {
        return Err(ScrapeError::UnknownPlaylists(unknown));
    }

    Ok(playlists)
}

/// Builds the executor shared by every request of one run
pub fn build_executor(config: &Config, client: CatalogClient) -> Result<Executor, ScrapeError> {
    let gate = Arc::new(Gate::from_config(&config.limits)?);
    Ok(Executor::new(
        client,
        gate,
        RetryPolicy::from_config(&config.retry),
    ))
}

/// Runs a complete scrape operation
///
/// This is the main entry point for scraping. It will:
/// 1. Build one gate and executor for the whole run
/// 2. Scrape every playlist concurrently
/// 3. Write one artifact per successful playlist under `outdir`
///
/// # Returns
///
/// * `Ok(ScrapeReport)` - every playlist's outcome; individual playlist
///   failures are in the report
/// * `Err(ScrapeError)` - the run could not be set up
pub async fn scrape(
    config: &Config,
    client: CatalogClient,
    playlists: Vec<Playlist>,
    outdir: impl Into<PathBuf>,
) -> Result<ScrapeReport, ScrapeError> {
    let executor = Arc::new(build_executor(config, client)?);
    let settings = ScrapeSettings::from_config(&config.limits, outdir);
    Ok(Coordinator::new(executor, settings).run(playlists).await)
}
