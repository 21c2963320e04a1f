//! Scrape coordinator - per-playlist orchestration
//!
//! Each playlist runs as its own task through the same pipeline:
//! 1. Request the game count for the playlist's filter
//! 2. Plan paging windows and bundle them into multiqueries
//! 3. Dispatch every multiquery concurrently through the executor
//! 4. Validate and merge the sub-results in batch order
//! 5. Sort by name and write the artifact
//!
//! A failing playlist is reported and skipped; it never affects its
//! siblings. Nothing is written for a playlist unless every batch succeeded.

use crate::catalog::Playlist;
use crate::config::LimitsConfig;
use crate::output::{write_playlist, PlaylistArtifact, PlaylistOutcome, ScrapeReport};
use crate::query::MultiqueryBatch;
use crate::scrape::executor::Executor;
use crate::scrape::merge::{merge_results, parse_batch, parse_count};
use crate::scrape::pager::{batch_pages, plan_pages};
use crate::state::{PlaylistState, PlaylistTracker};
use crate::ScrapeError;
use chrono::Utc;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Endpoint answering `{"count": N}` for a games filter
pub const COUNT_ENDPOINT: &str = "games/count";

/// Endpoint accepting bundled sub-queries
pub const MULTIQUERY_ENDPOINT: &str = "multiquery";

/// Paging and output settings shared by every playlist in a run
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub outdir: PathBuf,
    pub page_size: usize,
    pub batch_size: usize,
}

impl ScrapeSettings {
    pub fn from_config(limits: &LimitsConfig, outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            page_size: limits.page_size,
            batch_size: limits.multiquery_max,
        }
    }
}

/// Main scrape coordinator structure
pub struct Coordinator {
    executor: Arc<Executor>,
    settings: Arc<ScrapeSettings>,
}

impl Coordinator {
    pub fn new(executor: Arc<Executor>, settings: ScrapeSettings) -> Self {
        Self {
            executor,
            settings: Arc::new(settings),
        }
    }

    /// Scrapes every playlist concurrently and reports all outcomes
    ///
    /// Never fails as a whole; per-playlist errors are in the report.
    pub async fn run(&self, playlists: Vec<Playlist>) -> ScrapeReport {
        let started_at = Utc::now();
        tracing::info!(
            "Scraping {} playlists into {}",
            playlists.len(),
            self.settings.outdir.display()
        );

        let handles: Vec<(String, JoinHandle<PlaylistOutcome>)> = playlists
            .into_iter()
            .map(|playlist| {
                let title = playlist.title.clone();
                let executor = self.executor.clone();
                let settings = self.settings.clone();
                let handle = tokio::spawn(scrape_playlist(executor, settings, playlist));
                (title, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (title, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("{}: task failed: {}", title, e);
                    PlaylistOutcome {
                        title,
                        result: Err(ScrapeError::Join(e)),
                        elapsed: Default::default(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let report = ScrapeReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
            dispatches: self.executor.dispatches(),
        };

        tracing::info!(
            "Scrape finished: {} succeeded, {} failed, {} requests",
            report.succeeded().count(),
            report.failed().count(),
            report.dispatches
        );

        report
    }
}

/// Runs one playlist to a terminal state
async fn scrape_playlist(
    executor: Arc<Executor>,
    settings: Arc<ScrapeSettings>,
    playlist: Playlist,
) -> PlaylistOutcome {
    let start = Instant::now();
    let mut tracker = PlaylistTracker::new(&playlist.title);

    let result = run_pipeline(&executor, &settings, &playlist, &mut tracker).await;
    if let Err(e) = &result {
        tracker.fail();
        tracing::error!("{}: {}", playlist.title, e);
    }

    PlaylistOutcome {
        title: playlist.title,
        result,
        elapsed: start.elapsed(),
    }
}

async fn run_pipeline(
    executor: &Arc<Executor>,
    settings: &ScrapeSettings,
    playlist: &Playlist,
    tracker: &mut PlaylistTracker,
) -> Result<PlaylistArtifact, ScrapeError> {
    let title = playlist.title.as_str();

    tracker.transition(PlaylistState::CountRequested)?;
    tracing::info!("{}: Fetching game count", title);
    let count_query = playlist.query.count_query().to_string();
    let response = executor.execute(COUNT_ENDPOINT, &count_query).await?;
    let count = parse_count(title, &response)?;

    tracker.transition(PlaylistState::Paging)?;
    let windows = plan_pages(count, settings.page_size)?;
    let batches = batch_pages(playlist, &windows, settings.batch_size)?;
    let batch_count = batches.len();
    tracing::info!(
        "{}: Scheduled {} games across {} pages in {} requests",
        title,
        count,
        windows.len(),
        batch_count
    );

    tracker.transition(PlaylistState::Fetching)?;
    let results = fetch_batches(executor, batches).await?;

    tracker.transition(PlaylistState::Merging)?;
    let items = merge_results(results);
    if items.len() != count {
        tracing::warn!(
            "{}: count reported {} games but {} were fetched",
            title,
            count,
            items.len()
        );
    }

    let path = write_playlist(&settings.outdir, title, &items).await?;
    tracker.transition(PlaylistState::Persisted)?;
    tracing::info!("{}: Saved {} games to {}", title, items.len(), path.display());

    Ok(PlaylistArtifact {
        path,
        count: items.len(),
        batches: batch_count,
    })
}

/// Dispatches every batch concurrently; results come back in batch order
///
/// On the first failure the remaining batch tasks are aborted.
async fn fetch_batches(
    executor: &Arc<Executor>,
    batches: Vec<MultiqueryBatch>,
) -> Result<Vec<Vec<Value>>, ScrapeError> {
    let handles: Vec<JoinHandle<Result<Vec<Value>, ScrapeError>>> = batches
        .into_iter()
        .map(|batch| {
            let executor = executor.clone();
            tokio::spawn(async move {
                let body = batch.to_string();
                let response = executor.execute(MULTIQUERY_ENDPOINT, &body).await?;
                parse_batch(&batch, &response)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter();

    while let Some(handle) = pending.next() {
        let failure = match handle.await {
            Ok(Ok(items)) => {
                results.push(items);
                continue;
            }
            Ok(Err(e)) => e,
            Err(e) => ScrapeError::Join(e),
        };

        for handle in pending {
            handle.abort();
        }
        return Err(failure);
    }

    Ok(results)
}
