//! Per-run outcome reporting

use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// What a successfully scraped playlist produced
#[derive(Debug, Clone)]
pub struct PlaylistArtifact {
    pub path: PathBuf,

    /// Number of games written
    pub count: usize,

    /// Number of multiquery requests it took
    pub batches: usize,
}

/// The terminal result of one playlist
#[derive(Debug)]
pub struct PlaylistOutcome {
    pub title: String,
    pub result: Result<PlaylistArtifact, ScrapeError>,
    pub elapsed: Duration,
}

impl PlaylistOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of every playlist in one run
#[derive(Debug)]
pub struct ScrapeReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Outcomes in the order playlists were requested
    pub outcomes: Vec<PlaylistOutcome>,

    /// HTTP dispatches issued, retries included
    pub dispatches: u64,
}

impl ScrapeReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &PlaylistOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &PlaylistOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True only if every playlist was persisted
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(PlaylistOutcome::is_success)
    }

    pub fn outcome(&self, title: &str) -> Option<&PlaylistOutcome> {
        self.outcomes.iter().find(|o| o.title == title)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Renders the run summary, successes first
    ///
    /// Per-playlist lines count multiquery batches. The total line counts
    /// every HTTP dispatch, retries included.
    pub fn format_summary(&self) -> String {
        let mut out = String::from("=== Scrape Summary ===\n");

        let succeeded: Vec<_> = self.succeeded().collect();
        if !succeeded.is_empty() {
            out.push_str("\nScraped:\n");
            for outcome in succeeded {
                if let Ok(artifact) = &outcome.result {
                    out.push_str(&format!(
                        "  - {}: {} games in {} batches ({:.1}s) -> {}\n",
                        outcome.title,
                        artifact.count,
                        artifact.batches,
                        outcome.elapsed.as_secs_f64(),
                        artifact.path.display()
                    ));
                }
            }
        }

        let failed: Vec<_> = self.failed().collect();
        if !failed.is_empty() {
            out.push_str("\nFailed:\n");
            for outcome in &failed {
                if let Err(e) = &outcome.result {
                    out.push_str(&format!("  - {}: {}\n", outcome.title, e));
                }
            }
        }

        out.push_str(&format!(
            "\n{} of {} playlists scraped, {} failed, {} HTTP requests in {}s\n",
            self.outcomes.len() - failed.len(),
            self.outcomes.len(),
            failed.len(),
            self.dispatches,
            self.duration().num_seconds()
        ));

        out
    }

    /// Writes the run summary to stderr
    pub fn print_summary(&self) {
        eprint!("{}", self.format_summary());
    }
}
