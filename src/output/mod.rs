//! Output module
//!
//! This module handles:
//! - Writing one name-sorted JSON artifact per playlist
//! - Collecting and printing the outcome of every playlist in a run

mod artifact;
mod report;

pub use artifact::{artifact_path, render_artifact, write_playlist};
pub use report::{PlaylistArtifact, PlaylistOutcome, ScrapeReport};
