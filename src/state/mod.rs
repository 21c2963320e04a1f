//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `PlaylistState`: the lifecycle of one playlist within a run
//! - `PlaylistTracker`: owns a playlist's current state and enforces legal transitions

mod playlist_state;

pub use playlist_state::PlaylistState;

use crate::ScrapeError;

/// Tracks one playlist's state, logging every move
#[derive(Debug)]
pub struct PlaylistTracker {
    title: String,
    state: PlaylistState,
}

impl PlaylistTracker {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: PlaylistState::Pending,
        }
    }

    pub fn state(&self) -> PlaylistState {
        self.state
    }

    /// Moves to `to`, failing with `InvalidTransition` if the move is illegal
    pub fn transition(&mut self, to: PlaylistState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(to) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to,
            });
        }

        tracing::debug!("{}: {} -> {}", self.title, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Marks the playlist failed; a no-op once terminal
    pub fn fail(&mut self) {
        if self.state.is_active() {
            tracing::debug!("{}: {} -> {}", self.title, self.state, PlaylistState::Failed);
            self.state = PlaylistState::Failed;
        }
    }
}
