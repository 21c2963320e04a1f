/// Playlist state definitions for tracking scrape progress
///
/// Each playlist walks the same pipeline: count, plan pages, fetch batches,
/// merge, persist. Any active state may drop to `Failed`.
use std::fmt;

/// Represents the current state of one playlist in a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaylistState {
    // ===== Active States =====
    /// Playlist is selected but no request has been issued
    Pending,

    /// The count request is in flight
    CountRequested,

    /// The count is known; paging windows and batches are being planned
    Paging,

    /// Multiquery batches are in flight
    Fetching,

    /// All batches arrived; results are being merged and sorted
    Merging,

    // ===== Terminal States =====
    /// The artifact was written
    Persisted,

    /// The playlist was abandoned; nothing was written
    Failed,
}

impl PlaylistState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Failed)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    /// Returns the state that follows this one on the happy path
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::CountRequested),
            Self::CountRequested => Some(Self::Paging),
            Self::Paging => Some(Self::Fetching),
            Self::Fetching => Some(Self::Merging),
            Self::Merging => Some(Self::Persisted),
            Self::Persisted | Self::Failed => None,
        }
    }

    /// Checks whether moving to `to` is legal
    ///
    /// Legal moves are one step forward along the pipeline, or from any
    /// active state to `Failed`.
    pub fn can_transition_to(&self, to: PlaylistState) -> bool {
        if to == Self::Failed {
            return self.is_active();
        }
        self.next() == Some(to)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CountRequested => "count_requested",
            Self::Paging => "paging",
            Self::Fetching => "fetching",
            Self::Merging => "merging",
            Self::Persisted => "persisted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PlaylistState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
