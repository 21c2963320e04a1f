//! Paging plans and multiquery batching

use crate::catalog::{Playlist, GAMES_ENDPOINT};
use crate::query::MultiqueryBatch;
use crate::ScrapeError;

/// One `(offset, limit)` paging window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    /// Index of the last item covered (inclusive)
    pub fn last(&self) -> usize {
        self.offset + self.limit - 1
    }
}

/// Splits `[0, total_count)` into consecutive windows of `page_size`
///
/// The final window is clamped to the remainder. A zero count yields no
/// windows.
pub fn plan_pages(total_count: usize, page_size: usize) -> Result<Vec<PageWindow>, ScrapeError> {
    if page_size == 0 {
        return Err(ScrapeError::InvalidPageSize(page_size));
    }

    Ok((0..total_count)
        .step_by(page_size)
        .map(|offset| PageWindow {
            offset,
            limit: page_size.min(total_count - offset),
        })
        .collect())
}

/// The label identifying a window of a playlist inside a multiquery
pub fn window_label(title: &str, window: &PageWindow) -> String {
    format!("{} ({}-{})", title, window.offset, window.last())
}

/// Groups windows into multiquery batches of at most `batch_size` entries
///
/// Each window becomes one sub-query: the playlist's base query with its
/// offset and limit overridden. Window order is preserved within and across
/// batches.
pub fn batch_pages(
    playlist: &Playlist,
    windows: &[PageWindow],
    batch_size: usize,
) -> Result<Vec<MultiqueryBatch>, ScrapeError> {
    if batch_size == 0 {
        return Err(ScrapeError::InvalidBatchSize(batch_size));
    }

    let mut batches = Vec::with_capacity(windows.len().div_ceil(batch_size));
    for chunk in windows.chunks(batch_size) {
        let mut batch = MultiqueryBatch::with_capacity(batch_size)?;
        for window in chunk {
            batch.push(
                window_label(&playlist.title, window),
                GAMES_ENDPOINT,
                playlist.query.with_window(window.offset, window.limit),
            )?;
        }
        batches.push(batch);
    }

    Ok(batches)
}
