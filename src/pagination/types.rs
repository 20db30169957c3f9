//! Pagination types
//!
//! Defines the cursor and progress tracking used by the collection loop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token returned by the API.
///
/// The token is never parsed: it is requested as-is with the API key
/// appended.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a raw token; empty tokens mean "no more pages"
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The token as received
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Cursors are long; keep log lines readable.
impl fmt::Debug for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOW: usize = 48;
        match self.0.char_indices().nth(SHOW) {
            Some((idx, _)) => write!(f, "PageCursor({}...)", &self.0[..idx]),
            None => write!(f, "PageCursor({})", self.0),
        }
    }
}

/// Result of advancing past a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available at this cursor
    Continue(PageCursor),
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks pagination progress during a run
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched successfully
    pub pages: u32,
    /// Raw rows received across all pages
    pub total_fetched: u64,
    /// Cursor for the next request (`None` = first page, or finished)
    pub cursor: Option<PageCursor>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page and move to its successor
    pub fn advance(&mut self, records_count: usize, next: Option<PageCursor>) -> NextPage {
        self.pages += 1;
        self.total_fetched += records_count as u64;

        match next {
            Some(cursor) => {
                self.cursor = Some(cursor.clone());
                NextPage::Continue(cursor)
            }
            None => {
                self.cursor = None;
                NextPage::Done
            }
        }
    }

    /// Check whether a page cap has been reached
    pub fn reached_page_cap(&self, max_pages: Option<u32>) -> bool {
        max_pages.is_some_and(|max| self.pages >= max)
    }
}
