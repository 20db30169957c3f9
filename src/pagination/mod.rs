//! Pagination module
//!
//! The upstream API pages with an opaque `next_url`. This module wraps it in
//! a [`PageCursor`] that is stored and replayed verbatim, and tracks how far
//! a run has paged.

mod types;

pub use types::{NextPage, PageCursor, PaginationState};
