//! Pagination envelope
//!
//! List endpoints page through results ten rows at a time. Page numbers are
//! 1-based; a page of `0` (or below) asks for the whole result set.

use serde::{Deserialize, Serialize};

/// Fixed page size for every list endpoint
pub const PAGE_SIZE: i64 = 10;

/// Highest page number a list query accepts
pub const MAX_PAGE: i64 = 100_000;

/// Rows skipped before `page`; saturates instead of overflowing
fn offset_of(page: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(PAGE_SIZE)
}

/// `LIMIT`/`OFFSET` pair for a requested page
///
/// `limit` is `None` for unpaginated requests, which binds as SQL `LIMIT NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl PageSlice {
    pub fn for_page(page: i64) -> Self {
        if page <= 0 {
            Self {
                limit: None,
                offset: 0,
            }
        } else {
            Self {
                limit: Some(PAGE_SIZE),
                offset: offset_of(page),
            }
        }
    }

    /// Apply the slice to an in-memory result set
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(0);
        let iter = items.into_iter().skip(skip);
        match self.limit.and_then(|l| usize::try_from(l).ok()) {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// `{from, to, totalCount, totalPages, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub from: i64,
    pub to: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Build the envelope for `page` out of `total_count` matching rows.
    ///
    /// `from`, `to` and `totalPages` stay `0` for unpaginated requests and
    /// for empty results.
    pub fn new(total_count: i64, page: i64, data: Vec<T>) -> Self {
        let offset = offset_of(page);
        let (from, to, total_pages) = if total_count > 0 && page > 0 {
            let total_pages = (total_count + PAGE_SIZE - 1) / PAGE_SIZE;
            (
                offset.saturating_add(1),
                offset.saturating_add(PAGE_SIZE).min(total_count),
                total_pages,
            )
        } else {
            (0, 0, 0)
        };

        Self {
            from,
            to,
            total_count,
            total_pages,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            from: self.from,
            to: self.to,
            total_count: self.total_count,
            total_pages: self.total_pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}
