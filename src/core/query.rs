//! Pagination utilities

use crate::core::criteria::FilterCriteria;
use serde::Serialize;

/// Offset/count window of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of matching records to skip
    pub skip: u64,
    /// Maximum number of records to return
    pub limit: u64,
}

impl PageWindow {
    /// Apply the window to an already ordered sequence
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.skip as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// Converts page/limit into a window
pub struct Paginator;

impl Paginator {
    /// `skip = (page - 1) * limit`
    ///
    /// Both inputs are already bounded by the normalizer; a page of 0 is
    /// treated as the first page.
    pub fn window(page: u32, limit: u32) -> PageWindow {
        let page = u64::from(page.max(1));
        let limit = u64::from(limit);
        PageWindow {
            skip: (page - 1) * limit,
            limit,
        }
    }

    pub fn for_criteria(criteria: &FilterCriteria) -> PageWindow {
        Self::window(criteria.page(), criteria.limit())
    }
}

/// Response body of `GET /bikes`
///
/// `total` counts every match, not only the returned page. It is computed by
/// a separate count and may drift from the page under concurrent writes.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedBikes<T> {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub bikes: Vec<T>,
}

impl<T> PaginatedBikes<T> {
    pub fn new(criteria: &FilterCriteria, total: u64, bikes: Vec<T>) -> Self {
        Self {
            page: criteria.page(),
            limit: criteria.limit(),
            total,
            bikes,
        }
    }
}
