//! Pagination of order listings.

use serde::{Deserialize, Serialize};

/// PageRequest selects a 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Number of rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// PageInfo describes where a page sits within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl PageInfo {
    /// Builds page info for a result set of `total` rows.
    pub fn new(request: PageRequest, total: u64) -> Self {
        let pages = if request.limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.limit))
        };

        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages,
        }
    }
}
