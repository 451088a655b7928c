//! Page arithmetic over a filtered row sequence.

use crate::table::{Result, TableError};
use std::ops::Range;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// A zero-based, fixed-size window over the filtered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a page request. A zero page size is a caller error.
    pub fn new(page: u64, page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(TableError::InvalidPage(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, page_size })
    }

    /// Row index range of this page among `total` filtered rows.
    #[inline]
    pub fn range(&self, total: u64) -> Range<u64> {
        paginate(total, self.page, self.page_size)
    }

    /// Number of pages needed for `total` rows.
    #[inline]
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}

/// Map a page onto row indices: `[page * size, min(page * size + size, total))`.
///
/// A page starting at or past `total` is empty. Arithmetic saturates, so
/// huge page numbers yield an empty range instead of overflowing.
#[inline]
pub fn paginate(total: u64, page: u64, page_size: u64) -> Range<u64> {
    let start = page.saturating_mul(page_size);
    if start >= total {
        return total..total;
    }
    let end = start.saturating_add(page_size).min(total);
    start..end
}
