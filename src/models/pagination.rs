//! Pagination types shared by the admin list endpoints

use serde::{Deserialize, Serialize};

/// Page size used when the client sends none or garbage
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// A clamped page request: `page >= 1`, `page_size` in `1..=MAX_PAGE_SIZE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Clamp numeric values into range
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.clamp(1, u32::MAX as i64) as u32,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE as i64) as u32,
        }
    }

    /// Build from raw query-string values. Non-numeric input falls back to
    /// the defaults before clamping.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>) -> Self {
        let page = parse_number(page).unwrap_or(1);
        let page_size = parse_number(page_size).unwrap_or(DEFAULT_PAGE_SIZE as i64);
        Self::new(page, page_size)
    }

    /// Row offset for the current page
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Row limit for the current page
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    // "2.0" or "1e1" style values from loosely typed clients
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

/// One page of rows plus the total matching count
#[derive(Debug, Clone)]
pub struct PagedResult<T> {
    /// Rows in the current page
    pub rows: Vec<T>,
    /// Total number of rows matching the filters
    pub total: i64,
    /// The clamped request that produced this page
    pub page: PageRequest,
}

impl<T> PagedResult<T> {
    pub fn new(rows: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self { rows, total, page }
    }

    /// Pagination metadata for the response body
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.total)
    }
}

/// Pagination metadata as returned to the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: PageRequest, total: i64) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total,
            total_pages: total_pages(total, page.page_size),
        }
    }
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages(total: i64, page_size: u32) -> i64 {
    let size = page_size.max(1) as i64;
    let total = total.max(0);
    ((total + size - 1) / size).max(1)
}
