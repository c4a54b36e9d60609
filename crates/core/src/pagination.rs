//! Page-number pagination shared by the listing endpoints and the catalog.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default number of results per page.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Maximum number of results per page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

// ---------------------------------------------------------------------------
// Request / metadata
// ---------------------------------------------------------------------------

/// A validated page request: `page >= 1`, `1 <= limit <= MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            limit: clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT),
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Pagination block returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total_count: i64) -> Self {
        let total_count = total_count.max(0);
        let total_pages = (total_count + request.limit - 1) / request.limit;
        Self {
            page: request.page,
            limit: request.limit,
            total_count,
            total_pages,
            has_more: request.page < total_pages,
        }
    }
}

/// Slice one page out of an already-ordered in-memory result set.
pub fn paginate<T>(items: &[T], request: PageRequest) -> &[T] {
    let start = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(request.limit as usize).min(items.len());
    &items[start..end]
}
