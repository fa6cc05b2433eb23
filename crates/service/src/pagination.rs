//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct, helpers to normalize inputs, and a
//! `Page` envelope carrying items plus the total matching count.

/// Pagination parameters
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Clamped `(page, per_page)` to echo back in the `Page` envelope, so the
    /// reported values match what the query actually used.
    pub fn effective(self) -> (u32, u32) {
        (self.page.max(1), self.per_page.clamp(1, 100))
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

/// One page of results plus the total match count across all pages.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn empty(p: Pagination) -> Self {
        let (page, per_page) = p.effective();
        Self { items: Vec::new(), total: 0, page, per_page }
    }

    /// Convert page items, keeping the envelope. Used for entity → DTO mapping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}
