//! # Search Pagination
//!
//! [`SearchPager`] turns a query into pages of matching songs lazily. It
//! remembers every page it has built and how far into the catalog it has
//! scanned, so going back to an earlier page is free and going forward only
//! scans the songs not yet looked at.
//!
//! Because the catalog is append-only, songs added after a pager was created
//! are picked up by pages that have not been built yet.

use crate::catalog::Catalog;
use crate::models::SongRecord;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SearchPager {
    query: String,
    needle: String,
    page_size: usize,
    scan_index: usize,
    pages: Vec<Vec<SongRecord>>,
}

impl SearchPager {
    /// Create a pager for `query`. An empty query matches every song.
    ///
    /// A `page_size` of zero is treated as one.
    pub fn new(query: impl Into<String>, page_size: usize) -> Self {
        let query = query.into();
        Self {
            needle: SongRecord::normalize(&query),
            query,
            page_size: page_size.max(1),
            scan_index: 0,
            pages: Vec::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Return page `n` (0-based), building it and every earlier page first
    /// if needed. Pages past the last match are empty.
    pub fn page(&mut self, catalog: &Catalog, n: usize) -> Vec<SongRecord> {
        while n >= self.pages.len() && self.scan_index < catalog.len() {
            let mut page = Vec::with_capacity(self.page_size);

            while page.len() < self.page_size {
                let Some(candidate) = catalog.at(self.scan_index) else {
                    break;
                };
                self.scan_index += 1;

                if candidate.matches(&self.needle) {
                    page.push(candidate.clone());
                }
            }

            if page.is_empty() {
                break;
            }
            debug!(query = %self.query, page = self.pages.len(), size = page.len(), "Built search page");
            self.pages.push(page);
        }

        self.pages.get(n).cloned().unwrap_or_default()
    }

    /// Number of pages built so far.
    pub fn pages_realized(&self) -> usize {
        self.pages.len()
    }

    /// True once every song currently in `catalog` has been scanned.
    pub fn is_exhausted(&self, catalog: &Catalog) -> bool {
        self.scan_index >= catalog.len()
    }
}
