//! Pagination footer model.

use crate::query::QueryState;

/// Everything a pagination footer shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub page: u32,
    pub page_size: u32,
    /// Page sizes offered, always including the current one.
    pub page_size_options: Vec<u32>,
    pub total: Option<u64>,
    /// Rows on the loaded page.
    pub rows_on_page: usize,
}

impl PaginationView {
    pub fn new(query: &QueryState, total: Option<u64>, rows_on_page: usize, options: &[u32]) -> Self {
        let mut page_size_options: Vec<u32> = options.iter().copied().filter(|&size| size > 0).collect();
        if !page_size_options.contains(&query.page_size()) {
            page_size_options.push(query.page_size());
        }
        page_size_options.sort_unstable();
        page_size_options.dedup();

        Self {
            page: query.page(),
            page_size: query.page_size(),
            page_size_options,
            total,
            rows_on_page,
        }
    }

    /// Number of pages, when the total is known. An empty result has one
    /// (empty) page.
    pub fn page_count(&self) -> Option<u64> {
        let size = u64::from(self.page_size.max(1));
        self.total.map(|total| total.div_ceil(size).max(1))
    }

    /// 1-based index of the first row shown, 0 when the page is empty.
    pub fn first_row(&self) -> u64 {
        if self.rows_on_page == 0 {
            0
        } else {
            self.offset() + 1
        }
    }

    /// 1-based index of the last row shown, 0 when the page is empty.
    pub fn last_row(&self) -> u64 {
        self.offset() + self.rows_on_page as u64
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// With an unknown total, a full page suggests there is more.
    pub fn has_next(&self) -> bool {
        match self.page_count() {
            Some(count) => u64::from(self.page) < count,
            None => self.rows_on_page > 0 && self.rows_on_page as u64 >= u64::from(self.page_size),
        }
    }

    /// `"11-20 of 25"` style summary.
    pub fn summary(&self) -> String {
        let range = if self.rows_on_page == 0 {
            "0".to_string()
        } else {
            format!("{}-{}", self.first_row(), self.last_row())
        };
        match self.total {
            Some(total) => format!("{range} of {total}"),
            None => range,
        }
    }

    fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}
