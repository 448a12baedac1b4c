//! Requests built from query state.

use std::collections::BTreeMap;

use super::FilterValue;
use super::SortDirection;

/// How the page position is expressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pagination {
    /// `page` (1-based) and `pageSize`.
    #[default]
    PageAndSize,
    /// `offset` (0-based row index) and `limit`.
    OffsetLimit,
}

/// A single outbound query, frozen at issue time.
///
/// # Example
///
/// ```
/// use remote_table::query::{PageRequest, Pagination, QueryState};
///
/// let mut query = QueryState::new(10);
/// query.set_filter("status", "validee");
/// query.set_page(3);
///
/// let request = query.to_request();
/// assert_eq!(request.offset(), 20);
/// assert_eq!(
///     request.query_string(Pagination::PageAndSize),
///     "page=3&pageSize=10&status=validee"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Sort field and direction; never `SortDirection::None`.
    pub sort: Option<(String, SortDirection)>,
    /// Active filters, sorted by field.
    pub filters: BTreeMap<String, FilterValue>,
    /// Search term, `None` when empty.
    pub search: Option<String>,
}

impl PageRequest {
    /// Index of the first row of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Returns the value of an active filter.
    pub fn filter(&self, field: &str) -> Option<&FilterValue> {
        self.filters.get(field)
    }

    /// Query parameters in a stable order: paging, sort, filters, search.
    pub fn to_params(&self, pagination: Pagination) -> Vec<(String, String)> {
        let mut params = Vec::new();

        match pagination {
            Pagination::PageAndSize => {
                params.push(("page".to_string(), self.page.to_string()));
                params.push(("pageSize".to_string(), self.page_size.to_string()));
            }
            Pagination::OffsetLimit => {
                params.push(("offset".to_string(), self.offset().to_string()));
                params.push(("limit".to_string(), self.page_size.to_string()));
            }
        }

        if let Some((field, direction)) = &self.sort
            && let Some(dir) = direction.as_param()
        {
            params.push(("sortBy".to_string(), field.clone()));
            params.push(("sortDir".to_string(), dir.to_string()));
        }

        for (field, value) in &self.filters {
            params.extend(value.to_params(field));
        }

        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }

        params
    }

    /// URL-encoded query string, mainly for logging.
    pub fn query_string(&self, pagination: Pagination) -> String {
        self.to_params(pagination)
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
