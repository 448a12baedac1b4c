//! Query state store.

use std::collections::BTreeMap;

use super::FilterValue;
use super::PageRequest;
use super::SortDirection;

/// Page, sort, filters and search for one table instance.
///
/// Every mutator returns `true` if the query changed, which is the signal
/// for the controller to fetch. Any change to sort, filters or search
/// resets `page` to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    page: u32,
    page_size: u32,
    sort_by: Option<String>,
    sort_dir: SortDirection,
    filters: BTreeMap<String, FilterValue>,
    search: String,
}

impl QueryState {
    /// Creates a query on page 1 with the given page size (at least 1).
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            sort_by: None,
            sort_dir: SortDirection::None,
            filters: BTreeMap::new(),
            search: String::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_dir(&self) -> SortDirection {
        self.sort_dir
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, field: &str) -> Option<&FilterValue> {
        self.filters.get(field)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Moves to page `page`; 0 is clamped to 1. Other fields are untouched.
    pub fn set_page(&mut self, page: u32) -> bool {
        let page = page.max(1);
        let changed = self.page != page;
        self.page = page;
        changed
    }

    /// Changes the page size and returns to page 1. A size of 0 is ignored.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        if page_size == 0 {
            return false;
        }
        let changed = self.page_size != page_size || self.page != 1;
        self.page_size = page_size;
        self.page = 1;
        changed
    }

    /// Sorts by `field`, cycling `asc → desc → none` on repeated calls.
    pub fn set_sort(&mut self, field: &str) -> bool {
        if self.sort_by.as_deref() == Some(field) {
            self.sort_dir = self.sort_dir.next();
            if self.sort_dir == SortDirection::None {
                self.sort_by = None;
            }
        } else {
            self.sort_by = Some(field.to_string());
            self.sort_dir = SortDirection::Asc;
        }
        self.reset_page();
        true
    }

    /// Sets or clears (empty value) a filter and returns to page 1.
    ///
    /// Text is stored trimmed, the way it goes on the wire.
    pub fn set_filter(&mut self, field: &str, value: impl Into<FilterValue>) -> bool {
        let value = match value.into() {
            FilterValue::Text(text) if text.trim().len() != text.len() => {
                FilterValue::Text(text.trim().to_string())
            }
            value => value,
        };
        let changed = if value.is_empty() {
            self.filters.remove(field).is_some()
        } else {
            self.filters.insert(field.to_string(), value.clone()) != Some(value)
        };
        self.reset_page() || changed
    }

    /// Sets the search term and returns to page 1.
    pub fn set_search(&mut self, text: &str) -> bool {
        let changed = self.search != text;
        self.search = text.to_string();
        self.reset_page() || changed
    }

    /// Clears every filter and the search term and returns to page 1.
    pub fn reset_filters(&mut self) -> bool {
        let changed = !self.filters.is_empty() || !self.search.is_empty();
        self.filters.clear();
        self.search.clear();
        self.reset_page() || changed
    }

    /// Freezes the current state into a request.
    pub fn to_request(&self) -> PageRequest {
        let search = self.search.trim();
        PageRequest {
            page: self.page,
            page_size: self.page_size,
            sort: self
                .sort_by
                .as_ref()
                .filter(|_| self.sort_dir != SortDirection::None)
                .map(|field| (field.clone(), self.sort_dir)),
            filters: self.filters.clone(),
            search: (!search.is_empty()).then(|| search.to_string()),
        }
    }

    /// Returns `true` if the page moved.
    fn reset_page(&mut self) -> bool {
        let moved = self.page != 1;
        self.page = 1;
        moved
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_cycle() {
        let mut query = QueryState::new(10);

        query.set_sort("lastName");
        assert_eq!(query.sort_by(), Some("lastName"));
        assert_eq!(query.sort_dir(), SortDirection::Asc);

        query.set_sort("lastName");
        assert_eq!(query.sort_by(), Some("lastName"));
        assert_eq!(query.sort_dir(), SortDirection::Desc);

        query.set_sort("lastName");
        assert_eq!(query.sort_by(), None);
        assert_eq!(query.sort_dir(), SortDirection::None);
    }

    #[test]
    fn test_sort_other_field_restarts_cycle() {
        let mut query = QueryState::new(10);
        query.set_sort("lastName");
        query.set_sort("lastName");
        query.set_sort("hiredAt");
        assert_eq!(query.sort_by(), Some("hiredAt"));
        assert_eq!(query.sort_dir(), SortDirection::Asc);
    }

    #[test]
    fn test_page_reset_on_every_query_mutation() {
        let mut query = QueryState::new(10);

        query.set_page(4);
        query.set_sort("lastName");
        assert_eq!(query.page(), 1);

        query.set_page(4);
        query.set_filter("status", "validee");
        assert_eq!(query.page(), 1);

        // Same filter value again still resets the page.
        query.set_page(4);
        assert!(query.set_filter("status", "validee"));
        assert_eq!(query.page(), 1);

        query.set_page(4);
        query.set_search("jean");
        assert_eq!(query.page(), 1);

        query.set_page(4);
        query.reset_filters();
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_set_page_keeps_other_fields() {
        let mut query = QueryState::new(10);
        query.set_sort("lastName");
        query.set_filter("status", "validee");
        query.set_search("jean");

        query.set_page(3);
        assert_eq!(query.page(), 3);
        assert_eq!(query.sort_by(), Some("lastName"));
        assert_eq!(query.filter("status"), Some(&FilterValue::text("validee")));
        assert_eq!(query.search(), "jean");
    }

    #[test]
    fn test_unchanged_mutations_report_no_change() {
        let mut query = QueryState::new(10);
        assert!(!query.set_page(1));
        assert!(!query.set_search(""));
        assert!(!query.set_filter("status", FilterValue::Empty));
        assert!(!query.set_page_size(10));
        assert!(!query.set_page_size(0));
        assert_eq!(query.page_size(), 10);
    }

    #[test]
    fn test_set_page_clamps_zero() {
        let mut query = QueryState::new(10);
        query.set_page(5);
        query.set_page(0);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn test_empty_filter_removes_entry() {
        let mut query = QueryState::new(10);
        query.set_filter("status", "validee");
        assert!(query.set_filter("status", ""));
        assert!(query.filters().is_empty());
    }

    #[test]
    fn test_reset_filters_clears_search() {
        let mut query = QueryState::new(10);
        query.set_filter("status", "validee");
        query.set_search("jean");
        assert!(query.reset_filters());
        assert!(query.filters().is_empty());
        assert_eq!(query.search(), "");
    }

    #[test]
    fn test_request_trims_search() {
        let mut query = QueryState::new(10);
        query.set_search("  ");
        assert_eq!(query.to_request().search, None);
        query.set_search(" jean ");
        assert_eq!(query.to_request().search.as_deref(), Some("jean"));
    }

    #[test]
    fn test_filter_text_stored_trimmed() {
        let mut query = QueryState::new(10);
        assert!(query.set_filter("status", " validee "));
        assert_eq!(query.filter("status"), Some(&FilterValue::text("validee")));
        assert!(!query.set_filter("status", "validee"));
    }
}
