//! Table configuration

use std::time::Duration;

/// Configuration for a table instance.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use remote_table::TableConfig;
///
/// let config = TableConfig::default()
///     .with_page_size(25)
///     .with_search_debounce(Duration::from_millis(500));
/// assert_eq!(config.page_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    /// Rows per page at mount.
    ///
    /// Default: 10
    pub page_size: u32,

    /// Page sizes offered by the pagination control.
    ///
    /// Default: 10, 25, 50, 100
    pub page_size_options: Vec<u32>,

    /// Input inactivity before a search term is fetched.
    ///
    /// Default: 300 ms
    pub search_debounce: Duration,

    /// Text shown when a successful fetch returns no rows.
    pub empty_message: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
            search_debounce: Duration::from_millis(300),
            empty_message: "No data".to_string(),
        }
    }
}

impl TableConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial page size (at least 1).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the page sizes offered by the pagination control.
    pub fn with_page_size_options(mut self, options: impl IntoIterator<Item = u32>) -> Self {
        self.page_size_options = options.into_iter().filter(|n| *n > 0).collect();
        self
    }

    /// Sets the search debounce window.
    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Sets the empty-state text.
    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Fetches search terms immediately.
    pub fn no_debounce() -> Self {
        Self {
            search_debounce: Duration::ZERO,
            ..Default::default()
        }
    }
}
