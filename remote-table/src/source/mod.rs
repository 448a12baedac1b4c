//! Data sources a table queries.
//!
//! - [`DataSource`] - the backend contract: one page per [`PageRequest`]
//! - [`Page`] - rows plus the total count, envelope-agnostic
//! - [`HttpDataSource`] - a REST adapter over `reqwest`
//! - [`JsonRecord`] - an untyped row keyed by a configurable identifier field

mod envelope;
mod http;
mod record;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::query::PageRequest;

pub use envelope::normalize_envelope;
pub use envelope::parse_error_body;
pub use http::HttpDataSource;
pub use http::HttpDataSourceBuilder;
pub use record::JsonRecord;
pub use record::RecordKey;

/// The backend a table instance queries.
///
/// Implementations perform all filtering, sorting and paging; the controller
/// only builds requests and reconciles responses.
#[async_trait]
pub trait DataSource<R>: Send + Sync {
    /// Fetch the page described by `request`.
    async fn fetch(&self, request: &PageRequest) -> Result<Page<R>, SourceError>;
}

/// One page of rows with the total row count, when the backend reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    rows: Vec<R>,
    total: Option<u64>,
}

impl<R> Page<R> {
    /// Creates a page without a total count.
    pub fn new(rows: Vec<R>) -> Self {
        Self { rows, total: None }
    }

    /// Sets the total row count.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Returns the rows of this page.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Returns the total row count across all pages, if known.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Consumes the page and returns rows and total.
    pub fn into_parts(self) -> (Vec<R>, Option<u64>) {
        (self.rows, self.total)
    }

    /// Maps every row.
    pub fn map<U, F: FnMut(R) -> U>(self, f: F) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
