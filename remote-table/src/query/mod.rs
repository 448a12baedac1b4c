//! Query state for one table instance.
//!
//! # Types
//!
//! - [`QueryState`] - page, page size, sort, filters and search term
//! - [`SortDirection`] - the `asc → desc → none` sort cycle
//! - [`FilterValue`] - a single filter's value (text, number, date, range)
//! - [`PageRequest`] - the immutable request built from a query state

mod filter;
mod order;
mod request;
mod state;

pub use filter::FilterValue;
pub use order::SortDirection;
pub use request::PageRequest;
pub use request::Pagination;
pub use state::QueryState;
