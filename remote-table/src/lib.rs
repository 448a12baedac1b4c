//! Remote table controller
//!
//! Query-state management and response reconciliation for server-driven
//! list screens: pagination, sorting, filtering, free-text search,
//! identifier-based multi-selection with bulk actions, and column visibility.
//!
//! The controller never computes over the dataset itself. Every query is
//! delegated to a [`source::DataSource`], and only the response to the most
//! recently issued request is ever applied.

pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod query;
pub mod registry;
pub mod row;
pub mod selection;
pub mod session;
pub mod source;
pub mod view;

pub use config::TableConfig;
pub use controller::ChangeReceiver;
pub use controller::RefreshHandle;
pub use controller::TableController;
pub use controller::TableControllerBuilder;
pub use controller::TableSnapshot;
pub use row::TableRow;
