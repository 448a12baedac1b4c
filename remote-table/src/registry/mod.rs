//! Declarative column, filter and bulk-action descriptors.
//!
//! Registries are supplied once at mount and never mutated by the
//! controller; changing them means mounting a new table.

mod bulk;
mod column;
mod filter;

pub use bulk::BulkAction;
pub use bulk::BulkActionView;
pub use column::CellRenderer;
pub use column::ColumnDescriptor;
pub use filter::FilterDescriptor;
pub use filter::FilterKind;
pub use filter::OptionsLoader;
pub use filter::OptionsSource;
pub use filter::OptionsState;
pub use filter::SelectOption;
