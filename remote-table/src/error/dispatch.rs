//! Bulk action dispatch errors

/// Reasons a bulk action could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No action is registered at this index.
    #[error("no bulk action at index {0}")]
    UnknownAction(usize),

    /// Nothing is selected on the loaded page.
    #[error("no selected rows are loaded")]
    NothingSelected,

    /// The action's `disabled` predicate rejected the current selection.
    #[error("bulk action '{0}' is disabled for the current selection")]
    Disabled(String),

    /// The controller has been unmounted.
    #[error("table has been unmounted")]
    Unmounted,
}
