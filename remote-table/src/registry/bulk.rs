//! Bulk actions run against the selected rows.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::controller::TableController;
use crate::row::TableRow;

type ActionFn<R> = Arc<dyn Fn(Vec<R>, TableController<R>) -> BoxFuture<'static, ()> + Send + Sync>;
type DisabledFn<R> = Arc<dyn Fn(&[R]) -> bool + Send + Sync>;

/// An operation the user triggers against the selected rows.
///
/// The action receives the selected rows that are loaded on the current
/// page, plus the table handle so it can `refresh()` and, when the rows it
/// touched no longer exist, `clear_selection()`. Failures are the action's
/// own business; the table state is not touched on its behalf.
///
/// # Example
///
/// ```ignore
/// BulkAction::new("Valider", |rows, table| async move {
///     api.validate(rows.iter().map(|r| r.key())).await;
///     table.refresh();
/// })
/// .icon("check")
/// .disabled_when(|rows| rows.iter().any(|r| r.value("status") == "validee"))
/// ```
pub struct BulkAction<R: TableRow> {
    pub label: String,
    pub icon: Option<String>,
    action: ActionFn<R>,
    disabled: Option<DisabledFn<R>>,
}

impl<R: TableRow> BulkAction<R> {
    /// Create a new bulk action.
    pub fn new<F, Fut>(label: impl Into<String>, action: F) -> Self
    where
        F: Fn(Vec<R>, TableController<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            label: label.into(),
            icon: None,
            action: Arc::new(move |rows, table| action(rows, table).boxed()),
            disabled: None,
        }
    }

    /// Set the icon name.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Disable the action for selections matching `predicate`.
    pub fn disabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[R]) -> bool + Send + Sync + 'static,
    {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    /// Evaluate the `disabled` predicate for the resolved rows.
    pub fn is_disabled(&self, rows: &[R]) -> bool {
        self.disabled.as_ref().is_some_and(|predicate| predicate(rows))
    }

    /// Run the action.
    pub(crate) fn run(&self, rows: Vec<R>, table: TableController<R>) -> BoxFuture<'static, ()> {
        (self.action)(rows, table)
    }
}

impl<R: TableRow> Clone for BulkAction<R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            icon: self.icon.clone(),
            action: Arc::clone(&self.action),
            disabled: self.disabled.clone(),
        }
    }
}

impl<R: TableRow> fmt::Debug for BulkAction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("label", &self.label)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// A bulk action button as shown in the action bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkActionView {
    /// Position in the registry; pass to `run_bulk_action`.
    pub index: usize,
    pub label: String,
    pub icon: Option<String>,
    pub disabled: bool,
}
