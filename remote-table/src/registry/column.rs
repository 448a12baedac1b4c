//! Column descriptors.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::controller::RefreshHandle;
use crate::view::Cell;

/// Renders a cell from `(value, row, refresh)`.
///
/// Renderers are pure; side effects go inside a [`Cell::Action`] and must
/// finish by calling `refresh.refresh()` instead of mutating local state.
pub type CellRenderer<R> = Arc<dyn Fn(&Value, &R, &RefreshHandle) -> Cell + Send + Sync>;

/// A table column definition.
pub struct ColumnDescriptor<R> {
    /// Row field, or a synthetic key such as `"actions"`.
    pub field: String,
    /// Header text.
    pub label: String,
    /// Whether clicking the header sorts by this field.
    pub sortable: bool,
    /// Fixed width hint in characters.
    pub width: Option<u16>,
    /// Hidden at mount.
    pub hidden: bool,
    /// Whether the user may show/hide this column.
    pub hideable: bool,
    render: Option<CellRenderer<R>>,
}

impl<R> ColumnDescriptor<R> {
    /// Create a new column showing the raw value of `field`.
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            sortable: false,
            width: None,
            hidden: false,
            hideable: true,
            render: None,
        }
    }

    /// Make the column sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Set a fixed width for this column.
    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    /// Start hidden; the user can show it from the column menu.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Always visible.
    pub fn pinned(mut self) -> Self {
        self.hideable = false;
        self.hidden = false;
        self
    }

    /// Use a custom cell renderer.
    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value, &R, &RefreshHandle) -> Cell + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Returns `true` if a custom renderer is set.
    pub fn has_renderer(&self) -> bool {
        self.render.is_some()
    }

    /// Render the cell for `row`, falling back to the raw value.
    pub fn cell(&self, value: &Value, row: &R, refresh: &RefreshHandle) -> Cell {
        match &self.render {
            Some(render) => render(value, row, refresh),
            None => Cell::from_value(value),
        }
    }
}

impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            width: self.width,
            hidden: self.hidden,
            hideable: self.hideable,
            render: self.render.clone(),
        }
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("field", &self.field)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("width", &self.width)
            .field("hidden", &self.hidden)
            .field("hideable", &self.hideable)
            .field("render", &self.render.is_some())
            .finish()
    }
}
