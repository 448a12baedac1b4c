//! Rendered cell content.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::row::display_value;

type ActionFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// An interactive cell, e.g. a per-row delete button.
///
/// The callback owns whatever it needs (typically a row id and a
/// [`RefreshHandle`](crate::RefreshHandle)) and is expected to end with a
/// refresh instead of touching table state directly.
#[derive(Clone)]
pub struct CellAction {
    pub label: String,
    run: ActionFn,
}

impl CellAction {
    pub fn new<F, Fut>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            label: label.into(),
            run: Arc::new(move || run().boxed()),
        }
    }

    /// Run the action.
    pub async fn invoke(&self) {
        (self.run)().await
    }
}

impl fmt::Debug for CellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CellAction {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && Arc::ptr_eq(&self.run, &other.run)
    }
}

/// Content of one table cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Action(CellAction),
}

impl Cell {
    /// Plain rendering of a raw JSON value.
    pub fn from_value(value: &Value) -> Self {
        match display_value(value) {
            text if text.is_empty() => Self::Empty,
            text => Self::Text(text),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn action<F, Fut>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Action(CellAction::new(label, run))
    }

    /// Text shown for this cell; actions show their label in brackets.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Action(action) => format!("[{}]", action.label),
        }
    }

    pub fn as_action(&self) -> Option<&CellAction> {
        match self {
            Self::Action(action) => Some(action),
            _ => None,
        }
    }
}
