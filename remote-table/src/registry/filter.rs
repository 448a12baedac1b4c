//! Filter descriptors and select option sources.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::query::FilterValue;

/// One entry of a select filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Loads select options after mount, e.g. from a secondary endpoint.
#[async_trait]
pub trait OptionsLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<SelectOption>, SourceError>;
}

#[async_trait]
impl<F, Fut> OptionsLoader for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<SelectOption>, SourceError>> + Send + 'static,
{
    async fn load(&self) -> Result<Vec<SelectOption>, SourceError> {
        self().await
    }
}

/// Where a select filter's options come from.
#[derive(Clone)]
pub enum OptionsSource {
    /// Known at mount.
    Static(Vec<SelectOption>),
    /// Loaded asynchronously after mount.
    Remote(Arc<dyn OptionsLoader>),
}

impl fmt::Debug for OptionsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(options) => f.debug_tuple("Static").field(options).finish(),
            Self::Remote(_) => f.write_str("Remote(..)"),
        }
    }
}

/// Loading state of a select filter's options.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionsState {
    Loading,
    Ready(Vec<SelectOption>),
    Error(String),
}

impl OptionsState {
    /// Returns the options if ready.
    pub fn options(&self) -> &[SelectOption] {
        match self {
            Self::Ready(options) => options,
            _ => &[],
        }
    }

    /// Resolves the chosen filter value against the options by value.
    ///
    /// A value with no matching option (options still loading, or the
    /// value is no longer offered) is kept as-is with its raw value as label.
    pub fn selected(&self, value: &FilterValue) -> Option<SelectOption> {
        let raw = value.as_option_value()?;
        if raw.is_empty() {
            return None;
        }
        Some(
            self.options()
                .iter()
                .find(|option| option.value == raw)
                .cloned()
                .unwrap_or_else(|| SelectOption::new(raw.clone(), raw)),
        )
    }
}

/// Widget type of a filter.
#[derive(Debug, Clone)]
pub enum FilterKind {
    /// Free text.
    Text,
    /// Single choice among options.
    Select(OptionsSource),
    /// A single day.
    Date,
    /// A day range with optional bounds.
    DateRange,
}

/// A toolbar filter definition.
#[derive(Debug, Clone)]
pub struct FilterDescriptor {
    /// Backend query parameter name.
    pub field: String,
    /// Control label.
    pub label: String,
    pub kind: FilterKind,
}

impl FilterDescriptor {
    /// A free-text filter.
    pub fn text(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(field, label, FilterKind::Text)
    }

    /// A select filter with options known at mount.
    pub fn select(
        field: impl Into<String>,
        label: impl Into<String>,
        options: impl IntoIterator<Item = SelectOption>,
    ) -> Self {
        Self::new(
            field,
            label,
            FilterKind::Select(OptionsSource::Static(options.into_iter().collect())),
        )
    }

    /// A select filter whose options are loaded after mount.
    pub fn select_remote(
        field: impl Into<String>,
        label: impl Into<String>,
        loader: impl OptionsLoader + 'static,
    ) -> Self {
        Self::new(
            field,
            label,
            FilterKind::Select(OptionsSource::Remote(Arc::new(loader))),
        )
    }

    /// A single-day filter.
    pub fn date(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(field, label, FilterKind::Date)
    }

    /// A day-range filter.
    pub fn date_range(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(field, label, FilterKind::DateRange)
    }

    fn new(field: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            kind,
        }
    }

    /// The remote loader, for remote select filters.
    pub fn loader(&self) -> Option<Arc<dyn OptionsLoader>> {
        match &self.kind {
            FilterKind::Select(OptionsSource::Remote(loader)) => Some(Arc::clone(loader)),
            _ => None,
        }
    }

    /// Options state at mount: ready for static selects, loading for remote.
    pub fn initial_options(&self) -> Option<OptionsState> {
        match &self.kind {
            FilterKind::Select(OptionsSource::Static(options)) => {
                Some(OptionsState::Ready(options.clone()))
            }
            FilterKind::Select(OptionsSource::Remote(_)) => Some(OptionsState::Loading),
            _ => None,
        }
    }
}
