//! Mounting a table instance.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;

use tokio_util::sync::CancellationToken;

use super::ControllerInner;
use super::OptionsSlot;
use super::TableController;
use super::TableId;
use super::TableState;
use super::notify::ChangeNotifier;
use crate::config::TableConfig;
use crate::fetch::FetchState;
use crate::query::QueryState;
use crate::registry::BulkAction;
use crate::registry::ColumnDescriptor;
use crate::registry::FilterDescriptor;
use crate::row::TableRow;
use crate::selection::Selection;
use crate::session::SessionGuard;
use crate::source::DataSource;

/// Builder for mounting a [`TableController`].
///
/// # Example
///
/// ```ignore
/// let table = TableController::builder(source)
///     .columns([
///         ColumnDescriptor::new("lastName", "Nom").sortable(),
///         ColumnDescriptor::new("status", "Statut"),
///     ])
///     .filters([FilterDescriptor::select("status", "Statut", statuses)])
///     .bulk_actions([export_action])
///     .config(TableConfig::default().with_page_size(25))
///     .mount();
/// ```
pub struct TableControllerBuilder<R: TableRow> {
    source: Arc<dyn DataSource<R>>,
    columns: Vec<ColumnDescriptor<R>>,
    filters: Vec<FilterDescriptor>,
    bulk_actions: Vec<BulkAction<R>>,
    config: TableConfig,
    session: Option<Arc<dyn SessionGuard>>,
}

impl<R: TableRow> TableControllerBuilder<R> {
    pub(crate) fn new(source: impl DataSource<R> + 'static) -> Self {
        Self {
            source: Arc::new(source),
            columns: Vec::new(),
            filters: Vec::new(),
            bulk_actions: Vec::new(),
            config: TableConfig::default(),
            session: None,
        }
    }

    /// Sets the column registry, in display order.
    pub fn columns(mut self, columns: impl IntoIterator<Item = ColumnDescriptor<R>>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Sets the filter registry, in toolbar order.
    pub fn filters(mut self, filters: impl IntoIterator<Item = FilterDescriptor>) -> Self {
        self.filters = filters.into_iter().collect();
        self
    }

    /// Sets the bulk actions; enables the selection column when non-empty.
    pub fn bulk_actions(mut self, actions: impl IntoIterator<Item = BulkAction<R>>) -> Self {
        self.bulk_actions = actions.into_iter().collect();
        self
    }

    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Receives 401/403 failures.
    pub fn session(mut self, session: impl SessionGuard + 'static) -> Self {
        self.session = Some(Arc::new(session));
        self
    }

    /// Mounts the table: starts option loaders and the initial fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(self) -> TableController<R> {
        let hidden_columns: HashSet<String> = self
            .columns
            .iter()
            .filter(|column| column.hidden && column.hideable)
            .map(|column| column.field.clone())
            .collect();

        let options: HashMap<String, OptionsSlot> = self
            .filters
            .iter()
            .filter_map(|filter| {
                filter.initial_options().map(|state| {
                    (
                        filter.field.clone(),
                        OptionsSlot {
                            state,
                            generation: 0,
                        },
                    )
                })
            })
            .collect();

        let state = TableState {
            query: QueryState::new(self.config.page_size),
            fetch: FetchState::new(),
            selection: Selection::new(),
            hidden_columns,
            options,
        };

        let controller = TableController {
            inner: Arc::new(ControllerInner {
                id: TableId::new(),
                source: self.source,
                columns: self.columns.into(),
                filters: self.filters.into(),
                bulk_actions: self.bulk_actions.into(),
                config: self.config,
                session: self.session,
                state: RwLock::new(state),
                changes: ChangeNotifier::new(),
                pending_search: Mutex::new(None),
                search_generation: AtomicU64::new(0),
                unmounted: CancellationToken::new(),
            }),
        };

        log::info!(
            "Mounted table {} ({} columns, {} filters, {} bulk actions)",
            controller.id(),
            controller.inner.columns.len(),
            controller.inner.filters.len(),
            controller.inner.bulk_actions.len()
        );

        let remote_fields: Vec<String> = controller
            .inner
            .filters
            .iter()
            .filter(|filter| filter.loader().is_some())
            .map(|filter| filter.field.clone())
            .collect();
        for field in remote_fields {
            controller.reload_options(&field);
        }

        controller.issue_fetch();
        controller
    }
}
