//! The table controller.
//!
//! [`TableController`] owns the query, fetch and selection state of one
//! table instance and is the only thing a listing screen talks to. It is a
//! cheap-to-clone handle; every clone drives the same instance.
//!
//! Fetch ordering: every issued request takes a fresh token from
//! [`FetchState::begin`], and a response is applied only while its token is
//! still the latest. Earlier requests that resolve late are dropped.

mod builder;
mod notify;

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;

pub use builder::TableControllerBuilder;
pub use notify::ChangeReceiver;
use notify::ChangeNotifier;

use crate::config::TableConfig;
use crate::error::DispatchError;
use crate::error::FetchError;
use crate::error::SourceError;
use crate::fetch::FetchState;
use crate::fetch::FetchStatus;
use crate::fetch::RequestToken;
use crate::fetch::Resolution;
use crate::query::FilterValue;
use crate::query::QueryState;
use crate::registry::BulkAction;
use crate::registry::BulkActionView;
use crate::registry::ColumnDescriptor;
use crate::registry::FilterDescriptor;
use crate::registry::OptionsState;
use crate::row::TableRow;
use crate::selection::HeaderCheckbox;
use crate::selection::Selection;
use crate::session::SessionGuard;
use crate::source::DataSource;
use crate::source::Page;
use crate::view::TableView;

/// Unique identifier for a mounted table, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

impl TableId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table-{}", self.0)
    }
}

/// Handle given to cell renderers to re-fetch the table.
///
/// Holds only a weak reference; refreshing an unmounted or dropped table
/// does nothing.
#[derive(Clone)]
pub struct RefreshHandle {
    refresh: Arc<dyn Fn() + Send + Sync>,
}

impl RefreshHandle {
    /// Create a handle from a refresh callback.
    pub fn new(refresh: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            refresh: Arc::new(refresh),
        }
    }

    /// A handle that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Re-fetch the current query.
    pub fn refresh(&self) {
        (self.refresh)()
    }
}

impl fmt::Debug for RefreshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshHandle")
    }
}

/// A consistent copy of a table's state, taken under one lock.
#[derive(Debug, Clone)]
pub struct TableSnapshot<R: TableRow> {
    pub query: QueryState,
    pub fetch: FetchState<R>,
    pub selection: Selection<R::Key>,
    pub hidden_columns: HashSet<String>,
    pub filter_options: HashMap<String, OptionsState>,
    /// A search term is waiting for its debounce window.
    pub search_pending: bool,
}

impl<R: TableRow> TableSnapshot<R> {
    /// Keys of the rows on the loaded page.
    pub fn visible_keys(&self) -> Vec<R::Key> {
        self.fetch.data().iter().map(TableRow::key).collect()
    }

    /// Selected rows that are loaded on the current page, in page order.
    pub fn selected_rows(&self) -> Vec<R> {
        self.fetch
            .data()
            .iter()
            .filter(|row| self.selection.is_selected(&row.key()))
            .cloned()
            .collect()
    }
}

pub(crate) struct OptionsSlot {
    state: OptionsState,
    generation: u64,
}

pub(crate) struct TableState<R: TableRow> {
    query: QueryState,
    fetch: FetchState<R>,
    selection: Selection<R::Key>,
    hidden_columns: HashSet<String>,
    options: HashMap<String, OptionsSlot>,
}

struct PendingSearch {
    generation: u64,
    cancel: CancellationToken,
}

pub(crate) struct ControllerInner<R: TableRow> {
    id: TableId,
    source: Arc<dyn DataSource<R>>,
    columns: Arc<[ColumnDescriptor<R>]>,
    filters: Arc<[FilterDescriptor]>,
    bulk_actions: Arc<[BulkAction<R>]>,
    config: TableConfig,
    session: Option<Arc<dyn SessionGuard>>,
    state: RwLock<TableState<R>>,
    changes: ChangeNotifier,
    pending_search: Mutex<Option<PendingSearch>>,
    search_generation: AtomicU64,
    unmounted: CancellationToken,
}

impl<R: TableRow> Drop for ControllerInner<R> {
    fn drop(&mut self) {
        self.unmounted.cancel();
    }
}

/// Controller for one remote table instance.
///
/// Mutators never block and never fail: they update state, notify
/// subscribers and schedule a fetch when the query changed. Fetches run as
/// tokio tasks; a table must be mounted inside a tokio runtime. Spawned
/// tasks hold the table weakly, so dropping the last handle acts like
/// [`unmount`](Self::unmount).
pub struct TableController<R: TableRow> {
    inner: Arc<ControllerInner<R>>,
}

impl<R: TableRow> Clone for TableController<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: TableRow> fmt::Debug for TableController<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableController")
            .field("id", &self.inner.id)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

impl<R: TableRow> TableController<R> {
    /// Creates a new builder for mounting a table over `source`.
    pub fn builder(source: impl DataSource<R> + 'static) -> TableControllerBuilder<R> {
        TableControllerBuilder::new(source)
    }

    pub fn id(&self) -> TableId {
        self.inner.id
    }

    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.inner.columns
    }

    pub fn filters(&self) -> &[FilterDescriptor] {
        &self.inner.filters
    }

    pub fn bulk_actions(&self) -> &[BulkAction<R>] {
        &self.inner.bulk_actions
    }

    pub fn is_mounted(&self) -> bool {
        !self.inner.unmounted.is_cancelled()
    }

    // -------------------------------------------------------------------------
    // State access
    // -------------------------------------------------------------------------

    fn read(&self) -> RwLockReadGuard<'_, TableState<R>> {
        self.inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableState<R>> {
        self.inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingSearch>> {
        self.inner
            .pending_search
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take a consistent copy of the whole state.
    pub fn snapshot(&self) -> TableSnapshot<R> {
        let search_pending = self.pending().is_some();
        let state = self.read();
        TableSnapshot {
            query: state.query.clone(),
            fetch: state.fetch.clone(),
            selection: state.selection.clone(),
            hidden_columns: state.hidden_columns.clone(),
            filter_options: state
                .options
                .iter()
                .map(|(field, slot)| (field.clone(), slot.state.clone()))
                .collect(),
            search_pending,
        }
    }

    /// Build the presentation model for the current state.
    pub fn view(&self) -> TableView<R::Key> {
        TableView::build(
            &self.snapshot(),
            &self.inner.columns,
            &self.inner.filters,
            &self.inner.bulk_actions,
            &self.inner.config,
            &self.refresh_handle(),
        )
    }

    pub fn query(&self) -> QueryState {
        self.read().query.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.read().fetch.status()
    }

    /// Rows of the current page.
    pub fn data(&self) -> Vec<R> {
        self.read().fetch.data().to_vec()
    }

    pub fn total(&self) -> Option<u64> {
        self.read().fetch.total()
    }

    pub fn error(&self) -> Option<FetchError> {
        self.read().fetch.error().cloned()
    }

    /// Subscribe to state changes, e.g. to redraw.
    pub fn subscribe(&self) -> ChangeReceiver {
        self.inner.changes.subscribe()
    }

    /// A weak refresh callback for renderers and out-of-band mutations.
    pub fn refresh_handle(&self) -> RefreshHandle {
        let weak = self.downgrade();
        RefreshHandle::new(move || {
            if let Some(table) = Self::upgrade(&weak) {
                table.refresh();
            }
        })
    }

    fn downgrade(&self) -> Weak<ControllerInner<R>> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<ControllerInner<R>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Resolves once no fetch is loading and no search is waiting for its
    /// debounce window, or once the table is unmounted.
    pub async fn settled(&self) {
        let mut changes = self.subscribe();
        loop {
            if self.is_settled() {
                return;
            }
            if changes.recv().await.is_none() {
                return;
            }
        }
    }

    fn is_settled(&self) -> bool {
        !self.is_mounted() || (self.pending().is_none() && !self.read().fetch.is_loading())
    }

    // -------------------------------------------------------------------------
    // Query mutators
    // -------------------------------------------------------------------------

    /// Go to page `page` (1-based). Filters, sort and search are kept.
    pub fn set_page(&self, page: u32) {
        if self.update_query(|query| query.set_page(page)) {
            self.fetch_now();
        }
    }

    /// Change the page size; returns to page 1.
    pub fn set_page_size(&self, page_size: u32) {
        if self.update_query(|query| query.set_page_size(page_size)) {
            self.fetch_now();
        }
    }

    /// Sort by `field`, cycling `asc → desc → none` on repeated calls.
    ///
    /// Registered columns that are not sortable are ignored.
    pub fn set_sort(&self, field: &str) {
        let not_sortable = self
            .inner
            .columns
            .iter()
            .any(|column| column.field == field && !column.sortable);
        if not_sortable {
            log::debug!("{}: ignoring sort on non-sortable column '{}'", self.id(), field);
            return;
        }
        if self.update_query(|query| query.set_sort(field)) {
            self.fetch_now();
        }
    }

    /// Set a filter; an empty value clears it. Returns to page 1.
    pub fn set_filter(&self, field: &str, value: impl Into<FilterValue>) {
        let value = value.into();
        if !self.inner.filters.iter().any(|filter| filter.field == field) {
            log::debug!("{}: filter '{}' is not registered", self.id(), field);
        }
        if self.update_query(|query| query.set_filter(field, value)) {
            self.fetch_now();
        }
    }

    /// Set the search term. State updates immediately; the fetch waits for
    /// the debounce window.
    pub fn set_search(&self, text: &str) {
        if self.update_query(|query| query.set_search(text)) {
            self.schedule_search_fetch();
        }
    }

    /// Clear every filter and the search term. Returns to page 1.
    pub fn reset_filters(&self) {
        if self.update_query(QueryState::reset_filters) {
            self.fetch_now();
        }
    }

    /// Re-fetch the current query. Does not touch the selection.
    pub fn refresh(&self) {
        if self.is_mounted() {
            self.fetch_now();
        }
    }

    fn update_query<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut QueryState) -> bool,
    {
        if !self.is_mounted() {
            return false;
        }
        let changed = f(&mut self.write().query);
        if changed {
            self.inner.changes.notify();
        }
        changed
    }

    // -------------------------------------------------------------------------
    // Fetch orchestration
    // -------------------------------------------------------------------------

    /// An immediate fetch carries the latest search term, so it replaces any
    /// pending debounced one.
    fn fetch_now(&self) {
        self.cancel_pending_search();
        self.issue_fetch();
    }

    fn issue_fetch(&self) {
        if !self.is_mounted() {
            return;
        }

        let (token, request) = {
            let mut state = self.write();
            (state.fetch.begin(), state.query.to_request())
        };
        log::debug!(
            "{}: request #{} page={} size={} sort={:?} filters={} search={:?}",
            self.id(),
            token.value(),
            request.page,
            request.page_size,
            request.sort,
            request.filters.len(),
            request.search
        );
        self.inner.changes.notify();

        let source = Arc::clone(&self.inner.source);
        let unmounted = self.inner.unmounted.clone();
        let weak = self.downgrade();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = unmounted.cancelled() => return,
                result = source.fetch(&request) => result,
            };
            if let Some(table) = Self::upgrade(&weak) {
                table.apply(token, result);
            }
        });
    }

    fn apply(&self, token: RequestToken, result: Result<Page<R>, SourceError>) {
        let unauthorized = match &result {
            Err(err) if err.is_unauthorized() => Some(FetchError::from(err)),
            _ => None,
        };
        let failure = result.as_ref().err().map(ToString::to_string);

        let resolution = self.write().fetch.resolve(token, result);
        match resolution {
            Resolution::Stale => {
                log::debug!("{}: discarding stale response #{}", self.id(), token.value());
            }
            Resolution::Applied => {
                if let Some(failure) = failure {
                    log::warn!("{}: request #{} failed: {}", self.id(), token.value(), failure);
                }
                if let (Some(error), Some(session)) = (unauthorized, &self.inner.session) {
                    session.unauthorized(&error);
                }
                self.inner.changes.notify();
            }
        }
    }

    fn schedule_search_fetch(&self) {
        let delay = self.inner.config.search_debounce;
        if delay.is_zero() {
            self.fetch_now();
            return;
        }

        let generation = self.inner.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.inner.unmounted.child_token();
        let previous = self.pending().replace(PendingSearch {
            generation,
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        let weak = self.downgrade();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let Some(table) = Self::upgrade(&weak) else { return };
                    if table.take_pending_search(generation) {
                        table.issue_fetch();
                    }
                }
            }
        });
    }

    fn take_pending_search(&self, generation: u64) -> bool {
        let mut pending = self.pending();
        if pending.as_ref().is_some_and(|p| p.generation == generation) {
            pending.take();
            true
        } else {
            false
        }
    }

    fn cancel_pending_search(&self) {
        if let Some(pending) = self.pending().take() {
            pending.cancel.cancel();
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Select or deselect one row by key, on any page.
    pub fn toggle_row(&self, key: R::Key) {
        if !self.is_mounted() {
            return;
        }
        self.write().selection.toggle(key);
        self.inner.changes.notify();
    }

    /// Select every row of the loaded page, or deselect them all if they
    /// are all selected already.
    pub fn toggle_all_visible(&self) {
        if !self.is_mounted() {
            return;
        }
        {
            let mut state = self.write();
            let visible: Vec<R::Key> = state.fetch.data().iter().map(TableRow::key).collect();
            state.selection.toggle_all_visible(&visible);
        }
        self.inner.changes.notify();
    }

    /// Deselect everything, on every page.
    pub fn clear_selection(&self) {
        if self.write().selection.clear() {
            self.inner.changes.notify();
        }
    }

    pub fn selected_ids(&self) -> HashSet<R::Key> {
        self.read().selection.keys().clone()
    }

    pub fn is_selected(&self, key: &R::Key) -> bool {
        self.read().selection.is_selected(key)
    }

    /// Selected rows that are loaded on the current page.
    pub fn selected_rows(&self) -> Vec<R> {
        let state = self.read();
        state
            .fetch
            .data()
            .iter()
            .filter(|row| state.selection.is_selected(&row.key()))
            .cloned()
            .collect()
    }

    pub fn all_visible_selected(&self) -> bool {
        self.header_checkbox() == HeaderCheckbox::Checked
    }

    pub fn some_visible_selected(&self) -> bool {
        self.header_checkbox() == HeaderCheckbox::Indeterminate
    }

    pub fn header_checkbox(&self) -> HeaderCheckbox {
        let state = self.read();
        let visible: Vec<R::Key> = state.fetch.data().iter().map(TableRow::key).collect();
        state.selection.header_state(&visible)
    }

    // -------------------------------------------------------------------------
    // Bulk actions
    // -------------------------------------------------------------------------

    /// The action bar, shown only when something is selected and at least
    /// one bulk action is registered.
    pub fn bulk_bar(&self) -> Option<Vec<BulkActionView>> {
        let snapshot = self.snapshot();
        bulk_bar_for(&snapshot, &self.inner.bulk_actions)
    }

    /// Run bulk action `index` against the selected rows of the loaded page.
    ///
    /// The action's own failures are not observed here.
    pub async fn run_bulk_action(&self, index: usize) -> Result<(), DispatchError> {
        if !self.is_mounted() {
            return Err(DispatchError::Unmounted);
        }
        let action = self
            .inner
            .bulk_actions
            .get(index)
            .cloned()
            .ok_or(DispatchError::UnknownAction(index))?;

        let rows = self.selected_rows();
        if rows.is_empty() {
            return Err(DispatchError::NothingSelected);
        }
        if action.is_disabled(&rows) {
            return Err(DispatchError::Disabled(action.label.clone()));
        }

        log::info!(
            "{}: running bulk action '{}' on {} rows",
            self.id(),
            action.label,
            rows.len()
        );
        action.run(rows, self.clone()).await;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Column visibility
    // -------------------------------------------------------------------------

    /// Show or hide a hideable column. Returns `true` if visibility changed.
    pub fn set_column_visible(&self, field: &str, visible: bool) -> bool {
        let hideable = self
            .inner
            .columns
            .iter()
            .any(|column| column.field == field && column.hideable);
        if !hideable || !self.is_mounted() {
            return false;
        }

        let changed = {
            let mut state = self.write();
            if visible {
                state.hidden_columns.remove(field)
            } else {
                state.hidden_columns.insert(field.to_string())
            }
        };
        if changed {
            self.inner.changes.notify();
        }
        changed
    }

    /// Flip a hideable column's visibility.
    pub fn toggle_column(&self, field: &str) -> bool {
        let visible = self.is_column_visible(field);
        self.set_column_visible(field, !visible)
    }

    pub fn is_column_visible(&self, field: &str) -> bool {
        !self.read().hidden_columns.contains(field)
    }

    /// Visible column fields, in registry order.
    pub fn visible_columns(&self) -> Vec<String> {
        let state = self.read();
        self.inner
            .columns
            .iter()
            .filter(|column| !state.hidden_columns.contains(&column.field))
            .map(|column| column.field.clone())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Select options
    // -------------------------------------------------------------------------

    /// Options state of a select filter.
    pub fn filter_options(&self, field: &str) -> Option<OptionsState> {
        self.read().options.get(field).map(|slot| slot.state.clone())
    }

    /// Re-run a remote select filter's loader. The chosen filter value is
    /// kept whatever the outcome.
    pub fn reload_options(&self, field: &str) {
        if !self.is_mounted() {
            return;
        }
        let Some(loader) = self
            .inner
            .filters
            .iter()
            .find(|filter| filter.field == field)
            .and_then(FilterDescriptor::loader)
        else {
            return;
        };

        let generation = {
            let mut state = self.write();
            let slot = state
                .options
                .entry(field.to_string())
                .or_insert(OptionsSlot {
                    state: OptionsState::Loading,
                    generation: 0,
                });
            slot.generation += 1;
            slot.state = OptionsState::Loading;
            slot.generation
        };
        self.inner.changes.notify();

        let unmounted = self.inner.unmounted.clone();
        let weak = self.downgrade();
        let field = field.to_string();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = unmounted.cancelled() => return,
                result = loader.load() => result,
            };
            let Some(this) = Self::upgrade(&weak) else { return };

            let applied = {
                let mut state = this.write();
                match state.options.get_mut(&field) {
                    Some(slot) if slot.generation == generation => {
                        slot.state = match result {
                            Ok(options) => OptionsState::Ready(options),
                            Err(err) => {
                                log::warn!(
                                    "{}: loading options for '{}' failed: {}",
                                    this.id(),
                                    field,
                                    err
                                );
                                OptionsState::Error(FetchError::from(&err).message)
                            }
                        };
                        true
                    }
                    _ => false,
                }
            };
            if applied {
                this.inner.changes.notify();
            }
        });
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Tear the table down: pending fetches, debounce timers and option
    /// loaders are voided, and every later mutation is ignored.
    pub fn unmount(&self) {
        if !self.is_mounted() {
            return;
        }
        self.inner.unmounted.cancel();
        self.pending().take();
        self.write().fetch.invalidate();
        log::info!("Unmounted table {}", self.id());
        self.inner.changes.notify();
    }
}

pub(crate) fn bulk_bar_for<R: TableRow>(
    snapshot: &TableSnapshot<R>,
    actions: &[BulkAction<R>],
) -> Option<Vec<BulkActionView>> {
    if snapshot.selection.is_empty() || actions.is_empty() {
        return None;
    }
    let rows = snapshot.selected_rows();
    Some(
        actions
            .iter()
            .enumerate()
            .map(|(index, action)| BulkActionView {
                index,
                label: action.label.clone(),
                icon: action.icon.clone(),
                disabled: rows.is_empty() || action.is_disabled(&rows),
            })
            .collect(),
    )
}
