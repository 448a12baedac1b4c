//! Presentation model.
//!
//! [`TableView`] is a plain description of what a table screen shows: the
//! toolbar, header, rows, action bar and pagination footer. It is built
//! from a [`TableSnapshot`] and never talks to the controller, so any
//! front-end can draw it. [`text::render`] is the plain-text front-end.

mod cell;
mod pagination;
pub mod text;

use std::hash::Hash;

use chrono::NaiveDate;

pub use cell::Cell;
pub use cell::CellAction;
pub use pagination::PaginationView;

use crate::config::TableConfig;
use crate::controller::RefreshHandle;
use crate::controller::TableSnapshot;
use crate::controller::bulk_bar_for;
use crate::fetch::FetchStatus;
use crate::query::FilterValue;
use crate::query::SortDirection;
use crate::registry::BulkAction;
use crate::registry::BulkActionView;
use crate::registry::ColumnDescriptor;
use crate::registry::FilterDescriptor;
use crate::registry::FilterKind;
use crate::registry::OptionsState;
use crate::registry::SelectOption;
use crate::row::TableRow;
use crate::selection::HeaderCheckbox;

/// A column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub field: String,
    pub label: String,
    pub sortable: bool,
    /// Active direction, `None` unless this is the sorted column.
    pub sort: SortDirection,
    pub width: Option<u16>,
}

impl HeaderCell {
    /// Label with the sort indicator appended when sorted.
    pub fn title(&self) -> String {
        match self.sort {
            SortDirection::None => self.label.clone(),
            dir => format!("{} {}", self.label, dir.indicator()),
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView<K> {
    pub key: K,
    pub selected: bool,
    /// One cell per visible column.
    pub cells: Vec<Cell>,
}

/// Input widget of a filter control.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Text(String),
    Select {
        options: OptionsState,
        /// Chosen option, resolved by value.
        selected: Option<SelectOption>,
    },
    Date(Option<NaiveDate>),
    DateRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

/// A filter in the toolbar.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControl {
    pub field: String,
    pub label: String,
    pub control: Control,
}

impl FilterControl {
    /// Returns `true` if this filter currently constrains the query.
    pub fn is_active(&self) -> bool {
        match &self.control {
            Control::Text(text) => !text.trim().is_empty(),
            Control::Select { selected, .. } => selected.is_some(),
            Control::Date(date) => date.is_some(),
            Control::DateRange { from, to } => from.is_some() || to.is_some(),
        }
    }
}

/// Filters plus the search box.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolbar {
    pub filters: Vec<FilterControl>,
    pub search: String,
    /// The search term has not been fetched yet.
    pub search_pending: bool,
}

impl Toolbar {
    /// Returns `true` if a reset would change anything.
    pub fn can_reset(&self) -> bool {
        !self.search.is_empty() || self.filters.iter().any(FilterControl::is_active)
    }
}

/// Entry of the column chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnToggle {
    pub field: String,
    pub label: String,
    pub visible: bool,
}

/// Everything a table screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView<K> {
    pub toolbar: Toolbar,
    pub columns: Vec<HeaderCell>,
    /// Selection checkbox column, present when bulk actions exist.
    pub header_checkbox: Option<HeaderCheckbox>,
    pub rows: Vec<RowView<K>>,
    pub bulk_bar: Option<Vec<BulkActionView>>,
    pub selected_count: usize,
    pub pagination: PaginationView,
    pub status: FetchStatus,
    /// Loading while previous rows are still shown.
    pub loading_overlay: bool,
    pub error: Option<String>,
    /// Shown instead of rows after a successful empty fetch.
    pub empty_message: Option<String>,
    pub column_toggles: Vec<ColumnToggle>,
}

impl<K: Clone + Eq + Hash> TableView<K> {
    /// Builds the view for `snapshot`.
    pub fn build<R>(
        snapshot: &TableSnapshot<R>,
        columns: &[ColumnDescriptor<R>],
        filters: &[FilterDescriptor],
        bulk_actions: &[BulkAction<R>],
        config: &TableConfig,
        refresh: &RefreshHandle,
    ) -> Self
    where
        R: TableRow<Key = K>,
    {
        let query = &snapshot.query;
        let visible: Vec<&ColumnDescriptor<R>> = columns
            .iter()
            .filter(|column| !snapshot.hidden_columns.contains(&column.field))
            .collect();

        let header = visible
            .iter()
            .map(|column| HeaderCell {
                field: column.field.clone(),
                label: column.label.clone(),
                sortable: column.sortable,
                sort: if query.sort_by() == Some(column.field.as_str()) {
                    query.sort_dir()
                } else {
                    SortDirection::None
                },
                width: column.width,
            })
            .collect();

        let data = snapshot.fetch.data();
        let rows = data
            .iter()
            .map(|row| {
                let key = row.key();
                RowView {
                    selected: snapshot.selection.is_selected(&key),
                    key,
                    cells: visible
                        .iter()
                        .map(|column| column.cell(&row.value(&column.field), row, refresh))
                        .collect(),
                }
            })
            .collect();

        let header_checkbox = if bulk_actions.is_empty() {
            None
        } else {
            Some(snapshot.selection.header_state(&snapshot.visible_keys()))
        };

        let toolbar = Toolbar {
            filters: filters
                .iter()
                .map(|filter| filter_control(filter, snapshot))
                .collect(),
            search: query.search().to_string(),
            search_pending: snapshot.search_pending,
        };

        let status = snapshot.fetch.status();
        let empty_message = (status == FetchStatus::Success && data.is_empty())
            .then(|| config.empty_message.clone());

        Self {
            toolbar,
            columns: header,
            header_checkbox,
            rows,
            bulk_bar: bulk_bar_for(snapshot, bulk_actions),
            selected_count: snapshot.selection.len(),
            pagination: PaginationView::new(
                query,
                snapshot.fetch.total(),
                data.len(),
                &config.page_size_options,
            ),
            status,
            loading_overlay: status == FetchStatus::Loading && !data.is_empty(),
            error: snapshot.fetch.error().map(ToString::to_string),
            empty_message,
            column_toggles: columns
                .iter()
                .filter(|column| column.hideable)
                .map(|column| ColumnToggle {
                    field: column.field.clone(),
                    label: column.label.clone(),
                    visible: !snapshot.hidden_columns.contains(&column.field),
                })
                .collect(),
        }
    }
}

fn filter_control<R: TableRow>(filter: &FilterDescriptor, snapshot: &TableSnapshot<R>) -> FilterControl {
    let value = snapshot.query.filter(&filter.field).cloned().unwrap_or_default();
    let control = match &filter.kind {
        FilterKind::Text => Control::Text(value.display()),
        FilterKind::Select(_) => {
            let options = snapshot
                .filter_options
                .get(&filter.field)
                .cloned()
                .unwrap_or(OptionsState::Loading);
            let selected = options.selected(&value);
            Control::Select { options, selected }
        }
        FilterKind::Date => Control::Date(match value {
            FilterValue::Date(date) => Some(date),
            _ => None,
        }),
        FilterKind::DateRange => match value {
            FilterValue::DateRange { from, to } => Control::DateRange { from, to },
            _ => Control::DateRange { from: None, to: None },
        },
    };
    FilterControl {
        field: filter.field.clone(),
        label: filter.label.clone(),
        control,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::error::SourceError;
    use crate::fetch::FetchState;
    use crate::query::QueryState;
    use crate::selection::Selection;
    use crate::source::JsonRecord;
    use crate::source::Page;
    use crate::source::RecordKey;

    fn record(id: u64, name: &str) -> JsonRecord {
        JsonRecord::from_value(json!({"id": id, "lastName": name, "status": "validee"}), "id")
            .expect("valid record")
    }

    fn snapshot(rows: Vec<JsonRecord>, total: u64) -> TableSnapshot<JsonRecord> {
        let mut fetch = FetchState::new();
        let token = fetch.begin();
        fetch.resolve(token, Ok(Page::new(rows).with_total(total)));
        TableSnapshot {
            query: QueryState::new(10),
            fetch,
            selection: Selection::new(),
            hidden_columns: HashSet::new(),
            filter_options: HashMap::new(),
            search_pending: false,
        }
    }

    fn columns() -> Vec<ColumnDescriptor<JsonRecord>> {
        vec![
            ColumnDescriptor::new("lastName", "Nom").sortable(),
            ColumnDescriptor::new("status", "Statut"),
        ]
    }

    fn build(
        snapshot: &TableSnapshot<JsonRecord>,
        filters: &[FilterDescriptor],
        bulk: &[BulkAction<JsonRecord>],
    ) -> TableView<RecordKey> {
        TableView::build(
            snapshot,
            &columns(),
            filters,
            bulk,
            &TableConfig::default(),
            &RefreshHandle::noop(),
        )
    }

    #[test]
    fn test_rows_and_header() {
        let mut snap = snapshot(vec![record(1, "Dupont"), record(2, "Martin")], 2);
        snap.query.set_sort("lastName");

        let view = build(&snap, &[], &[]);
        assert_eq!(view.columns.len(), 2);
        assert_eq!(view.columns[0].sort, SortDirection::Asc);
        assert_eq!(view.columns[0].title(), "Nom ▲");
        assert_eq!(view.columns[1].title(), "Statut");
        assert_eq!(view.rows[1].cells[0], Cell::text("Martin"));
        assert_eq!(view.header_checkbox, None);
        assert_eq!(view.bulk_bar, None);
        assert_eq!(view.empty_message, None);
    }

    #[test]
    fn test_hidden_column_skipped() {
        let mut snap = snapshot(vec![record(1, "Dupont")], 1);
        snap.hidden_columns.insert("status".into());

        let view = build(&snap, &[], &[]);
        assert_eq!(view.columns.len(), 1);
        assert_eq!(view.rows[0].cells.len(), 1);
        assert!(!view.column_toggles[1].visible);
    }

    #[test]
    fn test_empty_message_only_after_success() {
        let view = build(&snapshot(Vec::new(), 0), &[], &[]);
        assert_eq!(view.empty_message.as_deref(), Some("No data"));

        let mut loading = snapshot(Vec::new(), 0);
        loading.fetch.begin();
        let view = build(&loading, &[], &[]);
        assert_eq!(view.empty_message, None);
        assert!(!view.loading_overlay);
    }

    #[test]
    fn test_loading_overlay_keeps_rows() {
        let mut snap = snapshot(vec![record(1, "Dupont")], 1);
        snap.fetch.begin();
        let view = build(&snap, &[], &[]);
        assert!(view.loading_overlay);
        assert_eq!(view.rows.len(), 1);
    }

    #[test]
    fn test_selection_column_and_bulk_bar() {
        let mut snap = snapshot(vec![record(1, "Dupont"), record(2, "Martin")], 2);
        snap.selection.toggle(RecordKey::from("1"));
        let bulk: [BulkAction<JsonRecord>; 1] =
            [BulkAction::new("Exporter", |_rows, _table| async {})];

        let view = build(&snap, &[], &bulk);
        assert_eq!(view.header_checkbox, Some(HeaderCheckbox::Indeterminate));
        assert!(view.rows[0].selected);
        assert!(!view.rows[1].selected);
        assert_eq!(view.selected_count, 1);
        let bar = view.bulk_bar.expect("bulk bar");
        assert_eq!(bar[0].label, "Exporter");
        assert!(!bar[0].disabled);
    }

    #[test]
    fn test_select_control_keeps_unloaded_value() {
        let mut snap = snapshot(Vec::new(), 0);
        snap.query.set_filter("status", "validee");
        snap.filter_options.insert("status".into(), OptionsState::Loading);
        let filters = [FilterDescriptor::select_remote("status", "Statut", || async {
            Ok::<_, SourceError>(Vec::new())
        })];

        let view = build(&snap, &filters, &[]);
        match &view.toolbar.filters[0].control {
            Control::Select { options, selected } => {
                assert_eq!(options, &OptionsState::Loading);
                assert_eq!(selected.as_ref().map(|o| o.value.as_str()), Some("validee"));
            }
            other => panic!("unexpected control {other:?}"),
        }
        assert!(view.toolbar.can_reset());
    }
}
