//! Plain-text rendering of a [`TableView`].

use std::fmt::Write;

use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use super::Control;
use super::TableView;
use crate::fetch::FetchStatus;
use crate::registry::OptionsState;
use crate::selection::HeaderCheckbox;

const MAX_COLUMN_WIDTH: usize = 40;
const COLUMN_GAP: &str = "  ";

/// Display width of `s` in terminal cells.
pub fn display_width(s: &str) -> usize {
    s.width()
}

/// Truncate `s` to `max_width` cells, ending with `…` when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let target = max_width - 1;
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > target {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push('…');
    result
}

/// Left-align `s` in a field `width` cells wide.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let text = truncate_to_width(s, width);
    let padding = width.saturating_sub(display_width(&text));
    format!("{text}{}", " ".repeat(padding))
}

fn checkbox(state: HeaderCheckbox) -> &'static str {
    match state {
        HeaderCheckbox::Unchecked => "[ ]",
        HeaderCheckbox::Indeterminate => "[-]",
        HeaderCheckbox::Checked => "[x]",
    }
}

/// Render the whole table as aligned text lines.
pub fn render<K>(view: &TableView<K>) -> String {
    let mut out = String::new();
    render_toolbar(view, &mut out);
    if let Some(bar) = &view.bulk_bar {
        let actions: Vec<String> = bar
            .iter()
            .map(|action| {
                let label = match &action.icon {
                    Some(icon) => format!("{icon} {}", action.label),
                    None => action.label.clone(),
                };
                if action.disabled {
                    format!("{}:({label})", action.index)
                } else {
                    format!("{}:[{label}]", action.index)
                }
            })
            .collect();
        let _ = writeln!(out, "{} selected  {}", view.selected_count, actions.join(" "));
    }

    let titles: Vec<String> = view.columns.iter().map(|column| column.title()).collect();
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|cell| cell.display()).collect())
        .collect();

    let widths: Vec<usize> = view
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match column.width {
            Some(width) => usize::from(width),
            None => cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| display_width(cell))
                .chain(std::iter::once(display_width(&titles[i])))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH),
        })
        .collect();

    let selectable = view.header_checkbox.is_some();
    let mut header: Vec<String> = Vec::new();
    if let Some(state) = view.header_checkbox {
        header.push(checkbox(state).to_string());
    }
    header.extend(titles.iter().zip(&widths).map(|(title, &width)| pad_to_width(title, width)));
    push_line(&mut out, &header);

    let rule_width = widths.iter().sum::<usize>()
        + COLUMN_GAP.len() * widths.len().saturating_sub(1)
        + if selectable { 3 + COLUMN_GAP.len() } else { 0 };
    let _ = writeln!(out, "{}", "─".repeat(rule_width));

    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {error}");
    }

    if view.rows.is_empty() {
        match (&view.empty_message, view.status) {
            (Some(message), _) => {
                let _ = writeln!(out, "{message}");
            }
            (None, FetchStatus::Loading | FetchStatus::Idle) => {
                let _ = writeln!(out, "Loading…");
            }
            (None, _) => {}
        }
    }

    for (row, row_cells) in view.rows.iter().zip(&cells) {
        let mut line: Vec<String> = Vec::new();
        if selectable {
            line.push(if row.selected { "[x]" } else { "[ ]" }.to_string());
        }
        line.extend(row_cells.iter().zip(&widths).map(|(cell, &width)| pad_to_width(cell, width)));
        push_line(&mut out, &line);
    }

    if view.loading_overlay {
        let _ = writeln!(out, "Loading…");
    }

    let pagination = &view.pagination;
    let page_count = pagination
        .page_count()
        .map(|count| count.to_string())
        .unwrap_or_else(|| "?".to_string());
    let sizes: Vec<String> = pagination
        .page_size_options
        .iter()
        .map(|&size| {
            if size == pagination.page_size {
                format!("[{size}]")
            } else {
                size.to_string()
            }
        })
        .collect();
    let _ = writeln!(
        out,
        "{} {} page {}/{} {}  size {}",
        if pagination.has_previous() { "<" } else { " " },
        pagination.summary(),
        pagination.page,
        page_count,
        if pagination.has_next() { ">" } else { " " },
        sizes.join(" ")
    );
    out
}

fn render_toolbar<K>(view: &TableView<K>, out: &mut String) {
    let mut parts: Vec<String> = Vec::new();
    for filter in &view.toolbar.filters {
        let value = match &filter.control {
            Control::Text(text) => text.clone(),
            Control::Select { options, selected } => {
                let chosen = selected.as_ref().map(|o| o.label.clone()).unwrap_or_default();
                match options {
                    OptionsState::Loading => format!("{chosen} (loading)"),
                    OptionsState::Error(message) => format!("{chosen} (error: {message})"),
                    OptionsState::Ready(_) => chosen,
                }
            }
            Control::Date(date) => date.map(|d| d.to_string()).unwrap_or_default(),
            Control::DateRange { from, to } => match (from, to) {
                (None, None) => String::new(),
                _ => format!(
                    "{}..{}",
                    from.map(|d| d.to_string()).unwrap_or_default(),
                    to.map(|d| d.to_string()).unwrap_or_default()
                ),
            },
        };
        parts.push(format!("{}: {}", filter.label, value.trim()));
    }

    let pending = if view.toolbar.search_pending { "…" } else { "" };
    parts.push(format!("Search: {}{pending}", view.toolbar.search));
    let _ = writeln!(out, "{}", parts.join(" | "));
}

fn push_line(out: &mut String, cells: &[String]) {
    let _ = writeln!(out, "{}", cells.join(COLUMN_GAP).trim_end());
}
