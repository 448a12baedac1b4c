//! Identifier-based row selection.
//!
//! Rows are replaced on every fetch, so the selection holds keys only. Keys
//! survive page changes, filter changes and refreshes; only
//! [`Selection::clear`] empties the set.

use std::collections::HashSet;
use std::hash::Hash;

/// State of the header "select all visible" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderCheckbox {
    /// No visible row is selected.
    Unchecked,
    /// Some, but not all, visible rows are selected.
    Indeterminate,
    /// Every visible row is selected.
    Checked,
}

/// Tracks selected rows by their keys.
#[derive(Debug, Clone)]
pub struct Selection<K: Clone + Eq + Hash> {
    selected: HashSet<K>,
}

impl<K: Clone + Eq + Hash> Default for Selection<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> Selection<K> {
    pub fn new() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }

    /// Toggle selection for a key. Returns `true` if the key is now selected.
    pub fn toggle(&mut self, key: K) -> bool {
        if self.selected.remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    /// Check if a key is selected.
    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    /// Clear all selections. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.selected.is_empty();
        self.selected.clear();
        had_any
    }

    /// Get all selected keys.
    pub fn keys(&self) -> &HashSet<K> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// `true` if the page is non-empty and every visible key is selected.
    pub fn all_visible_selected<'a>(&self, visible: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let mut any = false;
        for key in visible {
            if !self.selected.contains(key) {
                return false;
            }
            any = true;
        }
        any
    }

    /// `true` if at least one, but not every, visible key is selected.
    pub fn some_visible_selected<'a>(&self, visible: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        self.header_state(visible) == HeaderCheckbox::Indeterminate
    }

    /// Tri-state header checkbox for the visible keys.
    pub fn header_state<'a>(&self, visible: impl IntoIterator<Item = &'a K>) -> HeaderCheckbox
    where
        K: 'a,
    {
        let (mut selected, mut total) = (0usize, 0usize);
        for key in visible {
            total += 1;
            if self.selected.contains(key) {
                selected += 1;
            }
        }
        match selected {
            0 => HeaderCheckbox::Unchecked,
            n if n == total => HeaderCheckbox::Checked,
            _ => HeaderCheckbox::Indeterminate,
        }
    }

    /// Selects every visible key, or deselects them all if they were all
    /// selected. Keys from other pages are untouched.
    pub fn toggle_all_visible(&mut self, visible: &[K]) {
        if self.all_visible_selected(visible) {
            for key in visible {
                self.selected.remove(key);
            }
        } else {
            self.selected.extend(visible.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        assert!(selection.toggle("A"));
        assert!(selection.is_selected(&"A"));
        assert!(!selection.toggle("A"));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_header_states() {
        let page = ["A", "B", "C"];
        let mut selection = Selection::new();
        assert_eq!(selection.header_state(&page), HeaderCheckbox::Unchecked);
        assert!(!selection.all_visible_selected(&page));
        assert!(!selection.some_visible_selected(&page));

        selection.toggle("B");
        assert_eq!(selection.header_state(&page), HeaderCheckbox::Indeterminate);
        assert!(selection.some_visible_selected(&page));

        selection.toggle("A");
        selection.toggle("C");
        assert_eq!(selection.header_state(&page), HeaderCheckbox::Checked);
        assert!(selection.all_visible_selected(&page));
        assert!(!selection.some_visible_selected(&page));
    }

    #[test]
    fn test_off_page_keys_do_not_count() {
        let mut selection = Selection::new();
        selection.toggle("Z");
        assert_eq!(selection.header_state(&["A", "B"]), HeaderCheckbox::Unchecked);
    }

    #[test]
    fn test_empty_page_is_never_all_selected() {
        let mut selection: Selection<&str> = Selection::new();
        selection.toggle("Z");
        assert!(!selection.all_visible_selected(&[]));
        assert_eq!(selection.header_state(&[]), HeaderCheckbox::Unchecked);
    }

    #[test]
    fn test_toggle_all_visible_preserves_other_pages() {
        let mut selection = Selection::new();
        selection.toggle("Z");
        selection.toggle("A");

        selection.toggle_all_visible(&["A", "B"]);
        assert!(selection.is_selected(&"A"));
        assert!(selection.is_selected(&"B"));
        assert!(selection.is_selected(&"Z"));

        selection.toggle_all_visible(&["A", "B"]);
        assert!(!selection.is_selected(&"A"));
        assert!(!selection.is_selected(&"B"));
        assert!(selection.is_selected(&"Z"));
    }
}
