//! Search-as-you-type picker over template names and contents.

use crate::search::search_full;
use crate::selection::{SelectionSink, SelectionSource};
use crate::tree::{NodeId, TreeStore};
use tracing::info;

/// One open quick-search surface: the query, its matches and a cursor.
#[derive(Debug, Default, Clone)]
pub struct QuickSearch {
    query: String,
    results: Vec<NodeId>,
    selected: usize,
}

impl QuickSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[NodeId] {
        &self.results
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.results.get(self.selected).copied()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn set_query(&mut self, tree: &TreeStore, query: impl Into<String>) {
        self.query = query.into();
        self.refresh(tree);
    }

    pub fn push_char(&mut self, tree: &TreeStore, c: char) {
        self.query.push(c);
        self.refresh(tree);
    }

    pub fn pop_char(&mut self, tree: &TreeStore) {
        self.query.pop();
        self.refresh(tree);
    }

    /// Re-run the query, e.g. after the tree changed underneath.
    pub fn refresh(&mut self, tree: &TreeStore) {
        self.results = search_full(tree, &self.query);
        self.selected = self.selected.min(self.results.len().saturating_sub(1));
    }

    pub fn next(&mut self) {
        if self.selected + 1 < self.results.len() {
            self.selected += 1;
        }
    }

    pub fn previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Report the highlighted template to `sink`. The caller closes the
    /// session when this returns `true`.
    pub fn choose<S: SelectionSink + ?Sized>(&self, tree: &TreeStore, sink: &mut S) -> bool {
        let node = match self.selected().and_then(|id| tree.get(id)) {
            Some(node) if node.is_leaf() => node,
            _ => return false,
        };
        info!(template = node.name(), "Template picked from quick search");
        sink.on_select(node, SelectionSource::QuickSearch);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::RecordingSink;
    use crate::storage::seed_tree;

    #[test]
    fn test_typing_narrows_results() {
        let tree = TreeStore::from_subtree(&seed_tree()).unwrap();
        let mut search = QuickSearch::new();
        assert!(search.results().is_empty());

        for c in "good".chars() {
            search.push_char(&tree, c);
        }
        assert_eq!(search.results().len(), 3);

        search.set_query(&tree, "evening");
        assert_eq!(search.results().len(), 1);
        search.set_query(&tree, "  ");
        assert!(search.results().is_empty());
        assert_eq!(search.selected(), None);
    }

    #[test]
    fn test_cursor_stays_in_range() {
        let tree = TreeStore::from_subtree(&seed_tree()).unwrap();
        let mut search = QuickSearch::new();
        search.set_query(&tree, "good");
        search.next();
        search.next();
        search.next();
        assert_eq!(search.selected_index(), 2);

        search.set_query(&tree, "good morning");
        assert_eq!(search.selected_index(), 0);
        search.previous();
        assert_eq!(search.selected_index(), 0);
    }

    #[test]
    fn test_choose_reports_search_source() {
        let tree = TreeStore::from_subtree(&seed_tree()).unwrap();
        let mut sink = RecordingSink::default();
        let mut search = QuickSearch::new();
        assert!(!search.choose(&tree, &mut sink));

        search.set_query(&tree, "import os");
        assert!(search.choose(&tree, &mut sink));
        assert_eq!(sink.selections.len(), 1);
        assert_eq!(sink.selections[0].name, "Imports");
        assert_eq!(sink.selections[0].source, SelectionSource::QuickSearch);
    }
}
