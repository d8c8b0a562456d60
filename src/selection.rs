use crate::tree::Node;
use std::fmt;

/// Which surface a template was picked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionSource {
    Cascade,
    QuickSearch,
    Manager,
}

impl SelectionSource {
    pub fn tag(self) -> &'static str {
        match self {
            SelectionSource::Cascade => "cascade",
            SelectionSource::QuickSearch => "search",
            SelectionSource::Manager => "manager",
        }
    }
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A picked template, detached from the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub content: String,
    pub source: SelectionSource,
}

impl Selection {
    pub fn new(node: &Node, source: SelectionSource) -> Self {
        Self {
            name: node.name().to_string(),
            content: node.content().to_string(),
            source,
        }
    }
}

/// Receives every template selection from every surface.
pub trait SelectionSink {
    fn on_select(&mut self, node: &Node, source: SelectionSource);

    /// Turn simulated pasting after a selection on or off, for sinks that
    /// paste.
    fn set_auto_paste(&mut self, _enabled: bool) {}

    /// Outcome of the last selection, for display.
    fn take_status(&mut self) -> Option<String> {
        None
    }
}

/// Keeps every selection it is handed. Useful when the caller decides later
/// what to do with them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub selections: Vec<Selection>,
}

impl SelectionSink for RecordingSink {
    fn on_select(&mut self, node: &Node, source: SelectionSource) {
        self.selections.push(Selection::new(node, source));
    }
}

impl<S: SelectionSink + ?Sized> SelectionSink for Box<S> {
    fn on_select(&mut self, node: &Node, source: SelectionSource) {
        (**self).on_select(node, source)
    }

    fn set_auto_paste(&mut self, enabled: bool) {
        (**self).set_auto_paste(enabled)
    }

    fn take_status(&mut self) -> Option<String> {
        (**self).take_status()
    }
}
