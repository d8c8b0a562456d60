//! Cascading template menu.
//!
//! At most one menu is open at a time. Opening takes an input grab that is
//! held until the menu closes, and picking a template closes the menu before
//! the selection is reported.

use crate::error::Result;
use crate::selection::{SelectionSink, SelectionSource};
use crate::tree::{NodeId, TreeStore};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Submenu {
        id: NodeId,
        label: String,
        entries: Vec<MenuEntry>,
    },
    Separator,
    Item {
        id: NodeId,
        label: String,
    },
}

impl MenuEntry {
    pub fn label(&self) -> &str {
        match self {
            MenuEntry::Submenu { label, .. } | MenuEntry::Item { label, .. } => label,
            MenuEntry::Separator => "",
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, MenuEntry::Separator)
    }
}

/// Menu mirroring the children of `from`: folders first, then templates,
/// each group sorted by name ignoring case, with a separator between the two
/// groups when both are present.
pub fn build_menu(tree: &TreeStore, from: NodeId) -> Vec<MenuEntry> {
    let mut folders = Vec::new();
    let mut leaves = Vec::new();
    for id in tree.children(from) {
        if let Some(node) = tree.get(*id) {
            if node.is_folder() {
                folders.push((node.name().to_lowercase(), *id, node.name()));
            } else {
                leaves.push((node.name().to_lowercase(), *id, node.name()));
            }
        }
    }
    folders.sort_by(|a, b| a.0.cmp(&b.0));
    leaves.sort_by(|a, b| a.0.cmp(&b.0));

    let mut entries: Vec<MenuEntry> = folders
        .into_iter()
        .map(|(_, id, name)| MenuEntry::Submenu {
            id,
            label: name.to_string(),
            entries: build_menu(tree, id),
        })
        .collect();
    if !entries.is_empty() && !leaves.is_empty() {
        entries.push(MenuEntry::Separator);
    }
    entries.extend(leaves.into_iter().map(|(_, id, name)| MenuEntry::Item {
        id,
        label: name.to_string(),
    }));
    entries
}

/// Exclusive capture of pointer and keyboard input.
///
/// The returned guard holds the grab; dropping it releases the grab.
pub trait InputGrab {
    type Guard;

    fn acquire(&mut self) -> Result<Self::Guard>;
}

/// Identifies one opening of the menu. A handle from an earlier opening no
/// longer refers to anything once the menu has been closed or reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CascadeHandle(u64);

struct OpenMenu<G> {
    handle: CascadeHandle,
    entries: Vec<MenuEntry>,
    /// Highlighted index in each visible column, left to right.
    cursor: Vec<usize>,
    _grab: G,
}

pub struct CascadeMenu<P: InputGrab> {
    grab: P,
    open: Option<OpenMenu<P::Guard>>,
    next_handle: u64,
}

impl<P: InputGrab> CascadeMenu<P> {
    pub fn new(grab: P) -> Self {
        Self {
            grab,
            open: None,
            next_handle: 1,
        }
    }

    /// Open a fresh menu over the children of `root`. A menu that is already
    /// open is closed first, without a selection.
    pub fn open(&mut self, tree: &TreeStore, root: NodeId) -> Result<CascadeHandle> {
        self.force_close();

        let guard = self.grab.acquire()?;
        let handle = CascadeHandle(self.next_handle);
        self.next_handle += 1;

        let entries = build_menu(tree, root);
        let first = entries.iter().position(|e| !e.is_separator()).unwrap_or(0);
        debug!(handle = handle.0, entries = entries.len(), "Cascade menu opened");
        self.open = Some(OpenMenu {
            handle,
            entries,
            cursor: vec![first],
            _grab: guard,
        });
        Ok(handle)
    }

    /// Close the menu opened as `handle`. Returns `false` if that menu is no
    /// longer open.
    pub fn close(&mut self, handle: CascadeHandle) -> bool {
        if self.current() != Some(handle) {
            return false;
        }
        self.force_close()
    }

    /// Close whatever menu is open, releasing its grab. No selection is
    /// reported.
    pub fn force_close(&mut self) -> bool {
        match self.open.take() {
            Some(menu) => {
                debug!(handle = menu.handle.0, "Cascade menu closed");
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn current(&self) -> Option<CascadeHandle> {
        self.open.as_ref().map(|m| m.handle)
    }

    pub fn entries(&self) -> Option<&[MenuEntry]> {
        self.open.as_ref().map(|m| m.entries.as_slice())
    }

    /// Pick `leaf` from the menu opened as `handle`: the menu closes, then
    /// the sink receives exactly one cascade selection. Stale handles and
    /// folders are ignored.
    pub fn activate<S: SelectionSink + ?Sized>(
        &mut self,
        handle: CascadeHandle,
        leaf: NodeId,
        tree: &TreeStore,
        sink: &mut S,
    ) -> bool {
        if self.current() != Some(handle) {
            return false;
        }
        let node = match tree.get(leaf) {
            Some(node) if node.is_leaf() => node,
            _ => return false,
        };

        self.force_close();
        info!(template = %tree.path_of(leaf), "Template picked from cascade menu");
        sink.on_select(node, SelectionSource::Cascade);
        true
    }

    /// Entry lists for every visible column, outermost first.
    pub fn columns(&self) -> Vec<&[MenuEntry]> {
        let menu = match &self.open {
            Some(menu) => menu,
            None => return Vec::new(),
        };
        let mut column: &[MenuEntry] = &menu.entries;
        let mut columns = vec![column];
        for &index in &menu.cursor[..menu.cursor.len().saturating_sub(1)] {
            match column.get(index) {
                Some(MenuEntry::Submenu { entries, .. }) => {
                    column = entries;
                    columns.push(column);
                }
                _ => break,
            }
        }
        columns
    }

    /// Highlighted index per visible column.
    pub fn cursor(&self) -> &[usize] {
        match &self.open {
            Some(menu) => &menu.cursor,
            None => &[],
        }
    }

    /// The highlighted entry of the innermost column.
    pub fn highlighted(&self) -> Option<&MenuEntry> {
        let index = *self.cursor().last()?;
        self.columns()
            .last()
            .copied()
            .and_then(|column| column.get(index))
    }

    /// Move the highlight within the innermost column, skipping separators
    /// and wrapping around.
    pub fn move_highlight(&mut self, down: bool) {
        let selectable: Vec<bool> = match self.columns().last() {
            Some(column) => column.iter().map(|e| !e.is_separator()).collect(),
            None => return,
        };
        let len = selectable.len();
        if len == 0 {
            return;
        }
        if let Some(index) = self.open.as_mut().and_then(|m| m.cursor.last_mut()) {
            let mut next = *index;
            for _ in 0..len {
                next = if down { (next + 1) % len } else { (next + len - 1) % len };
                if selectable[next] {
                    *index = next;
                    return;
                }
            }
        }
    }

    /// Open the highlighted submenu as a new column.
    pub fn enter_submenu(&mut self) -> bool {
        let first = match self.highlighted() {
            Some(MenuEntry::Submenu { entries, .. }) if !entries.is_empty() => {
                entries.iter().position(|e| !e.is_separator()).unwrap_or(0)
            }
            _ => return false,
        };
        if let Some(menu) = self.open.as_mut() {
            menu.cursor.push(first);
        }
        true
    }

    /// Drop the innermost column. The outermost column always stays.
    pub fn leave_submenu(&mut self) -> bool {
        match self.open.as_mut() {
            Some(menu) if menu.cursor.len() > 1 => {
                menu.cursor.pop();
                true
            }
            _ => false,
        }
    }

    /// Highlight `index` in `column`, closing any deeper columns.
    pub fn highlight(&mut self, column: usize, index: usize) -> bool {
        let valid = self
            .columns()
            .get(column)
            .and_then(|c| c.get(index))
            .map_or(false, |e| !e.is_separator());
        if !valid {
            return false;
        }
        if let Some(menu) = self.open.as_mut() {
            menu.cursor.truncate(column + 1);
            menu.cursor[column] = index;
        }
        true
    }

    /// Act on the highlighted entry: a submenu is entered, a template is
    /// activated. Returns `true` when a selection was reported.
    pub fn confirm<S: SelectionSink + ?Sized>(&mut self, tree: &TreeStore, sink: &mut S) -> bool {
        let leaf = match self.highlighted() {
            Some(MenuEntry::Item { id, .. }) => Some(*id),
            Some(MenuEntry::Submenu { .. }) => None,
            _ => return false,
        };
        match (leaf, self.current()) {
            (Some(leaf), Some(handle)) => self.activate(handle, leaf, tree, sink),
            _ => {
                self.enter_submenu();
                false
            }
        }
    }
}
