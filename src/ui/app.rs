use super::common::rect_contains;
use crate::cascade::{CascadeMenu, InputGrab};
use crate::config::{save_config, Config};
use crate::hotkey::{TRIGGER_CASCADE, TRIGGER_SEARCH};
use crate::quick_search::QuickSearch;
use crate::search::search_by_name;
use crate::selection::{SelectionSink, SelectionSource};
use crate::storage::Library;
use crate::tree::{MoveOutcome, NodeId, TreeStore};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use std::collections::HashSet;
use std::mem;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// One visible line of the tree browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: NodeId,
    pub depth: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    NewFolder { parent: NodeId },
    NewTemplate { parent: NodeId },
    Edit { node: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Content,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub name: String,
    pub content: String,
    pub field: FormField,
    /// Folders only have a name.
    pub has_content: bool,
}

impl Form {
    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewFolder { .. } => " New folder ",
            FormKind::NewTemplate { .. } => " New template ",
            FormKind::Edit { .. } => " Edit ",
        }
    }

    fn active_text(&mut self) -> &mut String {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::Content => &mut self.content,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    Filter,
    Form(Form),
    ConfirmDelete(NodeId),
    MovePicker {
        node: NodeId,
        targets: Vec<NodeId>,
        selected: usize,
    },
    Help,
}

/// Everything the terminal UI shows, owned by the UI thread.
pub struct App<G: InputGrab, S: SelectionSink> {
    library: Library,
    config: Config,
    config_path: PathBuf,
    sink: S,
    cascade: CascadeMenu<G>,
    quick_search: Option<QuickSearch>,
    mode: Mode,
    rows: Vec<Row>,
    selected: usize,
    collapsed: HashSet<NodeId>,
    filter: String,
    status: Option<(String, StatusKind)>,
    hotkeys_available: bool,
    menu_areas: Vec<(Rect, usize)>,
    should_quit: bool,
}

fn push_rows(
    tree: &TreeStore,
    parent: NodeId,
    depth: usize,
    collapsed: &HashSet<NodeId>,
    rows: &mut Vec<Row>,
) {
    for &id in tree.children(parent) {
        let node = match tree.get(id) {
            Some(node) => node,
            None => continue,
        };
        rows.push(Row {
            id,
            depth,
            label: node.name().to_string(),
        });
        if node.is_folder() && !collapsed.contains(&id) {
            push_rows(tree, id, depth + 1, collapsed, rows);
        }
    }
}

impl<G: InputGrab, S: SelectionSink> App<G, S> {
    pub fn new(
        library: Library,
        config: Config,
        config_path: PathBuf,
        mut sink: S,
        grab: G,
    ) -> Self {
        sink.set_auto_paste(config.features.auto_paste);
        let mut app = Self {
            library,
            config,
            config_path,
            sink,
            cascade: CascadeMenu::new(grab),
            quick_search: None,
            mode: Mode::Browse,
            rows: Vec::new(),
            selected: 0,
            collapsed: HashSet::new(),
            filter: String::new(),
            status: None,
            hotkeys_available: true,
            menu_areas: Vec::new(),
            should_quit: false,
        };
        app.rebuild_rows();
        app
    }

    pub fn tree(&self) -> &TreeStore {
        self.library.tree()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.rows.get(self.selected).map(|row| row.id)
    }

    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.collapsed.contains(&id)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn status(&self) -> Option<&(String, StatusKind)> {
        self.status.as_ref()
    }

    pub fn quick_search(&self) -> Option<&QuickSearch> {
        self.quick_search.as_ref()
    }

    pub fn cascade(&self) -> &CascadeMenu<G> {
        &self.cascade
    }

    pub fn hotkeys_available(&self) -> bool {
        self.hotkeys_available
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Screen areas of the open menu columns, outermost first, as last drawn,
    /// each with the index of the first entry visible in it.
    pub fn set_menu_areas(&mut self, areas: Vec<(Rect, usize)>) {
        self.menu_areas = areas;
    }

    fn set_info(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Info));
    }

    fn set_error(&mut self, message: impl Into<String>) {
        self.status = Some((message.into(), StatusKind::Error));
    }

    fn take_sink_status(&mut self) {
        if let Some(status) = self.sink.take_status() {
            self.set_info(status);
        }
    }

    // Trigger handlers. These are bound to the global hotkeys and to keys
    // inside the UI, so both paths behave the same.

    /// Open the quick search, unless one is already open.
    pub fn trigger_search(&mut self) {
        if self.quick_search.is_some() {
            debug!(trigger = TRIGGER_SEARCH, "Quick search already open");
            return;
        }
        info!(trigger = TRIGGER_SEARCH, "Opening quick search");
        self.quick_search = Some(QuickSearch::new());
    }

    /// Open a fresh cascade menu, replacing any menu that is open.
    pub fn trigger_cascade(&mut self) {
        let tree = self.library.tree();
        match self.cascade.open(tree, tree.root()) {
            Ok(_) => info!(trigger = TRIGGER_CASCADE, "Opened cascade menu"),
            Err(e) => {
                warn!(error = %e, "Could not open cascade menu");
                self.set_error(format!("Could not open menu: {}", e));
            }
        }
    }

    pub fn on_listener_down(&mut self) {
        self.hotkeys_available = false;
        self.set_error("Global hotkeys unavailable; use 's' for search and 'o' for the menu");
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.cascade.is_open() {
            self.handle_cascade_key(key);
            return;
        }
        if self.quick_search.is_some() {
            self.handle_search_key(key);
            return;
        }

        let mode = mem::replace(&mut self.mode, Mode::Browse);
        self.mode = match mode {
            Mode::Browse => {
                self.handle_browse_key(key);
                // Browse keys may switch mode themselves.
                mem::replace(&mut self.mode, Mode::Browse)
            }
            Mode::Filter => self.handle_filter_key(key),
            Mode::Form(form) => self.handle_form_key(form, key),
            Mode::ConfirmDelete(id) => self.handle_confirm_key(id, key),
            Mode::MovePicker {
                node,
                targets,
                selected,
            } => self.handle_picker_key(node, targets, selected, key),
            Mode::Help => Mode::Browse,
        };
    }

    /// Mouse input only matters while the menu holds the input grab: a click
    /// on an entry picks it, a click anywhere else closes the menu.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !self.cascade.is_open() {
            return;
        }
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        let hit = self
            .menu_areas
            .iter()
            .enumerate()
            .find(|(_, (area, _))| rect_contains(*area, mouse.column, mouse.row))
            .map(|(column, &(area, offset))| (column, area, offset));
        match hit {
            Some((column, area, offset)) => {
                if mouse.row <= area.y || mouse.row + 1 >= area.y + area.height {
                    return;
                }
                let index = offset + usize::from(mouse.row - area.y - 1);
                if self.cascade.highlight(column, index) {
                    self.confirm_cascade();
                }
            }
            None => {
                self.cascade.force_close();
                self.set_info("Menu closed");
            }
        }
    }

    fn confirm_cascade(&mut self) {
        if self.cascade.confirm(self.library.tree(), &mut self.sink) {
            self.take_sink_status();
        }
    }

    fn handle_cascade_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.cascade.move_highlight(false),
            KeyCode::Down => self.cascade.move_highlight(true),
            KeyCode::Right => {
                self.cascade.enter_submenu();
            }
            KeyCode::Left => {
                self.cascade.leave_submenu();
            }
            KeyCode::Enter => self.confirm_cascade(),
            KeyCode::Esc => {
                self.cascade.force_close();
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let search = match self.quick_search.as_mut() {
            Some(search) => search,
            None => return,
        };
        let tree = self.library.tree();
        match key.code {
            KeyCode::Esc => self.quick_search = None,
            KeyCode::Enter => {
                if search.choose(tree, &mut self.sink) {
                    self.quick_search = None;
                    self.take_sink_status();
                }
            }
            KeyCode::Up => search.previous(),
            KeyCode::Down => search.next(),
            KeyCode::Backspace => search.pop_char(tree),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                search.push_char(tree, c)
            }
            _ => {}
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Up if shift => self.reorder(true),
            KeyCode::Down if shift => self.reorder(false),
            KeyCode::Char('K') => self.reorder(true),
            KeyCode::Char('J') => self.reorder(false),
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.filter.is_empty() {
                    self.should_quit = true;
                } else {
                    self.filter.clear();
                    self.rebuild_rows();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.rows.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.rows.len().saturating_sub(1),
            KeyCode::Left | KeyCode::Char('h') => self.collapse_or_parent(),
            KeyCode::Right | KeyCode::Char('l') => self.expand(),
            KeyCode::Enter => match self.selected_id() {
                Some(id) if self.tree().get(id).map_or(false, |n| n.is_folder()) => {
                    self.toggle_collapsed(id)
                }
                Some(id) => self.pick(id),
                None => {}
            },
            KeyCode::Char('c') => {
                if let Some(id) = self.selected_id() {
                    self.pick(id);
                }
            }
            KeyCode::Char('f') => self.open_form(FormKind::NewFolder {
                parent: self.target_folder(),
            }),
            KeyCode::Char('n') => self.open_form(FormKind::NewTemplate {
                parent: self.target_folder(),
            }),
            KeyCode::Char('e') | KeyCode::F(2) => {
                if let Some(node) = self.selected_id() {
                    self.open_form(FormKind::Edit { node });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('m') => {
                if let Some(node) = self.selected_id() {
                    let targets = self.move_targets(node);
                    self.mode = Mode::MovePicker {
                        node,
                        targets,
                        selected: 0,
                    };
                }
            }
            KeyCode::Char('/') => self.mode = Mode::Filter,
            KeyCode::Char('s') => self.trigger_search(),
            KeyCode::Char('o') => self.trigger_cascade(),
            KeyCode::Char('a') => self.toggle_auto_paste(),
            KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Mode {
        match key.code {
            KeyCode::Enter => return Mode::Browse,
            KeyCode::Esc => {
                self.filter.clear();
                self.rebuild_rows();
                return Mode::Browse;
            }
            KeyCode::Backspace => {
                self.filter.pop();
                self.selected = 0;
                self.rebuild_rows();
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.selected = 0;
                self.rebuild_rows();
            }
            _ => {}
        }
        Mode::Filter
    }

    fn handle_form_key(&mut self, mut form: Form, key: KeyEvent) -> Mode {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return self.submit_form(form),
            KeyCode::Esc => return Mode::Browse,
            KeyCode::Tab | KeyCode::BackTab if form.has_content => {
                form.field = match form.field {
                    FormField::Name => FormField::Content,
                    FormField::Content => FormField::Name,
                };
            }
            KeyCode::Enter => match form.field {
                FormField::Content => form.content.push('\n'),
                FormField::Name if form.has_content => form.field = FormField::Content,
                FormField::Name => return self.submit_form(form),
            },
            KeyCode::Backspace => {
                form.active_text().pop();
            }
            KeyCode::Char(c) if !ctrl => form.active_text().push(c),
            _ => {}
        }
        Mode::Form(form)
    }

    fn handle_confirm_key(&mut self, id: NodeId, key: KeyEvent) -> Mode {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let path = self.tree().path_of(id);
                match self.library.remove_node(id) {
                    Ok(removed) => {
                        info!(path = %path, nodes = removed.node_count(), "Deleted");
                        self.rebuild_rows();
                        self.set_info(format!("Deleted '{}'", removed.name));
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
                Mode::Browse
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Mode::Browse,
            _ => Mode::ConfirmDelete(id),
        }
    }

    fn handle_picker_key(
        &mut self,
        node: NodeId,
        targets: Vec<NodeId>,
        mut selected: usize,
        key: KeyEvent,
    ) -> Mode {
        match key.code {
            KeyCode::Esc => return Mode::Browse,
            KeyCode::Up => selected = selected.saturating_sub(1),
            KeyCode::Down => {
                if selected + 1 < targets.len() {
                    selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(&target) = targets.get(selected) {
                    self.move_into(node, target);
                }
                return Mode::Browse;
            }
            _ => {}
        }
        Mode::MovePicker {
            node,
            targets,
            selected,
        }
    }

    fn open_form(&mut self, kind: FormKind) {
        let form = match kind {
            FormKind::NewFolder { .. } => Form {
                kind,
                name: String::new(),
                content: String::new(),
                field: FormField::Name,
                has_content: false,
            },
            FormKind::NewTemplate { .. } => Form {
                kind,
                name: String::new(),
                content: String::new(),
                field: FormField::Name,
                has_content: true,
            },
            FormKind::Edit { node } => match self.tree().get(node) {
                Some(existing) => Form {
                    kind,
                    name: existing.name().to_string(),
                    content: existing.content().to_string(),
                    field: FormField::Name,
                    has_content: existing.is_leaf(),
                },
                None => return,
            },
        };
        self.mode = Mode::Form(form);
    }

    fn submit_form(&mut self, form: Form) -> Mode {
        let name = form.name.trim();
        let result = match form.kind {
            FormKind::NewFolder { parent } => self.library.add_folder(parent, name),
            FormKind::NewTemplate { parent } => {
                self.library.add_leaf(parent, name, form.content.as_str())
            }
            FormKind::Edit { node } => self.apply_edit(node, name, &form.content).map(|_| node),
        };
        match result {
            Ok(id) => {
                self.focus(id);
                self.set_info(format!("Saved '{}'", name));
                Mode::Browse
            }
            Err(e) => {
                self.set_error(e.to_string());
                Mode::Form(form)
            }
        }
    }

    fn apply_edit(&mut self, node: NodeId, name: &str, content: &str) -> crate::Result<()> {
        // Rename first: it is the step that can be refused.
        self.library.rename(node, name)?;
        if self.tree().get(node).map_or(false, |n| n.is_leaf()) {
            self.library.set_content(node, content)?;
        }
        Ok(())
    }

    fn pick(&mut self, id: NodeId) {
        if let Some(node) = self.library.tree().get(id) {
            if node.is_leaf() {
                self.sink.on_select(node, SelectionSource::Manager);
                self.take_sink_status();
            }
        }
    }

    fn reorder(&mut self, up: bool) {
        let id = match self.selected_id() {
            Some(id) => id,
            None => return,
        };
        let (parent, name) = match self.tree().get(id) {
            Some(node) => match node.parent() {
                Some(parent) => (parent, node.name().to_string()),
                None => return,
            },
            None => return,
        };
        let moved = if up {
            self.library.move_up(parent, &name)
        } else {
            self.library.move_down(parent, &name)
        };
        if moved {
            self.focus(id);
        } else {
            self.set_info(if up { "Already first" } else { "Already last" });
        }
    }

    fn move_into(&mut self, node: NodeId, target: NodeId) {
        match self.library.move_to_folder(node, target) {
            Ok(MoveOutcome::Moved) => {
                self.focus(node);
                let destination = self.tree().path_of(target);
                self.set_info(format!("Moved to '/{}'", destination));
            }
            Ok(MoveOutcome::AlreadyThere) => self.set_info("Already in that folder"),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Folders `node` may be moved into: every folder, root included, except
    /// `node` itself and anything below it.
    pub fn move_targets(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree();
        let mut targets = vec![tree.root()];
        targets.extend(tree.walk(tree.root()).into_iter().filter(|&id| {
            tree.get(id).map_or(false, |n| n.is_folder()) && !tree.is_within(id, node)
        }));
        targets
    }

    /// Folder that new items go into: the selected folder, or the parent of
    /// the selected template.
    fn target_folder(&self) -> NodeId {
        let tree = self.tree();
        match self.selected_id().and_then(|id| tree.get(id).map(|n| (id, n))) {
            Some((id, node)) if node.is_folder() => id,
            Some((_, node)) => node.parent().unwrap_or_else(|| tree.root()),
            None => tree.root(),
        }
    }

    fn toggle_auto_paste(&mut self) {
        let enabled = !self.config.features.auto_paste;
        self.config.features.auto_paste = enabled;
        self.sink.set_auto_paste(enabled);
        match save_config(&self.config_path, &self.config) {
            Ok(()) => self.set_info(if enabled {
                "Auto-paste on"
            } else {
                "Auto-paste off"
            }),
            Err(e) => {
                warn!(error = %e, "Failed to save configuration");
                self.set_error(format!("Auto-paste changed but not saved: {}", e));
            }
        }
    }

    fn toggle_collapsed(&mut self, id: NodeId) {
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        self.rebuild_rows();
    }

    fn expand(&mut self) {
        if let Some(id) = self.selected_id() {
            if self.collapsed.remove(&id) {
                self.rebuild_rows();
            }
        }
    }

    fn collapse_or_parent(&mut self) {
        let id = match self.selected_id() {
            Some(id) => id,
            None => return,
        };
        let (is_folder, parent) = match self.tree().get(id) {
            Some(node) => (node.is_folder(), node.parent()),
            None => return,
        };
        if is_folder && !self.collapsed.contains(&id) && self.filter.is_empty() {
            self.collapsed.insert(id);
            self.rebuild_rows();
        } else if let Some(index) = parent.and_then(|p| self.rows.iter().position(|r| r.id == p)) {
            self.selected = index;
        }
    }

    /// Make `id` visible and select it.
    fn focus(&mut self, id: NodeId) {
        let mut current = self.tree().get(id).and_then(|n| n.parent());
        while let Some(parent) = current {
            self.collapsed.remove(&parent);
            current = self.tree().get(parent).and_then(|n| n.parent());
        }
        self.rebuild_rows();
        if let Some(index) = self.rows.iter().position(|r| r.id == id) {
            self.selected = index;
        }
    }

    fn rebuild_rows(&mut self) {
        let keep = self.selected_id();
        let tree = self.library.tree();
        let mut rows = Vec::new();
        if self.filter.is_empty() {
            push_rows(tree, tree.root(), 0, &self.collapsed, &mut rows);
        } else {
            rows.extend(search_by_name(tree, &self.filter).into_iter().map(|id| Row {
                id,
                depth: 0,
                label: tree.path_of(id),
            }));
        }
        self.rows = rows;
        self.selected = keep
            .and_then(|id| self.rows.iter().position(|r| r.id == id))
            .unwrap_or_else(|| self.selected.min(self.rows.len().saturating_sub(1)));

        if let Some(search) = self.quick_search.as_mut() {
            search.refresh(self.library.tree());
        }
    }
}
