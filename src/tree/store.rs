use super::node::{validate_name, Node, NodeId, NodeKind};
use super::subtree::Subtree;
use crate::error::{PasterError, Result};

/// Name given to the root folder of a fresh store. It never appears in paths.
pub const ROOT_NAME: &str = "Root";

/// Deepest level a node may sit at below the root.
///
/// Every level takes two nesting levels in the stored document, so this keeps
/// any tree well inside what the JSON reader accepts.
pub const MAX_DEPTH: usize = 48;

/// Result of a successful [`TreeStore::move_to_folder`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The destination already is the node's parent; nothing changed.
    AlreadyThere,
}

/// Arena-backed template tree.
///
/// The store exclusively owns every node. Parents are recorded as ids, so
/// there are no reference cycles, and every structural change goes through a
/// method here that keeps the sibling order, the name index and the parent
/// links consistent.
#[derive(Debug, Clone)]
pub struct TreeStore {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeStore {
    /// A store holding only an empty root folder.
    pub fn new() -> Self {
        Self::with_root_name(ROOT_NAME.to_string())
    }

    fn with_root_name(name: String) -> Self {
        Self {
            nodes: vec![Some(Node::new(name, String::new(), NodeKind::Folder))],
            root: NodeId(0),
        }
    }

    /// Build a store from a detached tree. The subtree's top node becomes the
    /// root and must be a folder.
    pub fn from_subtree(root: &Subtree) -> Result<Self> {
        if !root.kind.is_folder() {
            return Err(PasterError::InvalidData(
                "the root must be a folder".to_string(),
            ));
        }
        root.validate_children()?;
        if root.height() > MAX_DEPTH {
            return Err(PasterError::TooDeep {
                path: root.name.clone(),
                limit: MAX_DEPTH,
            });
        }

        let mut store = Self::with_root_name(root.name.clone());
        let root_id = store.root;
        for child in &root.children {
            store.insert_subtree(root_id, child);
        }
        Ok(store)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| PasterError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Children of `id` in display order. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent)?.child(name)
    }

    /// Position of `name` among `parent`'s children.
    pub fn position(&self, parent: NodeId, name: &str) -> Option<usize> {
        let node = self.get(parent)?;
        node.position_of(node.child(name)?)
    }

    /// Attach a new node (with any children it carries) at the end of
    /// `parent`'s children.
    ///
    /// Fails with `DuplicateName` when `parent` already has a child with the
    /// same name, and with `TooDeep` when the new node or anything it carries
    /// would sit below [`MAX_DEPTH`]. Nothing is modified on failure.
    pub fn add_child(&mut self, parent: NodeId, node: Subtree) -> Result<NodeId> {
        node.validate()?;
        let parent_node = self.node(parent)?;
        if !parent_node.is_folder() {
            return Err(PasterError::NotAFolder(self.path_of(parent)));
        }
        if parent_node.has_child(&node.name) {
            return Err(PasterError::DuplicateName(node.name));
        }
        if self.depth(parent) + 1 + node.height() > MAX_DEPTH {
            return Err(PasterError::TooDeep {
                path: join_path(&self.path_of(parent), &node.name),
                limit: MAX_DEPTH,
            });
        }
        Ok(self.insert_subtree(parent, &node))
    }

    pub fn add_folder(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.add_child(parent, Subtree::folder(name))
    }

    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<NodeId> {
        self.add_child(parent, Subtree::leaf(name, content))
    }

    /// Detach the child called `name` and return it with its whole subtree.
    /// Returns `None` when there is no such child.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Option<Subtree> {
        let id = self.child_named(parent, name)?;
        let subtree = self.subtree(id)?;
        self.detach(id);
        self.release(id);
        Some(subtree)
    }

    /// Remove a node by id. The root cannot be removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Subtree> {
        if id == self.root {
            return Err(PasterError::RootNode);
        }
        let node = self.node(id)?;
        let parent = node.parent.ok_or(PasterError::RootNode)?;
        let name = node.name.clone();
        self.remove_child(parent, &name)
            .ok_or_else(|| PasterError::NotFound(name))
    }

    /// Find a node by `/`-separated path. Empty segments are ignored and the
    /// empty path is the root.
    pub fn resolve_path(&self, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root, |current, segment| self.get(current)?.child(segment))
    }

    /// Path of a node from the root, names joined by `/`. The root (and any
    /// unknown id) yields the empty string.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = id;
        while let Some(node) = self.get(current) {
            match node.parent {
                Some(parent) => {
                    names.push(node.name.as_str());
                    current = parent;
                }
                None => break,
            }
        }
        names.reverse();
        names.join("/")
    }

    /// Number of ancestors between `id` and the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(Node::parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).and_then(Node::parent);
        }
        depth
    }

    /// Levels below `id`: 0 for a leaf or an empty folder.
    pub fn height(&self, id: NodeId) -> usize {
        let base = self.depth(id);
        self.walk(id)
            .into_iter()
            .map(|below| self.depth(below) - base)
            .max()
            .unwrap_or(0)
    }

    /// True when `node` is `ancestor` or lies somewhere below it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(Node::parent);
        }
        false
    }

    /// Every node below `from`, depth-first pre-order, in display order.
    pub fn walk(&self, from: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            visited.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        visited
    }

    /// Swap `name` with its previous sibling. Returns `false`, changing
    /// nothing, when it is already first or does not exist.
    pub fn move_up(&mut self, parent: NodeId, name: &str) -> bool {
        match self.position(parent, name) {
            Some(pos) if pos > 0 => self.swap_children(parent, pos, pos - 1),
            _ => false,
        }
    }

    /// Swap `name` with its next sibling. Returns `false`, changing nothing,
    /// when it is already last or does not exist.
    pub fn move_down(&mut self, parent: NodeId, name: &str) -> bool {
        let count = self.children(parent).len();
        match self.position(parent, name) {
            Some(pos) if pos + 1 < count => self.swap_children(parent, pos, pos + 1),
            _ => false,
        }
    }

    fn swap_children(&mut self, parent: NodeId, a: usize, b: usize) -> bool {
        match self.get_mut(parent) {
            Some(node) => {
                node.children.swap(a, b);
                true
            }
            None => false,
        }
    }

    /// Re-parent `node`, with its subtree untouched, to the end of `target`.
    ///
    /// `target` must be a folder outside of `node`'s own subtree. Moving to
    /// the current parent is reported as [`MoveOutcome::AlreadyThere`].
    pub fn move_to_folder(&mut self, node: NodeId, target: NodeId) -> Result<MoveOutcome> {
        if node == self.root {
            return Err(PasterError::RootNode);
        }
        let moving = self.node(node)?;
        let current_parent = moving.parent;
        let name = moving.name.clone();

        if !self.node(target)?.is_folder() {
            return Err(PasterError::NotAFolder(self.path_of(target)));
        }
        if current_parent == Some(target) {
            return Ok(MoveOutcome::AlreadyThere);
        }
        if self.is_within(target, node) {
            let reason = if target == node {
                "a folder cannot be moved into itself"
            } else {
                "the destination is inside the item being moved"
            };
            return Err(PasterError::InvalidMove {
                node: self.path_of(node),
                target: self.path_of(target),
                reason,
            });
        }
        if self.node(target)?.has_child(&name) {
            return Err(PasterError::DuplicateName(name));
        }
        if self.depth(target) + 1 + self.height(node) > MAX_DEPTH {
            return Err(PasterError::TooDeep {
                path: join_path(&self.path_of(target), &name),
                limit: MAX_DEPTH,
            });
        }

        self.detach(node);
        self.attach(target, node);
        Ok(MoveOutcome::Moved)
    }

    /// Rename a node in place, keeping its position among its siblings.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        if id == self.root {
            return Err(PasterError::RootNode);
        }
        validate_name(new_name)?;
        let node = self.node(id)?;
        if node.name == new_name {
            return Ok(());
        }
        let old_name = node.name.clone();
        let parent = node.parent.ok_or(PasterError::RootNode)?;
        if self.node(parent)?.has_child(new_name) {
            return Err(PasterError::DuplicateName(new_name.to_string()));
        }

        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.index.remove(&old_name);
            parent_node.index.insert(new_name.to_string(), id);
        }
        if let Some(node) = self.get_mut(id) {
            node.name = new_name.to_string();
        }
        Ok(())
    }

    /// Replace a template's text.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> Result<()> {
        if !self.node(id)?.is_leaf() {
            return Err(PasterError::NotATemplate(self.path_of(id)));
        }
        if let Some(node) = self.get_mut(id) {
            node.content = content.into();
        }
        Ok(())
    }

    /// Owned copy of `id` and everything below it.
    pub fn subtree(&self, id: NodeId) -> Option<Subtree> {
        let node = self.get(id)?;
        Some(Subtree {
            name: node.name.clone(),
            content: node.content.clone(),
            kind: node.kind,
            children: node
                .children
                .iter()
                .filter_map(|child| self.subtree(*child))
                .collect(),
        })
    }

    /// Owned copy of the whole tree.
    pub fn to_subtree(&self) -> Subtree {
        self.subtree(self.root)
            .unwrap_or_else(|| Subtree::folder(ROOT_NAME))
    }

    fn insert_subtree(&mut self, parent: NodeId, subtree: &Subtree) -> NodeId {
        self.nodes.push(Some(Node::new(
            subtree.name.clone(),
            subtree.content.clone(),
            subtree.kind,
        )));
        let id = NodeId(self.nodes.len() - 1);
        self.attach(parent, id);
        for child in &subtree.children {
            self.insert_subtree(id, child);
        }
        id
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        let name = match self.get_mut(child) {
            Some(node) => {
                node.parent = Some(parent);
                node.name.clone()
            }
            None => return,
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.push(child);
            parent_node.index.insert(name, child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let (parent, name) = match self.get_mut(child) {
            Some(node) => match node.parent.take() {
                Some(parent) => (parent, node.name.clone()),
                None => return,
            },
            None => return,
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.retain(|c| *c != child);
            parent_node.index.remove(&name);
        }
    }

    /// Drop a detached node and its descendants from the arena.
    fn release(&mut self, id: NodeId) {
        let mut doomed = self.walk(id);
        doomed.push(id);
        for dead in doomed {
            if let Some(slot) = self.nodes.get_mut(dead.0) {
                *slot = None;
            }
        }
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(store: &TreeStore, parent: NodeId) -> Vec<String> {
        store
            .children(parent)
            .iter()
            .map(|id| store.get(*id).unwrap().name().to_string())
            .collect()
    }

    fn sample() -> TreeStore {
        let tree = Subtree::folder(ROOT_NAME)
            .with_child(
                Subtree::folder("Work")
                    .with_child(Subtree::leaf("Reply", "Thanks!"))
                    .with_child(Subtree::folder("Legal").with_child(Subtree::leaf("NDA", "..."))),
            )
            .with_child(Subtree::leaf("a", "1"))
            .with_child(Subtree::leaf("b", "2"))
            .with_child(Subtree::leaf("c", "3"));
        TreeStore::from_subtree(&tree).unwrap()
    }

    #[test]
    fn test_add_child_appends_and_sets_parent() {
        let mut store = TreeStore::new();
        let root = store.root();
        let folder = store.add_folder(root, "Mail").unwrap();
        let leaf = store.add_leaf(folder, "Hello", "Hi there").unwrap();

        assert_eq!(store.get(leaf).unwrap().parent(), Some(folder));
        assert_eq!(names(&store, root), vec!["Mail"]);
        assert_eq!(store.get(leaf).unwrap().content(), "Hi there");
    }

    #[test]
    fn test_add_child_rejects_duplicate_without_side_effects() {
        let mut store = sample();
        let root = store.root();
        let before = store.to_subtree();

        let err = store.add_leaf(root, "a", "other").unwrap_err();
        assert!(matches!(err, PasterError::DuplicateName(name) if name == "a"));
        assert_eq!(store.to_subtree(), before);
    }

    #[test]
    fn test_add_child_rejects_leaf_parent_and_bad_names() {
        let mut store = sample();
        let leaf = store.resolve_path("a").unwrap();
        assert!(matches!(
            store.add_leaf(leaf, "x", ""),
            Err(PasterError::NotAFolder(_))
        ));
        let root = store.root();
        assert!(matches!(
            store.add_folder(root, ""),
            Err(PasterError::InvalidName(_))
        ));
        assert!(matches!(
            store.add_folder(root, "x/y"),
            Err(PasterError::InvalidName(_))
        ));
    }

    #[test]
    fn test_folders_never_keep_content() {
        let tree = Subtree::folder(ROOT_NAME).with_child(Subtree {
            content: "ignored".to_string(),
            ..Subtree::folder("F")
        });
        let store = TreeStore::from_subtree(&tree).unwrap();
        let folder = store.resolve_path("F").unwrap();
        assert_eq!(store.get(folder).unwrap().content(), "");
    }

    #[test]
    fn test_remove_child_returns_subtree_and_frees_nodes() {
        let mut store = sample();
        let root = store.root();
        let count = store.node_count();
        let nda = store.resolve_path("Work/Legal/NDA").unwrap();

        let removed = store.remove_child(root, "Work").unwrap();
        assert_eq!(removed.name, "Work");
        assert_eq!(removed.node_count(), 4);
        assert_eq!(store.node_count(), count - 4);
        assert!(!store.contains(nda));
        assert_eq!(store.resolve_path("Work"), None);
    }

    #[test]
    fn test_remove_child_missing_is_none() {
        let mut store = sample();
        let root = store.root();
        assert_eq!(store.remove_child(root, "nope"), None);
    }

    #[test]
    fn test_remove_node_refuses_root() {
        let mut store = sample();
        let root = store.root();
        assert!(matches!(store.remove_node(root), Err(PasterError::RootNode)));
    }

    #[test]
    fn test_resolve_path_ignores_empty_segments() {
        let store = sample();
        let nda = store.resolve_path("Work/Legal/NDA").unwrap();
        assert_eq!(store.resolve_path("/Work//Legal/NDA/"), Some(nda));
        assert_eq!(store.resolve_path(""), Some(store.root()));
        assert_eq!(store.resolve_path("Work/Missing/NDA"), None);
    }

    #[test]
    fn test_path_of_round_trips_every_node() {
        let store = sample();
        assert_eq!(store.path_of(store.root()), "");
        for id in store.walk(store.root()) {
            assert_eq!(store.resolve_path(&store.path_of(id)), Some(id));
        }
        let nda = store.resolve_path("Work/Legal/NDA").unwrap();
        assert_eq!(store.path_of(nda), "Work/Legal/NDA");
        assert_eq!(store.depth(nda), 3);
    }

    #[test]
    fn test_move_up_and_down_swap_neighbours() {
        let mut store = sample();
        let root = store.root();

        assert!(store.move_up(root, "b"));
        assert_eq!(names(&store, root), vec!["Work", "b", "a", "c"]);
        assert!(store.move_down(root, "b"));
        assert_eq!(names(&store, root), vec!["Work", "a", "b", "c"]);
    }

    #[test]
    fn test_move_at_boundary_is_a_noop() {
        let mut store = sample();
        let root = store.root();
        let before = names(&store, root);

        assert!(!store.move_up(root, "Work"));
        assert!(!store.move_down(root, "c"));
        assert!(!store.move_up(root, "missing"));
        assert_eq!(names(&store, root), before);
    }

    #[test]
    fn test_move_to_folder_appends_subtree() {
        let mut store = sample();
        let legal = store.resolve_path("Work/Legal").unwrap();
        let root = store.root();

        assert_eq!(store.move_to_folder(legal, root).unwrap(), MoveOutcome::Moved);
        assert_eq!(names(&store, root), vec!["Work", "a", "b", "c", "Legal"]);
        assert_eq!(store.path_of(legal), "Legal");
        assert!(store.resolve_path("Legal/NDA").is_some());
        assert_eq!(store.resolve_path("Work/Legal"), None);
    }

    #[test]
    fn test_move_to_current_parent_is_already_there() {
        let mut store = sample();
        let a = store.resolve_path("a").unwrap();
        let root = store.root();
        assert_eq!(
            store.move_to_folder(a, root).unwrap(),
            MoveOutcome::AlreadyThere
        );
    }

    #[test]
    fn test_move_into_own_descendant_is_rejected() {
        let mut store = sample();
        let work = store.resolve_path("Work").unwrap();
        let legal = store.resolve_path("Work/Legal").unwrap();
        let before = store.to_subtree();

        assert!(matches!(
            store.move_to_folder(work, legal),
            Err(PasterError::InvalidMove { .. })
        ));
        assert!(matches!(
            store.move_to_folder(work, work),
            Err(PasterError::InvalidMove { .. })
        ));
        assert_eq!(store.to_subtree(), before);
    }

    #[test]
    fn test_move_rejects_collision_leaf_target_and_root() {
        let mut store = sample();
        let work = store.resolve_path("Work").unwrap();
        let a = store.resolve_path("a").unwrap();
        let root = store.root();
        store.add_leaf(work, "b", "clash").unwrap();
        let b = store.resolve_path("b").unwrap();

        assert!(matches!(
            store.move_to_folder(b, work),
            Err(PasterError::DuplicateName(_))
        ));
        assert!(matches!(
            store.move_to_folder(b, a),
            Err(PasterError::NotAFolder(_))
        ));
        assert!(matches!(
            store.move_to_folder(root, work),
            Err(PasterError::RootNode)
        ));
    }

    #[test]
    fn test_rename_keeps_position_and_index() {
        let mut store = sample();
        let root = store.root();
        let b = store.resolve_path("b").unwrap();

        store.rename(b, "beta").unwrap();
        assert_eq!(names(&store, root), vec!["Work", "a", "beta", "c"]);
        assert_eq!(store.resolve_path("beta"), Some(b));
        assert_eq!(store.resolve_path("b"), None);

        assert!(matches!(
            store.rename(b, "a"),
            Err(PasterError::DuplicateName(_))
        ));
        assert!(store.rename(b, "beta").is_ok());
        assert!(matches!(store.rename(root, "x"), Err(PasterError::RootNode)));
    }

    #[test]
    fn test_set_content_only_on_leaves() {
        let mut store = sample();
        let a = store.resolve_path("a").unwrap();
        let work = store.resolve_path("Work").unwrap();

        store.set_content(a, "line one\nline two").unwrap();
        assert_eq!(store.get(a).unwrap().content(), "line one\nline two");
        assert!(matches!(
            store.set_content(work, "x"),
            Err(PasterError::NotATemplate(_))
        ));
    }

    /// A chain of folders reaching `levels` below the root; returns the
    /// deepest one.
    fn chain(store: &mut TreeStore, levels: usize) -> NodeId {
        let mut current = store.root();
        for level in 0..levels {
            current = store.add_folder(current, format!("f{}", level)).unwrap();
        }
        current
    }

    #[test]
    fn test_nesting_stops_at_max_depth() {
        let mut store = TreeStore::new();
        let deepest = chain(&mut store, MAX_DEPTH - 1);
        let leaf = store.add_leaf(deepest, "bottom", "text").unwrap();
        assert_eq!(store.depth(leaf), MAX_DEPTH);

        let last = store.add_folder(deepest, "last").unwrap();
        assert_eq!(store.depth(last), MAX_DEPTH);
        let count = store.node_count();

        assert!(matches!(
            store.add_leaf(last, "x", ""),
            Err(PasterError::TooDeep { limit: MAX_DEPTH, .. })
        ));
        let nested = Subtree::folder("a").with_child(Subtree::leaf("b", ""));
        assert!(matches!(
            store.add_child(deepest, nested),
            Err(PasterError::TooDeep { .. })
        ));
        assert_eq!(store.node_count(), count);
    }

    #[test]
    fn test_deep_subtree_cannot_be_moved_past_max_depth() {
        let mut store = sample();
        let work = store.resolve_path("Work").unwrap();
        assert_eq!(store.height(work), 2);

        let holder = chain(&mut store, MAX_DEPTH - 1);
        let before = store.to_subtree();
        assert!(matches!(
            store.move_to_folder(work, holder),
            Err(PasterError::TooDeep { .. })
        ));
        assert_eq!(store.to_subtree(), before);

        let shallow = store.resolve_path("f0").unwrap();
        assert_eq!(store.move_to_folder(work, shallow).unwrap(), MoveOutcome::Moved);
        assert_eq!(store.depth(store.resolve_path("f0/Work/Legal/NDA").unwrap()), 4);
    }

    #[test]
    fn test_from_subtree_rejects_overly_deep_trees() {
        let mut tree = Subtree::leaf("bottom", "");
        for level in 0..MAX_DEPTH {
            tree = Subtree::folder(format!("f{}", level)).with_child(tree);
        }
        let root = Subtree::folder(ROOT_NAME).with_child(tree);
        assert_eq!(root.height(), MAX_DEPTH + 1);
        assert!(matches!(
            TreeStore::from_subtree(&root),
            Err(PasterError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_walk_is_preorder_in_display_order() {
        let store = sample();
        let paths: Vec<String> = store
            .walk(store.root())
            .into_iter()
            .map(|id| store.path_of(id))
            .collect();
        assert_eq!(
            paths,
            vec![
                "Work",
                "Work/Reply",
                "Work/Legal",
                "Work/Legal/NDA",
                "a",
                "b",
                "c"
            ]
        );
    }
}
