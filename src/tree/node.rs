//! Node types for the template tree.

use std::collections::HashMap;
use std::fmt;

/// Stable handle of a node inside a [`TreeStore`](super::TreeStore).
///
/// Handles are indices into the store's arena. A slot is never reused, so a
/// handle to a removed node stays invalid instead of silently pointing at a
/// newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Whether a node groups other nodes or holds template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    Leaf,
}

impl NodeKind {
    pub const fn is_folder(self) -> bool {
        matches!(self, NodeKind::Folder)
    }

    pub const fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Leaf)
    }
}

/// A folder or a template.
///
/// Fields are only writable from inside the `tree` module: the store is the
/// single owner of structure, everything else reads through accessors.
#[derive(Debug, Clone)]
pub struct Node {
    pub(super) name: String,
    pub(super) content: String,
    pub(super) kind: NodeKind,
    pub(super) parent: Option<NodeId>,
    /// Display order of the children.
    pub(super) children: Vec<NodeId>,
    /// Name lookup for the same children.
    pub(super) index: HashMap<String, NodeId>,
}

impl Node {
    pub(super) fn new(name: String, content: String, kind: NodeKind) -> Self {
        let content = if kind.is_folder() {
            String::new()
        } else {
            content
        };
        Self {
            name,
            content,
            kind,
            parent: None,
            children: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template text. Always empty for folders.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(super) fn position_of(&self, id: NodeId) -> Option<usize> {
        self.children.iter().position(|c| *c == id)
    }
}

/// Check that a name can live in the tree and be addressed by a path.
pub fn validate_name(name: &str) -> crate::Result<()> {
    if name.is_empty() || name.contains('/') {
        return Err(crate::PasterError::InvalidName(name.to_string()));
    }
    Ok(())
}
