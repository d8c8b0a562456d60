use super::node::{validate_name, NodeKind};
use crate::error::{PasterError, Result};
use std::collections::HashSet;

/// An owned, detached copy of a node and everything below it.
///
/// This is the form a tree takes outside the store: the seed tree, the
/// value returned when a child is removed, and the unit the JSON codec reads
/// and writes. Child order is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    pub name: String,
    pub content: String,
    pub kind: NodeKind,
    pub children: Vec<Subtree>,
}

impl Subtree {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            kind: NodeKind::Folder,
            children: Vec::new(),
        }
    }

    pub fn leaf(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            kind: NodeKind::Leaf,
            children: Vec::new(),
        }
    }

    /// Builder-style append, used for literal trees.
    pub fn with_child(mut self, child: Subtree) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Subtree::node_count).sum::<usize>()
    }

    /// Levels below this node: 0 for a leaf or an empty folder.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Validate this node's name and everything below it.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        self.validate_children()
    }

    /// Validate everything below this node without looking at its own name.
    ///
    /// The root of a stored tree is never addressed by name, so it is checked
    /// with this form.
    pub fn validate_children(&self) -> Result<()> {
        if self.kind.is_leaf() && !self.children.is_empty() {
            return Err(PasterError::InvalidData(format!(
                "template '{}' has children",
                self.name
            )));
        }

        let mut seen = HashSet::with_capacity(self.children.len());
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Err(PasterError::DuplicateName(child.name.clone()));
            }
            child.validate()?;
        }
        Ok(())
    }
}
