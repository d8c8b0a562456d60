//! Recursive search over the template tree.
//!
//! Both searches visit every node once, depth-first and pre-order, following
//! the stored child order. Results come back in visitation order.

use crate::tree::{NodeId, TreeStore};

/// Folders and templates whose name contains `query`, ignoring case.
///
/// A matching folder does not pull in its descendants; they are tested on
/// their own.
pub fn search_by_name(tree: &TreeStore, query: &str) -> Vec<NodeId> {
    let needle = query.to_lowercase();
    tree.walk(tree.root())
        .into_iter()
        .filter(|id| {
            tree.get(*id)
                .map_or(false, |node| node.name().to_lowercase().contains(&needle))
        })
        .collect()
}

/// Templates whose name or content contains `query`, ignoring case.
///
/// Folders never match but are still descended into. A blank query matches
/// nothing.
pub fn search_full(tree: &TreeStore, query: &str) -> Vec<NodeId> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    tree.walk(tree.root())
        .into_iter()
        .filter(|id| {
            tree.get(*id).map_or(false, |node| {
                node.is_leaf()
                    && (node.name().to_lowercase().contains(&needle)
                        || node.content().to_lowercase().contains(&needle))
            })
        })
        .collect()
}
