//! The hierarchical, ordered template tree.
//!
//! [`TreeStore`] owns every [`Node`] and is the only place structure changes.
//! [`Subtree`] is the owned, detached form used for seeding, removal results
//! and persistence.

pub mod node;
pub mod store;
pub mod subtree;

pub use node::{validate_name, Node, NodeId, NodeKind};
pub use store::{MoveOutcome, TreeStore, MAX_DEPTH, ROOT_NAME};
pub use subtree::Subtree;

/// Split a path into its parent path and final name.
///
/// `"A/B/c"` gives `("A/B", "c")`; a single segment has the root (`""`) as
/// parent. Empty segments are dropped first, so `"/A//c/"` gives `("A", "c")`.
pub fn split_path(path: &str) -> Option<(String, String)> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let name = segments.pop()?;
    Some((segments.join("/"), name.to_string()))
}
