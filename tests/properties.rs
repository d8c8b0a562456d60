use paster::storage::{from_json, to_json, Library};
use paster::{NodeId, PasterError, TreeStore};
use proptest::prelude::*;

/// One step of building a random tree: which existing folder to add to,
/// the new item's name, and whether it is a folder.
#[derive(Debug, Clone)]
struct AddOp {
    folder: usize,
    name: String,
    is_folder: bool,
    content: String,
}

fn arb_add_op() -> impl Strategy<Value = AddOp> {
    (0..64usize, "[a-d]{1,2}", any::<bool>(), "[ -~\n]{0,12}").prop_map(
        |(folder, name, is_folder, content)| AddOp {
            folder,
            name,
            is_folder,
            content,
        },
    )
}

fn build_tree(ops: &[AddOp]) -> TreeStore {
    let mut tree = TreeStore::new();
    let mut folders = vec![tree.root()];
    for op in ops {
        let parent = folders[op.folder % folders.len()];
        let added = if op.is_folder {
            tree.add_folder(parent, op.name.clone())
        } else {
            tree.add_leaf(parent, op.name.clone(), op.content.clone())
        };
        // Duplicate names are expected and leave the tree unchanged.
        if let Ok(id) = added {
            if op.is_folder {
                folders.push(id);
            }
        }
    }
    tree
}

fn folders_of(tree: &TreeStore) -> Vec<NodeId> {
    let mut folders = vec![tree.root()];
    folders.extend(
        tree.walk(tree.root())
            .into_iter()
            .filter(|&id| tree.get(id).map_or(false, |n| n.is_folder())),
    );
    folders
}

fn child_names(tree: &TreeStore, parent: NodeId) -> Vec<String> {
    tree.children(parent)
        .iter()
        .filter_map(|&id| tree.get(id).map(|n| n.name().to_string()))
        .collect()
}

proptest! {
    /// Every node is found again through its own path.
    #[test]
    fn prop_path_resolves_back_to_node(ops in prop::collection::vec(arb_add_op(), 0..40)) {
        let tree = build_tree(&ops);
        for id in tree.walk(tree.root()) {
            let path = tree.path_of(id);
            prop_assert_eq!(tree.resolve_path(&path), Some(id));
        }
        prop_assert_eq!(tree.resolve_path(""), Some(tree.root()));
    }

    /// Writing and reading the document preserves names, contents, kinds
    /// and sibling order.
    #[test]
    fn prop_json_round_trip(ops in prop::collection::vec(arb_add_op(), 0..40)) {
        let tree = build_tree(&ops);
        let json = to_json(&tree).unwrap();
        let reloaded = from_json(&json).unwrap();
        prop_assert_eq!(reloaded.to_subtree(), tree.to_subtree());
        prop_assert_eq!(reloaded.node_count(), tree.node_count());
    }

    /// A successful move up is undone by a move down, and moves at either
    /// end of a folder change nothing.
    #[test]
    fn prop_reorder_is_reversible(
        ops in prop::collection::vec(arb_add_op(), 1..40),
        pick in 0..64usize,
    ) {
        let mut tree = build_tree(&ops);
        let folders = folders_of(&tree);
        let parent = folders[pick % folders.len()];
        let before = child_names(&tree, parent);
        if before.is_empty() {
            return Ok(());
        }
        let name = before[pick % before.len()].clone();

        if tree.move_up(parent, &name) {
            prop_assert!(tree.move_down(parent, &name));
        }
        prop_assert_eq!(child_names(&tree, parent), before.clone());

        let first = before[0].clone();
        let last = before[before.len() - 1].clone();
        prop_assert!(!tree.move_up(parent, &first));
        prop_assert!(!tree.move_down(parent, &last));
        prop_assert_eq!(child_names(&tree, parent), before);
    }

    /// No folder can be moved into itself or anything below it.
    #[test]
    fn prop_moves_never_create_cycles(
        ops in prop::collection::vec(arb_add_op(), 1..40),
        pick in 0..64usize,
    ) {
        let mut tree = build_tree(&ops);
        let folders = folders_of(&tree);
        let node = folders[pick % folders.len()];
        if node == tree.root() {
            return Ok(());
        }
        let mut inside = vec![node];
        inside.extend(
            tree.walk(node)
                .into_iter()
                .filter(|&id| tree.get(id).map_or(false, |n| n.is_folder())),
        );
        let snapshot = tree.to_subtree();

        for target in inside {
            let result = tree.move_to_folder(node, target);
            prop_assert!(
                matches!(result, Err(PasterError::InvalidMove { .. })),
                "unexpected result {:?}",
                result
            );
        }
        prop_assert_eq!(tree.to_subtree(), snapshot);
    }

    /// A rejected duplicate insert does not touch the stored document.
    #[test]
    fn prop_duplicate_add_leaves_file_untouched(ops in prop::collection::vec(arb_add_op(), 1..30)) {
        let tree = build_tree(&ops);
        let existing = match tree.children(tree.root()).first() {
            Some(&id) => tree.get(id).map(|n| n.name().to_string()).unwrap(),
            None => return Ok(()),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let mut library = Library::with_tree(&path, tree);
        library.save().unwrap();
        let before = std::fs::read(&path).unwrap();

        let root = library.tree().root();
        let result = library.add_leaf(root, existing, "other");
        prop_assert!(matches!(result, Err(PasterError::DuplicateName(_))));
        prop_assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
