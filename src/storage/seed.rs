use crate::tree::{Subtree, ROOT_NAME};

/// The templates written when no usable store exists.
pub fn seed_tree() -> Subtree {
    Subtree::folder(ROOT_NAME)
        .with_child(
            Subtree::folder("Greetings")
                .with_child(Subtree::leaf("Good morning", "Good morning! How are you?"))
                .with_child(Subtree::leaf(
                    "Good afternoon",
                    "Good afternoon! I hope you are doing well.",
                ))
                .with_child(Subtree::leaf(
                    "Good evening",
                    "Good evening! Have a nice rest.",
                )),
        )
        .with_child(
            Subtree::folder("Signatures")
                .with_child(Subtree::leaf(
                    "Formal",
                    "Best regards,\nIvan Ivanov\nPhone: +7-123-456-7890",
                ))
                .with_child(Subtree::leaf("Friendly", "All the best!\nIvan")),
        )
        .with_child(
            Subtree::folder("Programming").with_child(
                Subtree::folder("Python")
                    .with_child(Subtree::leaf("Imports", "import os\nimport sys\nimport json"))
                    .with_child(Subtree::leaf(
                        "Main function",
                        "if __name__ == '__main__':\n    main()",
                    )),
            ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeStore;

    #[test]
    fn test_seed_tree_shape() {
        let tree = TreeStore::from_subtree(&seed_tree()).unwrap();
        assert_eq!(tree.children(tree.resolve_path("Greetings").unwrap()).len(), 3);
        assert_eq!(tree.children(tree.resolve_path("Signatures").unwrap()).len(), 2);
        assert_eq!(
            tree.children(tree.resolve_path("Programming/Python").unwrap()).len(),
            2
        );
        let imports = tree.resolve_path("Programming/Python/Imports").unwrap();
        assert_eq!(
            tree.get(imports).unwrap().content(),
            "import os\nimport sys\nimport json"
        );
    }
}
