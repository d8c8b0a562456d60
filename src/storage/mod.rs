//! On-disk template store.
//!
//! [`Library`] owns the [`TreeStore`] together with the file it lives in and
//! writes the whole tree back after every successful mutation. A missing or
//! unreadable file is replaced by the seed tree.

pub mod codec;
pub mod seed;

pub use codec::{from_json, to_json};
pub use seed::seed_tree;

use crate::error::Result;
use crate::tree::{MoveOutcome, NodeId, Subtree, TreeStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// How the current tree was obtained when the library was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Loaded,
    SeededMissing,
    SeededCorrupt,
}

#[derive(Debug)]
pub struct Library {
    tree: TreeStore,
    path: PathBuf,
    origin: LoadOrigin,
}

fn seeded_store() -> TreeStore {
    // The seed is a literal and always valid; fall back to an empty root
    // rather than panic if that ever stops being true.
    TreeStore::from_subtree(&seed_tree()).unwrap_or_default()
}

impl Library {
    /// Open the store at `path`, seeding it if the file is absent or cannot
    /// be parsed. Seeding writes the file straight away.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tree, origin) = match fs::read_to_string(&path) {
            Ok(text) => match from_json(&text) {
                Ok(tree) => {
                    debug!(
                        path = %path.display(),
                        nodes = tree.node_count(),
                        "Loaded template store"
                    );
                    (tree, LoadOrigin::Loaded)
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Template store is unreadable, replacing it with the default templates"
                    );
                    (seeded_store(), LoadOrigin::SeededCorrupt)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No template store yet, creating default templates");
                (seeded_store(), LoadOrigin::SeededMissing)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not read template store, replacing it with the default templates"
                );
                (seeded_store(), LoadOrigin::SeededCorrupt)
            }
        };

        let library = Self { tree, path, origin };
        if origin != LoadOrigin::Loaded {
            library.persist();
        }
        library
    }

    /// A library backed by `path` holding `tree`, without touching the disk.
    pub fn with_tree(path: impl Into<PathBuf>, tree: TreeStore) -> Self {
        Self {
            tree,
            path: path.into(),
            origin: LoadOrigin::Loaded,
        }
    }

    pub fn tree(&self) -> &TreeStore {
        &self.tree
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Write the whole tree to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let serialized = to_json(&self.tree)?;
        fs::write(&self.path, serialized)?;
        debug!(path = %self.path.display(), "Saved template store");
        Ok(())
    }

    /// Save, logging instead of failing. The in-memory tree stays
    /// authoritative when the disk write does not go through.
    pub fn persist(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to save template store");
                false
            }
        }
    }

    pub fn add_child(&mut self, parent: NodeId, node: Subtree) -> Result<NodeId> {
        let id = self.tree.add_child(parent, node)?;
        self.persist();
        Ok(id)
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

    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Option<Subtree> {
        let removed = self.tree.remove_child(parent, name);
        if removed.is_some() {
            self.persist();
        }
        removed
    }

    pub fn remove_node(&mut self, id: NodeId) -> Result<Subtree> {
        let removed = self.tree.remove_node(id)?;
        self.persist();
        Ok(removed)
    }

    pub fn move_up(&mut self, parent: NodeId, name: &str) -> bool {
        let moved = self.tree.move_up(parent, name);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn move_down(&mut self, parent: NodeId, name: &str) -> bool {
        let moved = self.tree.move_down(parent, name);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn move_to_folder(&mut self, node: NodeId, target: NodeId) -> Result<MoveOutcome> {
        let outcome = self.tree.move_to_folder(node, target)?;
        if outcome == MoveOutcome::Moved {
            self.persist();
        }
        Ok(outcome)
    }

    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let unchanged = self.tree.get(id).map_or(false, |n| n.name() == new_name);
        self.tree.rename(id, new_name)?;
        if !unchanged {
            self.persist();
        }
        Ok(())
    }

    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        let unchanged = self.tree.get(id).map_or(false, |n| n.content() == content);
        self.tree.set_content(id, content)?;
        if !unchanged {
            self.persist();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PasterError;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_file_seeds_and_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("templates.json");

        let library = Library::open(&path);
        assert_eq!(library.origin(), LoadOrigin::SeededMissing);
        assert!(path.exists());
        assert!(library.tree().resolve_path("Greetings/Good morning").is_some());

        let reopened = Library::open(&path);
        assert_eq!(reopened.origin(), LoadOrigin::Loaded);
        assert_eq!(reopened.tree().to_subtree(), library.tree().to_subtree());
    }

    #[test]
    fn test_open_corrupt_file_reseeds_and_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.json");
        fs::write(&path, "{ this is not json").unwrap();

        let library = Library::open(&path);
        assert_eq!(library.origin(), LoadOrigin::SeededCorrupt);
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(from_json(&on_disk).is_ok());
    }

    #[test]
    fn test_mutations_are_written_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let mut library = Library::open(&path);
        let root = library.tree().root();

        let work = library.add_folder(root, "Work").unwrap();
        library.add_leaf(work, "Reply", "Thanks!").unwrap();
        assert!(library.move_up(root, "Work"));

        let reopened = Library::open(&path);
        let reply = reopened.tree().resolve_path("Work/Reply").unwrap();
        assert_eq!(reopened.tree().get(reply).unwrap().content(), "Thanks!");
        let names: Vec<&str> = reopened
            .tree()
            .children(reopened.tree().root())
            .iter()
            .map(|id| reopened.tree().get(*id).unwrap().name())
            .collect();
        assert_eq!(names[names.len() - 2], "Work");
    }

    #[test]
    fn test_rejected_mutation_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let mut library = Library::open(&path);
        let root = library.tree().root();
        let before = fs::read_to_string(&path).unwrap();

        assert!(matches!(
            library.add_folder(root, "Greetings"),
            Err(PasterError::DuplicateName(_))
        ));
        assert!(!library.move_up(root, "Greetings"));
        assert!(library.remove_child(root, "missing").is_none());

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("templates.json");
        fs::create_dir(&path).unwrap();

        let mut library = Library::with_tree(&path, TreeStore::new());
        let root = library.tree().root();
        let id = library.add_leaf(root, "kept", "still here").unwrap();
        assert!(!library.persist());
        assert_eq!(library.tree().get(id).unwrap().content(), "still here");
    }
}
