use crate::cli::{Commands, Toggle};
use paster::config::{load_config, save_config, Paths};
use paster::hotkey::{TRIGGER_CASCADE, TRIGGER_SEARCH};
use paster::storage::{Library, LoadOrigin};
use paster::tree::{split_path, MoveOutcome, NodeId, TreeStore};
use paster::{
    init_logging, search_by_name, search_full, ClipboardSink, PasterError, Result,
    SelectionSink, SelectionSource,
};
use std::path::PathBuf;
use tracing::info;

pub fn handle_command(data_dir: Option<PathBuf>, command: Option<Commands>) -> Result<()> {
    let paths = Paths::resolve(data_dir);
    paths.ensure_dir()?;
    init_logging(&paths.log_file())?;

    match command {
        Some(command) => handle_subcommand(&paths, command),
        None => paster::ui::run(&paths), // Default: open the manager
    }
}

fn handle_subcommand(paths: &Paths, command: Commands) -> Result<()> {
    match command {
        Commands::Ui => paster::ui::run(paths),
        Commands::List => {
            let library = open_library(paths);
            print!("{}", format_tree(library.tree()));
            Ok(())
        }
        Commands::Show { path } => {
            let library = open_library(paths);
            let node = resolve_leaf(library.tree(), &path)?;
            println!("{}", library.tree().get(node).map_or("", |n| n.content()));
            Ok(())
        }
        Commands::Mkdir { path } => {
            let mut library = open_library(paths);
            let (parent, name) = resolve_parent(library.tree(), &path)?;
            library
                .add_folder(parent, name)
                .map(|_| println!("Folder created successfully"))
        }
        Commands::Add { path, content } => {
            let mut library = open_library(paths);
            let (parent, name) = resolve_parent(library.tree(), &path)?;
            library
                .add_leaf(parent, name, content)
                .map(|_| println!("Template added successfully"))
        }
        Commands::Edit {
            path,
            name,
            content,
        } => handle_edit(paths, &path, name, content),
        Commands::Delete { path } => {
            let mut library = open_library(paths);
            let node = resolve(library.tree(), &path)?;
            let removed = library.remove_node(node)?;
            println!(
                "Deleted '{}' ({} item(s))",
                removed.name,
                removed.node_count()
            );
            Ok(())
        }
        Commands::Up { path } => handle_reorder(paths, &path, true),
        Commands::Down { path } => handle_reorder(paths, &path, false),
        Commands::Move { path, folder } => {
            let mut library = open_library(paths);
            let node = resolve(library.tree(), &path)?;
            let target = resolve(library.tree(), &folder)?;
            match library.move_to_folder(node, target)? {
                MoveOutcome::Moved => println!("Moved to '/{}'", folder.trim_matches('/')),
                MoveOutcome::AlreadyThere => println!("Already in that folder"),
            }
            Ok(())
        }
        Commands::Search { query, full } => {
            let library = open_library(paths);
            let tree = library.tree();
            let results = if full {
                search_full(tree, &query)
            } else {
                search_by_name(tree, &query)
            };
            if results.is_empty() {
                println!("No matches");
            }
            for id in results {
                println!("/{}", tree.path_of(id));
            }
            Ok(())
        }
        Commands::Copy { path } => {
            let library = open_library(paths);
            let id = resolve_leaf(library.tree(), &path)?;
            let mut sink = ClipboardSink::new(false);
            if let Some(node) = library.tree().get(id) {
                sink.on_select(node, SelectionSource::Manager);
            }
            if let Some(status) = sink.take_status() {
                println!("{}", status);
            }
            Ok(())
        }
        Commands::Hotkeys { search, cascade } => handle_hotkeys(paths, search, cascade),
        Commands::AutoPaste { state } => {
            let config_path = paths.config_file();
            let mut config = load_config(&config_path);
            if let Some(state) = state {
                config.features.auto_paste = state == Toggle::On;
                save_config(&config_path, &config)?;
                info!(enabled = config.features.auto_paste, "Auto-paste changed");
            }
            println!(
                "Auto-paste is {}",
                if config.features.auto_paste { "on" } else { "off" }
            );
            Ok(())
        }
    }
}

fn handle_edit(
    paths: &Paths,
    path: &str,
    name: Option<String>,
    content: Option<String>,
) -> Result<()> {
    if name.is_none() && content.is_none() {
        println!("Nothing to change; pass --name and/or --content");
        return Ok(());
    }
    let mut library = open_library(paths);
    let node = if content.is_some() {
        resolve_leaf(library.tree(), path)?
    } else {
        resolve(library.tree(), path)?
    };
    // Rename first: it is the step that can be refused.
    if let Some(name) = name {
        library.rename(node, name.trim())?;
    }
    if let Some(content) = content {
        library.set_content(node, content)?;
    }
    println!("Updated '/{}'", library.tree().path_of(node));
    Ok(())
}

fn handle_reorder(paths: &Paths, path: &str, up: bool) -> Result<()> {
    let mut library = open_library(paths);
    let node = resolve(library.tree(), path)?;
    let (parent, name) = match library.tree().get(node) {
        Some(n) => match n.parent() {
            Some(parent) => (parent, n.name().to_string()),
            None => return Err(PasterError::RootNode),
        },
        None => return Err(PasterError::NotFound(path.to_string())),
    };
    let moved = if up {
        library.move_up(parent, &name)
    } else {
        library.move_down(parent, &name)
    };
    match (moved, up) {
        (true, _) => println!(
            "'{}' is now at position {}",
            name,
            library.tree().position(parent, &name).map_or(0, |p| p + 1)
        ),
        (false, true) => println!("'{}' is already first", name),
        (false, false) => println!("'{}' is already last", name),
    }
    Ok(())
}

fn handle_hotkeys(paths: &Paths, search: Option<String>, cascade: Option<String>) -> Result<()> {
    let config_path = paths.config_file();
    let mut config = load_config(&config_path);

    if search.is_some() || cascade.is_some() {
        let search =
            search.unwrap_or_else(|| config.hotkey(TRIGGER_SEARCH).unwrap_or("").to_string());
        let cascade =
            cascade.unwrap_or_else(|| config.hotkey(TRIGGER_CASCADE).unwrap_or("").to_string());
        config.set_hotkeys(&search, &cascade)?;
        save_config(&config_path, &config)?;
        println!("Hotkeys saved; restart the manager to use them");
    }

    for (trigger, descriptor) in &config.hotkeys {
        println!("{:<8} {}", trigger, descriptor);
    }
    Ok(())
}

fn open_library(paths: &Paths) -> Library {
    let library = Library::open(paths.db_file());
    if library.origin() == LoadOrigin::SeededCorrupt {
        eprintln!(
            "Warning: {} could not be read and was replaced with the default templates",
            library.path().display()
        );
    }
    library
}

fn resolve(tree: &TreeStore, path: &str) -> Result<NodeId> {
    tree.resolve_path(path)
        .ok_or_else(|| PasterError::NotFound(path.to_string()))
}

fn resolve_leaf(tree: &TreeStore, path: &str) -> Result<NodeId> {
    let id = resolve(tree, path)?;
    match tree.get(id) {
        Some(node) if node.is_leaf() => Ok(id),
        _ => Err(PasterError::NotATemplate(path.to_string())),
    }
}

/// Split `path` and resolve everything but the last segment to a folder.
fn resolve_parent(tree: &TreeStore, path: &str) -> Result<(NodeId, String)> {
    let (parent_path, name) =
        split_path(path).ok_or_else(|| PasterError::InvalidName(path.to_string()))?;
    let parent = resolve(tree, &parent_path)?;
    match tree.get(parent) {
        Some(node) if node.is_folder() => Ok((parent, name)),
        _ => Err(PasterError::NotAFolder(parent_path)),
    }
}

/// Indented listing of the whole tree, folders marked with a trailing `/`.
pub fn format_tree(tree: &TreeStore) -> String {
    let mut out = String::new();
    for id in tree.walk(tree.root()) {
        if let Some(node) = tree.get(id) {
            let indent = "  ".repeat(tree.depth(id).saturating_sub(1));
            let suffix = if node.is_folder() { "/" } else { "" };
            out.push_str(&format!("{}{}{}\n", indent, node.name(), suffix));
        }
    }
    out
}
