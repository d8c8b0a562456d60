//! Paster - a hierarchical text template store.
//!
//! Templates live in an ordered tree of folders and leaves, persisted as
//! JSON. Global hotkeys open a quick search or a cascading menu, and a picked
//! template is copied to the clipboard (and optionally pasted).

pub mod cascade;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod hotkey;
pub mod keyboard;
pub mod logging;
pub mod quick_search;
pub mod search;
pub mod selection;
pub mod storage;
pub mod tree;
pub mod ui;

// Re-export
pub use cascade::{build_menu, CascadeMenu, InputGrab, MenuEntry};
pub use clipboard::{set_clipboard_text, ClipboardSink};
pub use config::{get_config_dir, load_config, save_config, Config, Paths};
pub use error::{PasterError, Result};
pub use logging::init_logging;
pub use quick_search::QuickSearch;
pub use search::{search_by_name, search_full};
pub use selection::{RecordingSink, Selection, SelectionSink, SelectionSource};
pub use storage::{Library, LoadOrigin};
pub use tree::{split_path, MoveOutcome, Node, NodeId, NodeKind, Subtree, TreeStore, MAX_DEPTH};
