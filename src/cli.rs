use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "paster - A hierarchical text template store",
    long_about = "paster keeps text templates in folders and pastes them from a global quick search or cascading menu."
)]
pub struct Paster {
    #[clap(long, global = true, help = "Directory holding templates, config and logs")]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the template manager with global hotkeys (default)
    Ui,
    /// Print the template tree
    List,
    /// Print the content of a template
    Show {
        #[clap(help = "Path of the template, e.g. Greetings/Good morning")]
        path: String,
    },
    /// Create a folder
    Mkdir {
        #[clap(help = "Path of the new folder")]
        path: String,
    },
    /// Add a new template
    Add {
        #[clap(help = "Path of the new template")]
        path: String,

        #[clap(long, short = 'c', default_value = "", help = "The template text")]
        content: String,
    },
    /// Rename an item or change a template's text
    Edit {
        #[clap(help = "Path of the item to edit")]
        path: String,

        #[clap(long, short = 'n', help = "New name")]
        name: Option<String>,

        #[clap(long, short = 'c', help = "New template text")]
        content: Option<String>,
    },
    /// Delete an item and everything below it
    Delete {
        #[clap(help = "Path of the item to delete")]
        path: String,
    },
    /// Move an item one place up within its folder
    Up {
        #[clap(help = "Path of the item")]
        path: String,
    },
    /// Move an item one place down within its folder
    Down {
        #[clap(help = "Path of the item")]
        path: String,
    },
    /// Move an item into another folder
    Move {
        #[clap(help = "Path of the item to move")]
        path: String,

        #[clap(help = "Destination folder; empty for the top level")]
        folder: String,
    },
    /// Search templates
    Search {
        query: String,

        #[clap(long, help = "Match template text as well as names")]
        full: bool,
    },
    /// Copy a template to the clipboard
    Copy {
        #[clap(help = "Path of the template")]
        path: String,
    },
    /// Show or change the global hotkeys
    Hotkeys {
        #[clap(long, help = "Hotkey for quick search, e.g. <ctrl>+1")]
        search: Option<String>,

        #[clap(long, help = "Hotkey for the cascade menu, e.g. <ctrl>+2")]
        cascade: Option<String>,
    },
    /// Show or change auto-paste after a menu selection
    AutoPaste {
        #[clap(value_enum)]
        state: Option<Toggle>,
    },
}
