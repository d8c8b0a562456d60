use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("An item named '{0}' already exists in this folder")]
    DuplicateName(String),

    #[error("Invalid name '{0}': names must be non-empty and must not contain '/'")]
    InvalidName(String),

    #[error("Nothing found at '{0}'")]
    NotFound(String),

    #[error("'{0}' is not a folder")]
    NotAFolder(String),

    #[error("'{0}' is not a template")]
    NotATemplate(String),

    #[error("Cannot move '{node}' into '{target}': {reason}")]
    InvalidMove {
        node: String,
        target: String,
        reason: &'static str,
    },

    #[error("The root folder cannot be renamed, moved or deleted")]
    RootNode,

    #[error("'{path}' would be nested deeper than {limit} levels")]
    TooDeep { path: String, limit: usize },

    #[error("Invalid template data: {0}")]
    InvalidData(String),

    #[error("Invalid hotkey '{descriptor}': {reason}")]
    InvalidHotkey { descriptor: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Keyboard controller error: {0}")]
    Keyboard(String),

    #[error("Input grab error: {0}")]
    Grab(String),
}

pub type Result<T> = std::result::Result<T, PasterError>;
