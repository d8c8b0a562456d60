use crate::error::{PasterError, Result};
use crate::keyboard::{create_keyboard_controller, simulate_paste};
use crate::selection::{SelectionSink, SelectionSource};
use crate::tree::Node;
use arboard::Clipboard;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Pause between writing the clipboard and simulating the paste, so the
/// target application sees the new clipboard contents.
pub const PASTE_DELAY: Duration = Duration::from_millis(50);

/// Set the clipboard content as text
pub fn set_clipboard_text(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| PasterError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| PasterError::Clipboard(e.to_string()))
}

/// Production selection sink: copy the template, and paste it right away
/// when auto-paste is on and the pick came from the cascade menu.
#[derive(Debug, Default)]
pub struct ClipboardSink {
    auto_paste: bool,
    last_status: Option<String>,
}

impl ClipboardSink {
    pub fn new(auto_paste: bool) -> Self {
        Self {
            auto_paste,
            last_status: None,
        }
    }

    pub fn auto_paste(&self) -> bool {
        self.auto_paste
    }

    fn paste(&self) -> Result<()> {
        thread::sleep(PASTE_DELAY);
        let mut keyboard = create_keyboard_controller()?;
        simulate_paste(&mut keyboard)
    }
}

impl SelectionSink for ClipboardSink {
    fn on_select(&mut self, node: &Node, source: SelectionSource) {
        if node.is_folder() {
            return;
        }

        if let Err(e) = set_clipboard_text(node.content()) {
            error!(template = node.name(), error = %e, "Failed to copy template");
            self.last_status = Some(format!("Could not copy '{}': {}", node.name(), e));
            return;
        }
        info!(template = node.name(), source = %source, "Template copied to clipboard");
        self.last_status = Some(format!("Copied '{}'", node.name()));

        if self.auto_paste && source == SelectionSource::Cascade {
            match self.paste() {
                Ok(()) => self.last_status = Some(format!("Pasted '{}'", node.name())),
                Err(e) => error!(template = node.name(), error = %e, "Auto-paste failed"),
            }
        }
    }

    fn set_auto_paste(&mut self, enabled: bool) {
        self.auto_paste = enabled;
    }

    fn take_status(&mut self) -> Option<String> {
        self.last_status.take()
    }
}
