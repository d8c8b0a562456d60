use crate::cascade::InputGrab;
use crate::error::{PasterError, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use std::io::stdout;
use tracing::warn;

/// Input grab for the terminal UI.
///
/// The UI already reads every key in raw mode. The grab adds mouse capture,
/// so clicks outside the open menu reach the application and close it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalGrab;

/// Mouse capture is switched off again when this is dropped.
#[derive(Debug)]
pub struct MouseCaptureGuard;

impl InputGrab for TerminalGrab {
    type Guard = MouseCaptureGuard;

    fn acquire(&mut self) -> Result<MouseCaptureGuard> {
        execute!(stdout(), EnableMouseCapture).map_err(|e| PasterError::Grab(e.to_string()))?;
        Ok(MouseCaptureGuard)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(stdout(), DisableMouseCapture) {
            warn!(error = %e, "Failed to release mouse capture");
        }
    }
}
