use crate::error::{PasterError, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    Enigo::new(&Settings::default()).map_err(|err| {
        PasterError::Keyboard(format!("Failed to create keyboard controller: {}", err))
    })
}

/// Press Ctrl+V in whatever window has focus.
///
/// Control is released even when pressing `v` fails, so a failed paste never
/// leaves the modifier stuck down.
pub fn simulate_paste(keyboard: &mut Enigo) -> Result<()> {
    keyboard
        .key(Key::Control, Direction::Press)
        .map_err(|err| PasterError::Keyboard(format!("Failed to press Ctrl: {}", err)))?;

    let pressed = keyboard
        .key(Key::Unicode('v'), Direction::Click)
        .map_err(|err| PasterError::Keyboard(format!("Failed to press V: {}", err)));
    let released = keyboard
        .key(Key::Control, Direction::Release)
        .map_err(|err| PasterError::Keyboard(format!("Failed to release Ctrl: {}", err)));

    pressed.and(released)
}
