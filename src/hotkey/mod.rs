//! Global hotkeys: descriptor parsing, the background listener, and the
//! bridge that brings activations back onto the UI thread.

pub mod bridge;
pub mod combo;
pub mod listener;

pub use bridge::{
    HotkeyBridge, TriggerSender, TRIGGER_CASCADE, TRIGGER_LISTENER_DOWN, TRIGGER_SEARCH,
};
pub use combo::{ComboMatcher, KeyCombo, Modifiers};
pub use listener::spawn_listener;
