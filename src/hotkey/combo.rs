//! Hotkey descriptors and matching against raw key events.
//!
//! A descriptor looks like `<ctrl>+<shift>+k`: `+`-separated tokens, angle
//! brackets optional, case ignored, exactly one non-modifier key.

use crate::error::{PasterError, Result};
use rdev::{EventType, Key};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    fn from_held(held: &[Key]) -> Self {
        let mut modifiers = Self::default();
        for key in held {
            match key {
                Key::ControlLeft | Key::ControlRight => modifiers.ctrl = true,
                Key::ShiftLeft | Key::ShiftRight => modifiers.shift = true,
                Key::Alt | Key::AltGr => modifiers.alt = true,
                Key::MetaLeft | Key::MetaRight => modifiers.meta = true,
                _ => {}
            }
        }
        modifiers
    }
}

fn is_modifier(key: Key) -> bool {
    matches!(
        key,
        Key::ControlLeft
            | Key::ControlRight
            | Key::ShiftLeft
            | Key::ShiftRight
            | Key::Alt
            | Key::AltGr
            | Key::MetaLeft
            | Key::MetaRight
    )
}

/// Key names accepted in descriptors, with their display form.
const NAMED_KEYS: &[(&str, Key)] = &[
    ("space", Key::Space),
    ("tab", Key::Tab),
    ("enter", Key::Return),
    ("return", Key::Return),
    ("esc", Key::Escape),
    ("escape", Key::Escape),
    ("insert", Key::Insert),
    ("delete", Key::Delete),
    ("home", Key::Home),
    ("end", Key::End),
    ("page_up", Key::PageUp),
    ("page_down", Key::PageDown),
    ("f1", Key::F1),
    ("f2", Key::F2),
    ("f3", Key::F3),
    ("f4", Key::F4),
    ("f5", Key::F5),
    ("f6", Key::F6),
    ("f7", Key::F7),
    ("f8", Key::F8),
    ("f9", Key::F9),
    ("f10", Key::F10),
    ("f11", Key::F11),
    ("f12", Key::F12),
];

const LETTER_KEYS: [Key; 26] = [
    Key::KeyA, Key::KeyB, Key::KeyC, Key::KeyD, Key::KeyE, Key::KeyF, Key::KeyG,
    Key::KeyH, Key::KeyI, Key::KeyJ, Key::KeyK, Key::KeyL, Key::KeyM, Key::KeyN,
    Key::KeyO, Key::KeyP, Key::KeyQ, Key::KeyR, Key::KeyS, Key::KeyT, Key::KeyU,
    Key::KeyV, Key::KeyW, Key::KeyX, Key::KeyY, Key::KeyZ,
];

const DIGIT_KEYS: [Key; 10] = [
    Key::Num0, Key::Num1, Key::Num2, Key::Num3, Key::Num4,
    Key::Num5, Key::Num6, Key::Num7, Key::Num8, Key::Num9,
];

fn key_from_token(token: &str) -> Option<Key> {
    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_lowercase() {
            return Some(LETTER_KEYS[(c as u8 - b'a') as usize]);
        }
        if c.is_ascii_digit() {
            return Some(DIGIT_KEYS[(c as u8 - b'0') as usize]);
        }
        return None;
    }
    NAMED_KEYS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, key)| *key)
}

fn key_name(key: Key) -> String {
    if let Some(i) = LETTER_KEYS.iter().position(|k| *k == key) {
        return char::from(b'a' + i as u8).to_string();
    }
    if let Some(i) = DIGIT_KEYS.iter().position(|k| *k == key) {
        return char::from(b'0' + i as u8).to_string();
    }
    NAMED_KEYS
        .iter()
        .find(|(_, k)| *k == key)
        .map(|(name, _)| format!("<{}>", name))
        .unwrap_or_else(|| format!("{:?}", key))
}

/// A parsed hotkey: a modifier set plus one main key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl FromStr for KeyCombo {
    type Err = PasterError;

    fn from_str(descriptor: &str) -> Result<Self> {
        let invalid = |reason: String| PasterError::InvalidHotkey {
            descriptor: descriptor.to_string(),
            reason,
        };

        if descriptor.trim().is_empty() {
            return Err(invalid("empty descriptor".to_string()));
        }

        let mut modifiers = Modifiers::default();
        let mut main_key = None;
        for raw in descriptor.split('+') {
            let token = raw
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_lowercase();
            match token.as_str() {
                "" => return Err(invalid("empty key name".to_string())),
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "alt_gr" => modifiers.alt = true,
                "cmd" | "super" | "win" | "meta" => modifiers.meta = true,
                other => {
                    let key = key_from_token(other)
                        .ok_or_else(|| invalid(format!("unknown key '{}'", other)))?;
                    if main_key.replace(key).is_some() {
                        return Err(invalid("more than one non-modifier key".to_string()));
                    }
                }
            }
        }

        let key = main_key.ok_or_else(|| invalid("no non-modifier key".to_string()))?;
        Ok(KeyCombo { modifiers, key })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [
            (m.ctrl, "<ctrl>"),
            (m.shift, "<shift>"),
            (m.alt, "<alt>"),
            (m.meta, "<cmd>"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        f.write_str(&key_name(self.key))
    }
}

/// Turns a stream of key events into trigger names.
///
/// A combination fires when its main key goes down while exactly its
/// modifiers are held. Holding the key does not fire again until release.
#[derive(Debug, Default)]
pub struct ComboMatcher {
    bindings: Vec<(String, KeyCombo)>,
    // rdev::Key is not Hash, and only a handful of keys are ever held.
    held: Vec<Key>,
}

impl ComboMatcher {
    pub fn new(bindings: impl IntoIterator<Item = (String, KeyCombo)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
            held: Vec::new(),
        }
    }

    /// Parse every `trigger -> descriptor` pair, skipping the ones that do
    /// not parse.
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        let bindings = descriptors.into_iter().filter_map(|(trigger, descriptor)| {
            match descriptor.parse::<KeyCombo>() {
                Ok(combo) => Some((trigger.clone(), combo)),
                Err(e) => {
                    warn!(trigger = %trigger, error = %e, "Skipping hotkey binding");
                    None
                }
            }
        });
        Self::new(bindings)
    }

    pub fn bindings(&self) -> &[(String, KeyCombo)] {
        &self.bindings
    }

    pub fn feed(&mut self, event: &EventType) -> Option<&str> {
        match *event {
            EventType::KeyPress(key) => {
                if self.held.contains(&key) {
                    return None;
                }
                self.held.push(key);
                if is_modifier(key) {
                    return None;
                }
                let modifiers = Modifiers::from_held(&self.held);
                self.bindings
                    .iter()
                    .find(|(_, combo)| combo.key == key && combo.modifiers == modifiers)
                    .map(|(trigger, _)| trigger.as_str())
            }
            EventType::KeyRelease(key) => {
                self.held.retain(|k| *k != key);
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ComboMatcher {
        ComboMatcher::new(vec![
            ("search".to_string(), "<ctrl>+1".parse().unwrap()),
            ("cascade".to_string(), "<ctrl>+2".parse().unwrap()),
        ])
    }

    #[test]
    fn test_parse_descriptors() {
        let combo: KeyCombo = "<ctrl>+<shift>+k".parse().unwrap();
        assert!(combo.modifiers.ctrl && combo.modifiers.shift);
        assert!(!combo.modifiers.alt && !combo.modifiers.meta);
        assert_eq!(combo.key, Key::KeyK);

        let combo: KeyCombo = "Alt + F5".parse().unwrap();
        assert!(combo.modifiers.alt);
        assert_eq!(combo.key, Key::F5);

        let combo: KeyCombo = "<cmd>+<page_down>".parse().unwrap();
        assert!(combo.modifiers.meta);
        assert_eq!(combo.key, Key::PageDown);
    }

    #[test]
    fn test_parse_rejects_bad_descriptors() {
        for bad in ["", "   ", "<ctrl>", "<ctrl>+a+b", "<ctrl>++a", "<ctrl>+banana"] {
            assert!(
                matches!(bad.parse::<KeyCombo>(), Err(PasterError::InvalidHotkey { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_is_canonical() {
        let combo: KeyCombo = "SHIFT+control+A".parse().unwrap();
        assert_eq!(combo.to_string(), "<ctrl>+<shift>+a");
        let combo: KeyCombo = "<alt>+<esc>".parse().unwrap();
        assert_eq!(combo.to_string(), "<alt>+<esc>");
    }

    #[test]
    fn test_matcher_requires_exact_modifiers() {
        let mut m = matcher();
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num1)), None);
        m.feed(&EventType::KeyRelease(Key::Num1));

        m.feed(&EventType::KeyPress(Key::ControlLeft));
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num1)), Some("search"));
        m.feed(&EventType::KeyRelease(Key::Num1));

        m.feed(&EventType::KeyPress(Key::ShiftLeft));
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num2)), None);
        m.feed(&EventType::KeyRelease(Key::Num2));
        m.feed(&EventType::KeyRelease(Key::ShiftLeft));

        assert_eq!(m.feed(&EventType::KeyPress(Key::Num2)), Some("cascade"));
    }

    #[test]
    fn test_matcher_ignores_auto_repeat() {
        let mut m = matcher();
        m.feed(&EventType::KeyPress(Key::ControlRight));
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num1)), Some("search"));
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num1)), None);
        m.feed(&EventType::KeyRelease(Key::Num1));
        assert_eq!(m.feed(&EventType::KeyPress(Key::Num1)), Some("search"));
    }

    #[test]
    fn test_from_descriptors_skips_invalid() {
        let search = "search".to_string();
        let cascade = "cascade".to_string();
        let good = "<ctrl>+1".to_string();
        let bad = "<ctrl>+".to_string();
        let m = ComboMatcher::from_descriptors(vec![(&search, &good), (&cascade, &bad)]);
        assert_eq!(m.bindings().len(), 1);
        assert_eq!(m.bindings()[0].0, "search");
    }
}
