//! Keyboard shortcuts: a primary key plus a set of held modifiers.
//!
//! A [`Shortcut`] is what the UI layer asks to "press".  It is expressed in
//! platform key codes ([`KeyCode`], Android `KeyEvent.KEYCODE_*` values) and
//! abstract [`Modifier`]s; the [`Keymap`](crate::keymap::Keymap) turns it into
//! HID usages when a report is built.
//!
//! Shortcuts also have a text form used in configuration and logs:
//!
//! ```text
//! A            -> KEYCODE_A, no modifiers
//! Ctrl+Shift+T -> KEYCODE_T, Ctrl | Shift
//! Meta+Space   -> KEYCODE_SPACE, Meta
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keymap::android;

/// A platform key code (Android `KeyEvent.KEYCODE_*` value).
///
/// The set of values is closed (Android defines a fixed enumeration) but not
/// every value has a keyboard usage; media and D-pad centre keys, for
/// example, are rejected by the keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const DPAD_UP: KeyCode = KeyCode(19);
    pub const DPAD_DOWN: KeyCode = KeyCode(20);
    pub const DPAD_LEFT: KeyCode = KeyCode(21);
    pub const DPAD_RIGHT: KeyCode = KeyCode(22);
    pub const DPAD_CENTER: KeyCode = KeyCode(23);
    pub const VOLUME_UP: KeyCode = KeyCode(24);
    pub const VOLUME_DOWN: KeyCode = KeyCode(25);

    pub const DIGIT_0: KeyCode = KeyCode(7);
    pub const DIGIT_1: KeyCode = KeyCode(8);
    pub const DIGIT_2: KeyCode = KeyCode(9);
    pub const DIGIT_3: KeyCode = KeyCode(10);
    pub const DIGIT_4: KeyCode = KeyCode(11);
    pub const DIGIT_5: KeyCode = KeyCode(12);
    pub const DIGIT_6: KeyCode = KeyCode(13);
    pub const DIGIT_7: KeyCode = KeyCode(14);
    pub const DIGIT_8: KeyCode = KeyCode(15);
    pub const DIGIT_9: KeyCode = KeyCode(16);

    pub const A: KeyCode = KeyCode(29);
    pub const B: KeyCode = KeyCode(30);
    pub const C: KeyCode = KeyCode(31);
    pub const D: KeyCode = KeyCode(32);
    pub const E: KeyCode = KeyCode(33);
    pub const F: KeyCode = KeyCode(34);
    pub const G: KeyCode = KeyCode(35);
    pub const H: KeyCode = KeyCode(36);
    pub const T: KeyCode = KeyCode(48);
    pub const Z: KeyCode = KeyCode(54);

    pub const TAB: KeyCode = KeyCode(61);
    pub const SPACE: KeyCode = KeyCode(62);
    pub const ENTER: KeyCode = KeyCode(66);
    /// Backspace (Android calls it `KEYCODE_DEL`).
    pub const DEL: KeyCode = KeyCode(67);
    pub const ESCAPE: KeyCode = KeyCode(111);
    pub const CTRL_LEFT: KeyCode = KeyCode(113);
    pub const F1: KeyCode = KeyCode(131);
    pub const F12: KeyCode = KeyCode(142);
    pub const MEDIA_PLAY_PAUSE: KeyCode = KeyCode(85);
}

/// An abstract modifier key.
///
/// Modifiers are side-agnostic; the keymap encodes each one as the left-hand
/// bit of the HID modifier byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl Modifier {
    /// All modifiers in canonical display order.
    pub const ALL: [Modifier; 4] = [Modifier::Ctrl, Modifier::Shift, Modifier::Alt, Modifier::Meta];

    fn flag(self) -> u8 {
        match self {
            Modifier::Ctrl => 1 << 0,
            Modifier::Shift => 1 << 1,
            Modifier::Alt => 1 << 2,
            Modifier::Meta => 1 << 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Modifier::Ctrl => "Ctrl",
            Modifier::Shift => "Shift",
            Modifier::Alt => "Alt",
            Modifier::Meta => "Meta",
        }
    }
}

/// An unordered set of modifiers.  Inserting a modifier twice is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierSet(u8);

impl ModifierSet {
    /// Android `KeyEvent.META_SHIFT_ON`.
    pub const ANDROID_META_SHIFT_ON: i32 = 0x0000_0001;
    /// Android `KeyEvent.META_ALT_ON`.
    pub const ANDROID_META_ALT_ON: i32 = 0x0000_0002;
    /// Android `KeyEvent.META_CTRL_ON`.
    pub const ANDROID_META_CTRL_ON: i32 = 0x0000_1000;
    /// Android `KeyEvent.META_META_ON`.
    pub const ANDROID_META_META_ON: i32 = 0x0001_0000;

    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from an Android `KeyEvent.getMetaState()` value.
    ///
    /// The side-specific flags (`META_CTRL_LEFT_ON`, ...) always come with
    /// their aggregate flag set, so only the aggregates are inspected.
    pub fn from_android_meta_state(meta_state: i32) -> Self {
        let mut set = Self::empty();
        let pairs = [
            (Self::ANDROID_META_CTRL_ON, Modifier::Ctrl),
            (Self::ANDROID_META_SHIFT_ON, Modifier::Shift),
            (Self::ANDROID_META_ALT_ON, Modifier::Alt),
            (Self::ANDROID_META_META_ON, Modifier::Meta),
        ];
        for (flag, modifier) in pairs {
            if meta_state & flag != 0 {
                set.insert(modifier);
            }
        }
        set
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.flag();
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0 & modifier.flag() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the members in canonical order (Ctrl, Shift, Alt, Meta).
    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        Modifier::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Self::empty();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl<const N: usize> From<[Modifier; N]> for ModifierSet {
    fn from(modifiers: [Modifier; N]) -> Self {
        modifiers.into_iter().collect()
    }
}

/// A key to press together with the modifiers held while pressing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shortcut {
    pub key: KeyCode,
    pub modifiers: ModifierSet,
}

impl Shortcut {
    /// A bare key press with no modifiers.
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: ModifierSet::empty(),
        }
    }

    pub fn with_modifiers(key: KeyCode, modifiers: impl Into<ModifierSet>) -> Self {
        Self {
            key,
            modifiers: modifiers.into(),
        }
    }
}

/// Error returned when parsing the `"Ctrl+Shift+A"` text form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut is empty")]
    Empty,
    #[error("unknown key name {0:?}")]
    UnknownKey(String),
    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
}

fn parse_modifier(token: &str) -> Option<Modifier> {
    match token.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifier::Ctrl),
        "shift" => Some(Modifier::Shift),
        "alt" | "option" => Some(Modifier::Alt),
        "meta" | "super" | "win" | "cmd" => Some(Modifier::Meta),
        _ => None,
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key_token, modifier_tokens) = match tokens.split_last() {
            Some((key, mods)) if !key.is_empty() => (*key, mods),
            _ => return Err(ShortcutParseError::Empty),
        };

        let mut modifiers = ModifierSet::empty();
        for token in modifier_tokens {
            let modifier = parse_modifier(token)
                .ok_or_else(|| ShortcutParseError::UnknownModifier(token.to_string()))?;
            modifiers.insert(modifier);
        }

        let key = android::keycode_from_name(key_token)
            .ok_or_else(|| ShortcutParseError::UnknownKey(key_token.to_string()))?;
        Ok(Shortcut { key, modifiers })
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers.iter() {
            write!(f, "{}+", modifier.name())?;
        }
        write!(f, "{}", self.key)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match android::keycode_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "KEYCODE({})", self.0),
        }
    }
}
