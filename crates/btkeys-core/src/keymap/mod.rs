//! Key code translation for report encoding.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Platform key codes are translated to HID when a shortcut is encoded.

pub mod android;
pub mod hid;

pub use hid::HidKeyCode;

use crate::report::{modifier, KeyboardReport};
use crate::shortcut::{KeyCode, Modifier, ModifierSet, Shortcut};

/// Read-only translation tables used by the report encoder.
///
/// A `Keymap` answers two questions: which HID usage does a platform key code
/// produce, and which modifier-byte bit does an abstract modifier set.  It is
/// `Copy` and holds only `'static` tables, so it can be shared freely.
#[derive(Debug, Clone, Copy)]
pub struct Keymap {
    lookup: fn(KeyCode) -> Option<HidKeyCode>,
}

impl Keymap {
    /// Keymap for Android `KeyEvent.KEYCODE_*` values.
    pub fn android() -> Self {
        Self {
            lookup: android::keycode_to_hid,
        }
    }

    /// Returns the HID usage for `key`, or `None` when the key has no
    /// keyboard-page equivalent.
    pub fn usage_for(&self, key: KeyCode) -> Option<HidKeyCode> {
        (self.lookup)(key)
    }

    /// Returns the modifier-byte bit for a single modifier.
    ///
    /// Abstract modifiers are encoded as the left-hand key.
    pub fn modifier_bit(&self, modifier: Modifier) -> u8 {
        match modifier {
            Modifier::Ctrl => modifier::LEFT_CTRL,
            Modifier::Shift => modifier::LEFT_SHIFT,
            Modifier::Alt => modifier::LEFT_ALT,
            Modifier::Meta => modifier::LEFT_META,
        }
    }

    /// ORs together the bits of every modifier in `modifiers`.
    pub fn modifier_bits(&self, modifiers: ModifierSet) -> u8 {
        modifiers
            .iter()
            .fold(0, |byte, m| byte | self.modifier_bit(m))
    }

    /// Encodes the key-down report for `shortcut`.
    ///
    /// When the primary key is itself a modifier (e.g. `KEYCODE_CTRL_LEFT`)
    /// its bit is merged into the modifier byte and every key slot stays
    /// empty, as the boot report never carries 0xE0–0xE7 in a slot.
    ///
    /// Returns `None` if the primary key is unmapped.
    pub fn press_report(&self, shortcut: &Shortcut) -> Option<KeyboardReport> {
        let usage = self.usage_for(shortcut.key)?;
        let modifiers = self.modifier_bits(shortcut.modifiers);
        Some(match usage.modifier_bit() {
            Some(bit) => KeyboardReport::modifiers_only(modifiers | bit),
            None => KeyboardReport::press(modifiers, usage.as_u8()),
        })
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::android()
    }
}
