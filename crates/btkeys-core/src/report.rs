//! HID boot keyboard input report.
//!
//! Layout (8 bytes), identical to the USB boot-protocol keyboard report:
//!
//! ```text
//! Byte 0:   modifier bit-flags
//!           bit 0 = Left Ctrl,  bit 1 = Left Shift,
//!           bit 2 = Left Alt,   bit 3 = Left Meta,
//!           bit 4 = Right Ctrl, bit 5 = Right Shift,
//!           bit 6 = Right Alt,  bit 7 = Right Meta
//! Byte 1:   reserved, always 0x00
//! Byte 2-7: up to six held key usages, unused slots 0x00
//! ```
//!
//! The bit order is fixed by the report descriptor below and must not change:
//! hosts decode the modifier byte using the descriptor they read at
//! connection time.
//!
//! Over Bluetooth the report travels with a report ID, passed separately to
//! the profile's send call, so it is not part of these 8 bytes.

use thiserror::Error;

/// Size of a keyboard input report, excluding the report ID.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of simultaneous (non-modifier) keys a boot report can carry.
pub const MAX_KEYS: usize = 6;

/// Report ID of the keyboard input report in [`KEYBOARD_REPORT_DESCRIPTOR`].
pub const KEYBOARD_REPORT_ID: u8 = 0x01;

/// Modifier byte masks.
pub mod modifier {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;
}

/// Error returned when decoding raw report bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("keyboard report must be {KEYBOARD_REPORT_SIZE} bytes, got {0}")]
    WrongLength(usize),
    #[error("reserved byte must be 0x00, got 0x{0:02X}")]
    ReservedNotZero(u8),
}

/// A single keyboard input report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: u8,
    pub keys: [u8; MAX_KEYS],
}

impl KeyboardReport {
    /// Report with `usage` in the first key slot and `modifiers` held.
    pub fn press(modifiers: u8, usage: u8) -> Self {
        let mut keys = [0; MAX_KEYS];
        keys[0] = usage;
        Self { modifiers, keys }
    }

    /// Report with only modifiers held and every key slot empty.
    pub fn modifiers_only(modifiers: u8) -> Self {
        Self {
            modifiers,
            keys: [0; MAX_KEYS],
        }
    }

    /// The all-zero report: nothing held.
    pub fn released() -> Self {
        Self::default()
    }

    pub fn is_released(&self) -> bool {
        *self == Self::released()
    }

    /// Serialises the report into its 8-byte wire form.
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut out = [0u8; KEYBOARD_REPORT_SIZE];
        out[0] = self.modifiers;
        // out[1] is the reserved byte
        out[2..].copy_from_slice(&self.keys);
        out
    }

    /// Parses the 8-byte wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::WrongLength`] if `bytes` is not exactly 8 bytes
    /// and [`ReportError::ReservedNotZero`] if byte 1 is set.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ReportError> {
        if bytes.len() != KEYBOARD_REPORT_SIZE {
            return Err(ReportError::WrongLength(bytes.len()));
        }
        if bytes[1] != 0 {
            return Err(ReportError::ReservedNotZero(bytes[1]));
        }
        let mut keys = [0u8; MAX_KEYS];
        keys.copy_from_slice(&bytes[2..]);
        Ok(Self {
            modifiers: bytes[0],
            keys,
        })
    }
}

/// HID report descriptor advertised in the SDP record.
///
/// Declares one keyboard application collection with report ID
/// [`KEYBOARD_REPORT_ID`]: 8 modifier bits, a reserved byte, a 5-bit LED
/// output report with padding, and a 6-byte key array.
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, KEYBOARD_REPORT_ID, //   Report ID
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) reserved byte
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant) padding
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0xE7, //   Logical Maximum (231)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x00, //   Input (Data, Array)
    0xC0, // End Collection
];
