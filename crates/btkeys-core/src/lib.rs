//! # btkeys-core
//!
//! Pure building blocks for a Bluetooth HID keyboard peripheral: key code
//! tables, keyboard shortcuts, and the boot keyboard report encoding.
//!
//! This crate has no dependencies on OS APIs, Bluetooth stacks or async
//! runtimes, so every table and encoder can be tested on any host.
//!
//! - **`keymap`** – translation from platform key codes (Android
//!   `KeyEvent.KEYCODE_*`) to USB HID Usage IDs, and from abstract modifiers
//!   to modifier-byte bits.
//! - **`shortcut`** – the `Shortcut` value object (key + modifier set) and its
//!   `"Ctrl+Shift+A"` text form.
//! - **`report`** – the 8-byte boot keyboard input report and the report
//!   descriptor advertised to hosts.

pub mod keymap;
pub mod report;
pub mod shortcut;

pub use keymap::{HidKeyCode, Keymap};
pub use report::{KeyboardReport, KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_ID};
pub use shortcut::{KeyCode, Modifier, ModifierSet, Shortcut, ShortcutParseError};
