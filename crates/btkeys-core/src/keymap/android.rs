//! Android `KeyEvent.KEYCODE_*` to USB HID Usage ID translation table.
//!
//! Reference: `android.view.KeyEvent` constants and USB HID Usage Tables 1.3.
//!
//! Android key codes are small integers (all keyboard keys are below 256), so
//! the forward direction is an O(1) index into a 256-entry table built at
//! compile time from [`MAPPINGS`].  Key codes that describe no keyboard key
//! (volume, media transport, D-pad centre, camera, ...) have no entry and are
//! reported as unmapped.
//!
//! D-pad directions are mapped to the arrow keys because that is what a host
//! expects when a phone's D-pad is used as a keyboard.

use super::hid::HidKeyCode;
use crate::shortcut::KeyCode;

/// `(KEYCODE value, HID usage, display name)`, one row per supported key.
///
/// The display name is the token accepted by the `"Ctrl+Shift+A"` shortcut
/// syntax.
const MAPPINGS: &[(u16, HidKeyCode, &str)] = {
    use HidKeyCode::*;
    &[
        (7, Digit0, "0"),
        (8, Digit1, "1"),
        (9, Digit2, "2"),
        (10, Digit3, "3"),
        (11, Digit4, "4"),
        (12, Digit5, "5"),
        (13, Digit6, "6"),
        (14, Digit7, "7"),
        (15, Digit8, "8"),
        (16, Digit9, "9"),
        (19, ArrowUp, "Up"),
        (20, ArrowDown, "Down"),
        (21, ArrowLeft, "Left"),
        (22, ArrowRight, "Right"),
        (29, KeyA, "A"),
        (30, KeyB, "B"),
        (31, KeyC, "C"),
        (32, KeyD, "D"),
        (33, KeyE, "E"),
        (34, KeyF, "F"),
        (35, KeyG, "G"),
        (36, KeyH, "H"),
        (37, KeyI, "I"),
        (38, KeyJ, "J"),
        (39, KeyK, "K"),
        (40, KeyL, "L"),
        (41, KeyM, "M"),
        (42, KeyN, "N"),
        (43, KeyO, "O"),
        (44, KeyP, "P"),
        (45, KeyQ, "Q"),
        (46, KeyR, "R"),
        (47, KeyS, "S"),
        (48, KeyT, "T"),
        (49, KeyU, "U"),
        (50, KeyV, "V"),
        (51, KeyW, "W"),
        (52, KeyX, "X"),
        (53, KeyY, "Y"),
        (54, KeyZ, "Z"),
        (55, Comma, "Comma"),
        (56, Period, "Period"),
        (57, AltLeft, "AltLeft"),
        (58, AltRight, "AltRight"),
        (59, ShiftLeft, "ShiftLeft"),
        (60, ShiftRight, "ShiftRight"),
        (61, Tab, "Tab"),
        (62, Space, "Space"),
        (66, Enter, "Enter"),
        (67, Backspace, "Backspace"), // KEYCODE_DEL
        (68, Backquote, "Grave"),
        (69, Minus, "Minus"),
        (70, Equal, "Equals"),
        (71, BracketLeft, "LeftBracket"),
        (72, BracketRight, "RightBracket"),
        (73, Backslash, "Backslash"),
        (74, Semicolon, "Semicolon"),
        (75, Quote, "Apostrophe"),
        (76, Slash, "Slash"),
        (82, ContextMenu, "Menu"),
        (92, PageUp, "PageUp"),
        (93, PageDown, "PageDown"),
        (111, Escape, "Escape"),
        (112, Delete, "Delete"), // KEYCODE_FORWARD_DEL
        (113, ControlLeft, "CtrlLeft"),
        (114, ControlRight, "CtrlRight"),
        (115, CapsLock, "CapsLock"),
        (116, ScrollLock, "ScrollLock"),
        (117, MetaLeft, "MetaLeft"),
        (118, MetaRight, "MetaRight"),
        (120, PrintScreen, "SysRq"),
        (121, Pause, "Break"),
        (122, Home, "Home"),
        (123, End, "End"),
        (124, Insert, "Insert"),
        (131, F1, "F1"),
        (132, F2, "F2"),
        (133, F3, "F3"),
        (134, F4, "F4"),
        (135, F5, "F5"),
        (136, F6, "F6"),
        (137, F7, "F7"),
        (138, F8, "F8"),
        (139, F9, "F9"),
        (140, F10, "F10"),
        (141, F11, "F11"),
        (142, F12, "F12"),
        (143, NumLock, "NumLock"),
        (144, Numpad0, "Numpad0"),
        (145, Numpad1, "Numpad1"),
        (146, Numpad2, "Numpad2"),
        (147, Numpad3, "Numpad3"),
        (148, Numpad4, "Numpad4"),
        (149, Numpad5, "Numpad5"),
        (150, Numpad6, "Numpad6"),
        (151, Numpad7, "Numpad7"),
        (152, Numpad8, "Numpad8"),
        (153, Numpad9, "Numpad9"),
        (154, NumpadDivide, "NumpadDivide"),
        (155, NumpadMultiply, "NumpadMultiply"),
        (156, NumpadSubtract, "NumpadSubtract"),
        (157, NumpadAdd, "NumpadAdd"),
        (158, NumpadDecimal, "NumpadDot"),
        (159, NumpadComma, "NumpadComma"),
        (160, NumpadEnter, "NumpadEnter"),
        (161, NumpadEqual, "NumpadEquals"),
    ]
};

/// Extra spellings accepted when parsing, mapped to a canonical name.
const NAME_ALIASES: &[(&str, &str)] = &[
    ("Esc", "Escape"),
    ("Return", "Enter"),
    ("Del", "Delete"),
    ("PrintScreen", "SysRq"),
    ("Pause", "Break"),
    ("ArrowUp", "Up"),
    ("ArrowDown", "Down"),
    ("ArrowLeft", "Left"),
    ("ArrowRight", "Right"),
];

const KEYCODE_TO_HID: [Option<HidKeyCode>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < MAPPINGS.len() {
        let (code, hid, _) = MAPPINGS[i];
        table[code as usize] = Some(hid);
        i += 1;
    }
    table
};

/// Translates an Android key code to a HID usage.
///
/// Returns `None` for key codes with no keyboard-page usage.
pub fn keycode_to_hid(code: KeyCode) -> Option<HidKeyCode> {
    KEYCODE_TO_HID.get(code.0 as usize).copied().flatten()
}

/// Translates a HID usage back to the Android key code that produces it.
pub fn hid_to_keycode(hid: HidKeyCode) -> Option<KeyCode> {
    // Reverse direction is only used for diagnostics, a linear scan is fine.
    MAPPINGS
        .iter()
        .find(|(_, mapped, _)| *mapped == hid)
        .map(|(code, _, _)| KeyCode(*code))
}

/// Display name of a key code, as used in the shortcut text form.
pub fn keycode_name(code: KeyCode) -> Option<&'static str> {
    MAPPINGS
        .iter()
        .find(|(value, _, _)| *value == code.0)
        .map(|(_, _, name)| *name)
}

/// Resolves a key name (case-insensitive, aliases allowed) to a key code.
///
/// The numeric form `KEYCODE(n)`, which `Display` prints for codes without
/// a name, is accepted too.
pub fn keycode_from_name(name: &str) -> Option<KeyCode> {
    if let Some(code) = parse_numeric(name) {
        return Some(code);
    }
    let canonical = NAME_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map_or(name, |(_, canonical)| *canonical);

    MAPPINGS
        .iter()
        .find(|(_, _, candidate)| candidate.eq_ignore_ascii_case(canonical))
        .map(|(code, _, _)| KeyCode(*code))
}

fn parse_numeric(name: &str) -> Option<KeyCode> {
    let prefix = name.get(..8)?;
    if !prefix.eq_ignore_ascii_case("KEYCODE(") {
        return None;
    }
    name[8..].strip_suffix(')')?.trim().parse().ok().map(KeyCode)
}
