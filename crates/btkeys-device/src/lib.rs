//! btkeys-device library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does btkeys-device do?
//!
//! It turns the local machine into a Bluetooth keyboard for one host:
//!
//! 1. Registers a HID device profile whose SDP record carries the boot
//!    keyboard report descriptor.
//! 2. Optionally becomes discoverable so a new host can pair.
//! 3. Connects to the bonded host and tracks the link, including links the
//!    host drops on its own.
//! 4. Encodes shortcuts such as `Ctrl+Shift+T` into 8-byte input reports and
//!    sends them, followed by the release report.

/// Application layer: profile capability, connection controller, sender.
pub mod application;

/// Infrastructure layer: profile implementations and configuration.
pub mod infrastructure;
