//! Infrastructure layer for the keyboard peripheral.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `btkeys_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`hid_profile`** – implementations of the `HidProfile` capability.  The
//!   `FakeHidProfile` records every platform call and completes requests
//!   either on demand or on its own thread (loopback).
//!
//! - **`storage`** – TOML configuration: SDP record fields, discoverable
//!   duration and log level.

pub mod hid_profile;
pub mod storage;
