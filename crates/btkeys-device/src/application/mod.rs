//! Application layer use cases for the keyboard peripheral.
//!
//! - **`profile`** – the [`HidProfile`](profile::HidProfile) capability trait
//!   the platform adapter implements, plus the callback handle it uses to
//!   report asynchronous completions.
//!
//! - **`connection`** – `ConnectionController`, which owns the connection
//!   [`Status`](connection::Status) and serialises commands and platform
//!   callbacks into one ordered sequence of transitions.
//!
//! - **`send_keys`** – `KeyboardReportSender`, which encodes a shortcut into
//!   boot keyboard reports and sends them over a connected session.

pub mod connection;
pub mod profile;
pub mod send_keys;
