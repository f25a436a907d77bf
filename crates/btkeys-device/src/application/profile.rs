//! The Bluetooth HID-device profile capability.
//!
//! [`HidProfile`] is the narrow surface the controller and the report sender
//! need from the platform: register the SDP record, connect to the bonded
//! host, disconnect, become discoverable and send an input report.
//!
//! Registration and connection complete asynchronously.  The platform adapter
//! reports the outcome through the [`ProfileCallbacks`] handle it received at
//! registration, quoting the [`AttemptToken`] of the call being answered.  The
//! controller discards completions whose token is no longer current.
//!
//! # Attempt tokens (for newcomers)
//!
//! A Bluetooth stack answers on its own thread, sometimes seconds later.  By
//! then the user may have asked for something else:
//!
//! ```text
//! connect_host()  ── token #2 ──▶ platform ......... on_connected(#2, host)
//! connect_host()  ── token #3 ──▶ platform ..... on_connected(#3, host)
//! release()       (cancels #3)
//! ```
//!
//! Without tokens the controller could not tell which answer belongs to
//! which request, and the late `#2` would resurrect a connection nobody
//! wants.  So every request gets a new, strictly increasing generation
//! number and the adapter simply echoes it back:
//!
//! - the answer for the current token is applied,
//! - an answer for an older, superseded token is dropped,
//! - a link brought up by a connect that `release()` cancelled is torn down
//!   with [`HidProfile::disconnect`].
//!
//! Adapters never make up tokens.  When the host opens the link on its own
//! (it paired with the discoverable adapter, or it reconnects to a keyboard
//! it already knows), there is no request to answer, so the adapter calls
//! [`ProfileCallbacks::on_host_connected`] instead.

use std::fmt;
use std::sync::Weak;
use std::time::Duration;

use btkeys_core::KEYBOARD_REPORT_DESCRIPTOR;
use thiserror::Error;
use tracing::debug;

use super::connection::Shared;

/// Generation number attached to every asynchronous platform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub(crate) const fn new(generation: u64) -> Self {
        Self(generation)
    }

    pub fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a remote Bluetooth host.
///
/// Two `HostDevice`s are the same host when their addresses match; the
/// friendly name is informational and may change between callbacks.
#[derive(Debug, Clone)]
pub struct HostDevice {
    pub address: String,
    pub name: Option<String>,
}

impl HostDevice {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl PartialEq for HostDevice {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for HostDevice {}

impl fmt::Display for HostDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({})", self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// Service record advertised when the profile registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdpSettings {
    pub name: String,
    pub description: String,
    pub provider: String,
    /// HID device subclass; `0x40` is a keyboard.
    pub subclass: u8,
    pub report_descriptor: Vec<u8>,
}

impl Default for SdpSettings {
    fn default() -> Self {
        Self {
            name: "btkeys".to_string(),
            description: "Bluetooth HID keyboard".to_string(),
            provider: "btkeys".to_string(),
            subclass: 0x40,
            report_descriptor: KEYBOARD_REPORT_DESCRIPTOR.to_vec(),
        }
    }
}

/// Failure reported by the platform profile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("HID device profile is not registered")]
    NotRegistered,
    #[error("no bonded host device to connect to")]
    NoBondedHost,
    #[error("host rejected the request: {0}")]
    Rejected(String),
    #[error("host is not connected")]
    NotConnected,
    #[error("Bluetooth adapter unavailable")]
    Unavailable,
    #[error("platform error: {0}")]
    Platform(String),
}

/// Platform Bluetooth HID-device profile.
///
/// Implementations must not call back into [`ProfileCallbacks`] while holding
/// a lock that one of their own methods also takes: the controller may call
/// `disconnect` from inside a callback.
#[cfg_attr(test, mockall::automock)]
pub trait HidProfile: Send + Sync {
    /// Registers the HID device SDP record.
    ///
    /// The outcome is delivered later through
    /// [`ProfileCallbacks::on_app_registered`] with the same `token`.  An
    /// `Err` return means the request was refused outright and no callback
    /// will follow.
    fn register_app(
        &self,
        settings: &SdpSettings,
        token: AttemptToken,
        callbacks: ProfileCallbacks,
    ) -> Result<(), ProfileError>;

    /// Connects to the currently bonded host.
    ///
    /// Completes through [`ProfileCallbacks::on_connected`] or
    /// [`ProfileCallbacks::on_connect_failed`] with the same `token`.  Links
    /// the host opens itself are reported through
    /// [`ProfileCallbacks::on_host_connected`].
    fn connect(&self, token: AttemptToken) -> Result<(), ProfileError>;

    /// Drops the link to `host`.
    fn disconnect(&self, host: &HostDevice) -> Result<(), ProfileError>;

    /// Asks the adapter to become discoverable for `duration`.
    fn set_discoverable(&self, duration: Duration) -> Result<(), ProfileError>;

    /// Sends one input report to `host`.  Best effort, does not block.
    fn send_report(
        &self,
        host: &HostDevice,
        report_id: u8,
        report: &[u8],
    ) -> Result<(), ProfileError>;
}

/// Callback handle given to the platform adapter at registration.
///
/// May be invoked from any thread.  Holds only a weak reference, so once the
/// controller is dropped every callback becomes a no-op.
#[derive(Clone)]
pub struct ProfileCallbacks {
    shared: Weak<Shared>,
}

impl ProfileCallbacks {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// A handle that is not attached to any controller.
    pub fn detached() -> Self {
        Self { shared: Weak::new() }
    }

    pub fn on_app_registered(&self, token: AttemptToken, result: Result<(), ProfileError>) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_app_registered(token, result),
            None => debug!(%token, "registration callback after controller dropped"),
        }
    }

    pub fn on_connected(&self, token: AttemptToken, host: HostDevice) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_connected(token, host),
            None => debug!(%token, %host, "connect callback after controller dropped"),
        }
    }

    /// The host opened the link itself, without a pending `connect`.
    pub fn on_host_connected(&self, host: HostDevice) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_host_connected(host),
            None => debug!(%host, "host connect after controller dropped"),
        }
    }

    pub fn on_connect_failed(&self, token: AttemptToken, error: ProfileError) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_connect_failed(token, error),
            None => debug!(%token, %error, "connect failure after controller dropped"),
        }
    }

    /// Host link dropped, whether requested locally or not.
    pub fn on_disconnected(&self, host: HostDevice) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_disconnected(host),
            None => debug!(%host, "disconnect callback after controller dropped"),
        }
    }
}

impl fmt::Debug for ProfileCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileCallbacks")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}
