//! In-process HID profile for tests and the demo binary.
//!
//! `FakeHidProfile` stands in for the platform Bluetooth stack.  It records
//! every call so tests can inspect exactly what was requested and which
//! reports were sent, and it completes asynchronous requests in one of two
//! ways:
//!
//! - [`CompletionMode::Manual`]: nothing completes on its own.  The test
//!   drives completions with [`FakeHidProfile::complete_registration`],
//!   [`FakeHidProfile::complete_connect`], [`FakeHidProfile::fail_connect`]
//!   [`FakeHidProfile::host_connects`] and [`FakeHidProfile::drop_link`],
//!   choosing the order and the tokens.
//!   This is how stale completions and races are reproduced.
//!
//! - [`CompletionMode::Loopback`]: registration and connection succeed, and
//!   every disconnect is echoed back, on a separate thread as a real stack
//!   would.  The connected host is the one given to the mode.
//!
//! Callbacks are always invoked with the fake's own lock released.
//!
//! # Usage in tests
//!
//! ```ignore
//! let fake = Arc::new(FakeHidProfile::manual());
//! let (ctl, _events) = ConnectionController::new(fake.clone(), settings, secs);
//! ctl.init()?;
//! fake.complete_registration(fake.last_register_token().unwrap(), Ok(()));
//! assert_eq!(ctl.status(), Status::Waiting);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::application::profile::{
    AttemptToken, HidProfile, HostDevice, ProfileCallbacks, ProfileError, SdpSettings,
};

/// How asynchronous requests complete.
#[derive(Debug, Clone)]
pub enum CompletionMode {
    Manual,
    Loopback { host: HostDevice },
}

/// One report handed to [`HidProfile::send_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReport {
    pub host: HostDevice,
    pub report_id: u8,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct FakeState {
    callbacks: Option<ProfileCallbacks>,
    settings: Option<SdpSettings>,
    registered: bool,
    register_tokens: Vec<AttemptToken>,
    connect_tokens: Vec<AttemptToken>,
    connected_host: Option<HostDevice>,
    disconnect_requests: Vec<HostDevice>,
    discoverable_requests: Vec<Duration>,
    sent_reports: Vec<SentReport>,
    refuse_registration: Option<ProfileError>,
    refuse_connect: Option<ProfileError>,
    refuse_discoverable: Option<ProfileError>,
    fail_sends: Option<ProfileError>,
}

pub struct FakeHidProfile {
    mode: CompletionMode,
    state: Mutex<FakeState>,
}

impl FakeHidProfile {
    pub fn new(mode: CompletionMode) -> Self {
        Self {
            mode,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn manual() -> Self {
        Self::new(CompletionMode::Manual)
    }

    pub fn loopback(host: HostDevice) -> Self {
        Self::new(CompletionMode::Loopback { host })
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn callbacks(&self) -> ProfileCallbacks {
        self.lock()
            .callbacks
            .clone()
            .unwrap_or_else(ProfileCallbacks::detached)
    }

    // ── Failure injection ─────────────────────────────────────────────────────

    /// Makes every later `register_app` call fail synchronously.
    pub fn refuse_registration(&self, error: ProfileError) {
        self.lock().refuse_registration = Some(error);
    }

    /// Makes every later `connect` call fail synchronously.
    pub fn refuse_connect(&self, error: ProfileError) {
        self.lock().refuse_connect = Some(error);
    }

    pub fn refuse_discoverable(&self, error: ProfileError) {
        self.lock().refuse_discoverable = Some(error);
    }

    /// Makes every later `send_report` call fail.
    pub fn fail_sends(&self, error: ProfileError) {
        self.lock().fail_sends = Some(error);
    }

    // ── Manual completion drivers ─────────────────────────────────────────────

    pub fn complete_registration(&self, token: AttemptToken, result: Result<(), ProfileError>) {
        let callbacks = {
            let mut state = self.lock();
            state.registered = result.is_ok();
            state.callbacks.clone().unwrap_or_else(ProfileCallbacks::detached)
        };
        callbacks.on_app_registered(token, result);
    }

    /// Brings up the link to `host` and reports it for `token`.
    pub fn complete_connect(&self, token: AttemptToken, host: HostDevice) {
        self.lock().connected_host = Some(host.clone());
        self.callbacks().on_connected(token, host);
    }

    /// The host opens the link itself, as after pairing or an automatic
    /// reconnect.  Ignored until the profile is registered.
    pub fn host_connects(&self, host: HostDevice) {
        {
            let mut state = self.lock();
            if !state.registered {
                debug!(%host, "fake: host connect before registration dropped");
                return;
            }
            state.connected_host = Some(host.clone());
        }
        self.callbacks().on_host_connected(host);
    }

    pub fn fail_connect(&self, token: AttemptToken, error: ProfileError) {
        self.callbacks().on_connect_failed(token, error);
    }

    /// Drops the current link as if the host went away.
    pub fn drop_link(&self) {
        let host = self.lock().connected_host.take();
        if let Some(host) = host {
            self.callbacks().on_disconnected(host);
        }
    }

    /// Delivers a disconnect notification for `host` without touching the link.
    pub fn notify_disconnected(&self, host: HostDevice) {
        self.callbacks().on_disconnected(host);
    }

    // ── Inspection ────────────────────────────────────────────────────────────

    pub fn last_register_token(&self) -> Option<AttemptToken> {
        self.lock().register_tokens.last().copied()
    }

    pub fn register_count(&self) -> usize {
        self.lock().register_tokens.len()
    }

    pub fn registered_settings(&self) -> Option<SdpSettings> {
        self.lock().settings.clone()
    }

    pub fn last_connect_token(&self) -> Option<AttemptToken> {
        self.lock().connect_tokens.last().copied()
    }

    pub fn connect_tokens(&self) -> Vec<AttemptToken> {
        self.lock().connect_tokens.clone()
    }

    pub fn connected_host(&self) -> Option<HostDevice> {
        self.lock().connected_host.clone()
    }

    pub fn disconnect_requests(&self) -> Vec<HostDevice> {
        self.lock().disconnect_requests.clone()
    }

    pub fn discoverable_requests(&self) -> Vec<Duration> {
        self.lock().discoverable_requests.clone()
    }

    pub fn sent_reports(&self) -> Vec<SentReport> {
        self.lock().sent_reports.clone()
    }
}

impl HidProfile for FakeHidProfile {
    fn register_app(
        &self,
        settings: &SdpSettings,
        token: AttemptToken,
        callbacks: ProfileCallbacks,
    ) -> Result<(), ProfileError> {
        {
            let mut state = self.lock();
            if let Some(error) = state.refuse_registration.clone() {
                return Err(error);
            }
            state.register_tokens.push(token);
            state.settings = Some(settings.clone());
            state.callbacks = Some(callbacks.clone());
        }
        debug!(%token, name = %settings.name, "fake: register_app");

        if let CompletionMode::Loopback { .. } = self.mode {
            self.lock().registered = true;
            thread::spawn(move || callbacks.on_app_registered(token, Ok(())));
        }
        Ok(())
    }

    fn connect(&self, token: AttemptToken) -> Result<(), ProfileError> {
        {
            let mut state = self.lock();
            if let Some(error) = state.refuse_connect.clone() {
                return Err(error);
            }
            if !state.registered {
                return Err(ProfileError::NotRegistered);
            }
            state.connect_tokens.push(token);
        }
        debug!(%token, "fake: connect");

        if let CompletionMode::Loopback { host } = &self.mode {
            let host = host.clone();
            self.lock().connected_host = Some(host.clone());
            let callbacks = self.callbacks();
            thread::spawn(move || callbacks.on_connected(token, host));
        }
        Ok(())
    }

    fn disconnect(&self, host: &HostDevice) -> Result<(), ProfileError> {
        {
            let mut state = self.lock();
            state.disconnect_requests.push(host.clone());
            if state.connected_host.as_ref() != Some(host) {
                return Err(ProfileError::NotConnected);
            }
            state.connected_host = None;
        }
        debug!(%host, "fake: disconnect");

        if let CompletionMode::Loopback { .. } = self.mode {
            let callbacks = self.callbacks();
            let host = host.clone();
            thread::spawn(move || callbacks.on_disconnected(host));
        }
        Ok(())
    }

    fn set_discoverable(&self, duration: Duration) -> Result<(), ProfileError> {
        let mut state = self.lock();
        if let Some(error) = state.refuse_discoverable.clone() {
            return Err(error);
        }
        state.discoverable_requests.push(duration);
        Ok(())
    }

    fn send_report(
        &self,
        host: &HostDevice,
        report_id: u8,
        report: &[u8],
    ) -> Result<(), ProfileError> {
        let mut state = self.lock();
        if let Some(error) = state.fail_sends.clone() {
            return Err(error);
        }
        if state.connected_host.as_ref() != Some(host) {
            return Err(ProfileError::NotConnected);
        }
        state.sent_reports.push(SentReport {
            host: host.clone(),
            report_id,
            bytes: report.to_vec(),
        });
        Ok(())
    }
}
