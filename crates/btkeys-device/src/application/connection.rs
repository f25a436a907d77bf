//! ConnectionController: owns the HID profile registration and the single
//! host connection.
//!
//! # State machine
//!
//! ```text
//!                init() + registered   connect_host() + connected, or
//!                                      host connects on its own
//! Uninitialized ─────────────────▶ Waiting ─────────────────────────────▶ Connected
//!                                     ▲                                    │   ▲
//!                                     │             release() / link lost  │   │
//!                                     │                                    ▼   │ connect_host()
//!                                     └──── (rest state)            Disconnected
//! ```
//!
//! Commands (`init`, `connect_host`, `release`, `request_discoverable`) return
//! as soon as the platform has accepted the request.  Completions arrive on
//! the platform's own thread through [`ProfileCallbacks`].  Every transition,
//! whether caused by a command or a callback, happens under one mutex and is
//! published on a `watch` channel and the event stream while that mutex is
//! held, so observers see transitions in the order they happened.
//!
//! Platform calls are always made with the mutex released.
//!
//! # Attempt tokens
//!
//! Each registration and connect request carries a fresh [`AttemptToken`].
//! Only the completion quoting the current token is applied; a second
//! `connect_host()` or a `release()` makes earlier tokens stale.
//!
//! A host may also open the link itself, after pairing with a discoverable
//! adapter or when it reconnects to a known keyboard.  Such a link carries
//! no token and is accepted from `Waiting` or `Disconnected`, superseding
//! any connect still in flight.  Only a link completing a connect that
//! `release()` cancelled is torn down again.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::profile::{
    AttemptToken, HidProfile, HostDevice, ProfileCallbacks, ProfileError, SdpSettings,
};

// ── Status ────────────────────────────────────────────────────────────────────

/// A connected (profile, host) pair.  Only exists inside [`Status::Connected`].
#[derive(Clone)]
pub struct Session {
    profile: Arc<dyn HidProfile>,
    host: HostDevice,
}

impl Session {
    pub(crate) fn new(profile: Arc<dyn HidProfile>, host: HostDevice) -> Self {
        Self { profile, host }
    }

    pub fn host(&self) -> &HostDevice {
        &self.host
    }

    pub fn profile(&self) -> &dyn HidProfile {
        self.profile.as_ref()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("host", &self.host).finish_non_exhaustive()
    }
}

/// Connection status.  Exactly one value is live at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Profile not registered yet.
    Uninitialized,
    /// Profile registered, no host connected.
    Waiting,
    Connected(Session),
    /// Profile registered, the previous host link is gone.
    Disconnected,
}

impl Status {
    pub fn kind(&self) -> StatusKind {
        match self {
            Status::Uninitialized => StatusKind::Uninitialized,
            Status::Waiting => StatusKind::Waiting,
            Status::Connected(_) => StatusKind::Connected,
            Status::Disconnected => StatusKind::Disconnected,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Status::Connected(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Status::Connected(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Uninitialized => f.write_str("Not initialized"),
            Status::Waiting => f.write_str("Waiting for a host"),
            Status::Connected(session) => write!(f, "Connected to {}", session.host),
            Status::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// [`Status`] without the session, for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Uninitialized,
    Waiting,
    Connected,
    Disconnected,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusKind::Uninitialized => "uninitialized",
            StatusKind::Waiting => "waiting",
            StatusKind::Connected => "connected",
            StatusKind::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

// ── Events and errors ─────────────────────────────────────────────────────────

/// Emitted on the controller event stream, in transition order.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    StatusChanged(Status),
    /// Asynchronous registration failure; status stays `Uninitialized`.
    RegistrationFailed { error: ProfileError },
    /// Asynchronous connect failure; status is unchanged.
    ConnectFailed { error: ProfileError },
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("HID profile is already registered or registering")]
    AlreadyInitialized,

    #[error("{operation} is not valid while {status}")]
    InvalidState {
        operation: &'static str,
        status: StatusKind,
    },

    #[error("HID profile registration failed")]
    ProfileRegistrationFailed(#[source] ProfileError),

    #[error("host connection failed")]
    ConnectFailed(#[source] ProfileError),

    #[error("discoverable request failed")]
    DiscoverableRequestFailed(#[source] ProfileError),
}

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    Idle,
    Pending(AttemptToken),
    Registered,
}

struct ControllerState {
    status: Status,
    registration: Registration,
    pending_connect: Option<AttemptToken>,
    /// Connects cancelled by `release()` that may still bring up a link.
    cancelled_connects: Vec<AttemptToken>,
    next_generation: u64,
}

impl ControllerState {
    fn issue_token(&mut self) -> AttemptToken {
        self.next_generation += 1;
        AttemptToken::new(self.next_generation)
    }
}

/// State shared between the controller and its [`ProfileCallbacks`].
pub(crate) struct Shared {
    profile: Arc<dyn HidProfile>,
    settings: SdpSettings,
    discoverable_duration: Duration,
    state: Mutex<ControllerState>,
    status_tx: watch::Sender<Status>,
    event_tx: mpsc::UnboundedSender<ControllerEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `next` and publishes it.  Caller holds the state lock.
    fn transition(&self, state: &mut ControllerState, next: Status) {
        info!(from = %state.status.kind(), to = %next.kind(), "status: {next}");
        state.status = next.clone();
        self.status_tx.send_replace(next.clone());
        self.emit(ControllerEvent::StatusChanged(next));
    }

    fn emit(&self, event: ControllerEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn handle_app_registered(&self, token: AttemptToken, result: Result<(), ProfileError>) {
        let mut state = self.lock();
        if state.registration != Registration::Pending(token) {
            debug!(%token, "discarding stale registration completion");
            return;
        }
        match result {
            Ok(()) => {
                info!(%token, "HID device profile registered");
                state.registration = Registration::Registered;
                self.transition(&mut state, Status::Waiting);
            }
            Err(error) => {
                warn!(%token, %error, "HID device profile registration failed");
                state.registration = Registration::Idle;
                self.emit(ControllerEvent::RegistrationFailed { error });
            }
        }
    }

    pub(crate) fn handle_connected(&self, token: AttemptToken, host: HostDevice) {
        let mut state = self.lock();
        if state.pending_connect == Some(token) {
            state.pending_connect = None;
            match state.status.kind() {
                StatusKind::Waiting | StatusKind::Disconnected => {
                    let session = Session::new(Arc::clone(&self.profile), host);
                    self.transition(&mut state, Status::Connected(session));
                }
                kind => warn!(%token, %host, status = %kind, "connect completed in unexpected state"),
            }
            return;
        }

        let cancelled = match state.cancelled_connects.iter().position(|t| *t == token) {
            Some(index) => {
                state.cancelled_connects.swap_remove(index);
                true
            }
            None => false,
        };
        // While a newer attempt is pending the platform may be reusing this
        // link, and a link that is already our session stays.
        let orphaned = cancelled
            && state.pending_connect.is_none()
            && state.status.session().map_or(true, |session| session.host != host);
        drop(state);

        if orphaned {
            info!(%token, %host, "dropping link of cancelled connect");
            if let Err(error) = self.profile.disconnect(&host) {
                warn!(%host, %error, "failed to drop orphaned host link");
            }
        } else {
            debug!(%token, %host, "discarding stale connect completion");
        }
    }

    pub(crate) fn handle_host_connected(&self, host: HostDevice) {
        let mut state = self.lock();
        let intruder = match state.status.clone() {
            Status::Waiting | Status::Disconnected => {
                if let Some(token) = state.pending_connect.take() {
                    debug!(%token, "host connected first, superseding pending connect");
                }
                info!(%host, "host opened the link");
                let session = Session::new(Arc::clone(&self.profile), host);
                self.transition(&mut state, Status::Connected(session));
                return;
            }
            Status::Connected(session) if session.host == host => {
                debug!(%host, "host link already active");
                return;
            }
            Status::Connected(session) => {
                warn!(%host, active = %session.host, "second host connected, dropping it");
                true
            }
            Status::Uninitialized => {
                warn!(%host, "host connected before registration completed, ignoring");
                false
            }
        };
        drop(state);

        if intruder {
            if let Err(error) = self.profile.disconnect(&host) {
                warn!(%host, %error, "failed to drop second host link");
            }
        }
    }

    pub(crate) fn handle_connect_failed(&self, token: AttemptToken, error: ProfileError) {
        let mut state = self.lock();
        if state.pending_connect != Some(token) {
            state.cancelled_connects.retain(|t| *t != token);
            debug!(%token, %error, "discarding stale connect failure");
            return;
        }
        state.pending_connect = None;
        warn!(%token, %error, "host connection failed");
        self.emit(ControllerEvent::ConnectFailed { error });
    }

    pub(crate) fn handle_disconnected(&self, host: HostDevice) {
        let mut state = self.lock();
        match state.status.session() {
            Some(session) if session.host == host => {
                info!(%host, "host link lost");
                self.transition(&mut state, Status::Disconnected);
            }
            _ => debug!(%host, status = %state.status.kind(), "ignoring disconnect for inactive host"),
        }
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Owns [`Status`] and drives the platform profile through its lifecycle.
pub struct ConnectionController {
    shared: Arc<Shared>,
}

impl ConnectionController {
    /// Creates a controller in `Uninitialized` and the receiving end of its
    /// event stream.
    pub fn new(
        profile: Arc<dyn HidProfile>,
        settings: SdpSettings,
        discoverable_duration: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(Status::Uninitialized);
        let shared = Arc::new(Shared {
            profile,
            settings,
            discoverable_duration,
            state: Mutex::new(ControllerState {
                status: Status::Uninitialized,
                registration: Registration::Idle,
                pending_connect: None,
                cancelled_connects: Vec::new(),
                next_generation: 0,
            }),
            status_tx,
            event_tx,
        });
        (Self { shared }, event_rx)
    }

    /// Registers the HID device profile.
    ///
    /// On success the status moves to `Waiting` once the platform confirms.
    /// An asynchronous refusal is reported as
    /// [`ControllerEvent::RegistrationFailed`] and `init` may be called again.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::AlreadyInitialized`] if registration is pending or done.
    /// - [`ControllerError::ProfileRegistrationFailed`] if the platform refuses
    ///   the request synchronously.
    pub fn init(&self) -> Result<(), ControllerError> {
        let token = {
            let mut state = self.shared.lock();
            if state.registration != Registration::Idle {
                return Err(ControllerError::AlreadyInitialized);
            }
            let token = state.issue_token();
            state.registration = Registration::Pending(token);
            token
        };

        info!(%token, name = %self.shared.settings.name, "registering HID device profile");
        let callbacks = ProfileCallbacks::new(Arc::downgrade(&self.shared));
        if let Err(error) = self
            .shared
            .profile
            .register_app(&self.shared.settings, token, callbacks)
        {
            let mut state = self.shared.lock();
            if state.registration == Registration::Pending(token) {
                state.registration = Registration::Idle;
            }
            warn!(%token, %error, "HID device profile registration refused");
            return Err(ControllerError::ProfileRegistrationFailed(error));
        }
        Ok(())
    }

    /// Asks the platform to connect to the bonded host.
    ///
    /// Supersedes any connect still in flight.  A platform refusal after the
    /// request was accepted is reported as [`ControllerEvent::ConnectFailed`].
    ///
    /// # Errors
    ///
    /// - [`ControllerError::InvalidState`] unless `Waiting` or `Disconnected`.
    /// - [`ControllerError::ConnectFailed`] if the platform refuses outright.
    pub fn connect_host(&self) -> Result<(), ControllerError> {
        let token = {
            let mut state = self.shared.lock();
            match state.status.kind() {
                StatusKind::Waiting | StatusKind::Disconnected => {}
                status => {
                    return Err(ControllerError::InvalidState {
                        operation: "connect_host",
                        status,
                    })
                }
            }
            let token = state.issue_token();
            if let Some(previous) = state.pending_connect.replace(token) {
                debug!(%previous, %token, "superseding pending connect");
            }
            token
        };

        info!(%token, "connecting to host");
        if let Err(error) = self.shared.profile.connect(token) {
            let mut state = self.shared.lock();
            if state.pending_connect == Some(token) {
                state.pending_connect = None;
            }
            warn!(%token, %error, "host connection refused");
            return Err(ControllerError::ConnectFailed(error));
        }
        Ok(())
    }

    /// Tears down the host connection.
    ///
    /// From `Connected` the status moves to `Disconnected` immediately and the
    /// platform is asked to drop the link; the platform's own disconnect
    /// notification that follows is ignored.  From `Disconnected` this is a
    /// no-op.  While a connect is in flight, that attempt is cancelled.
    ///
    /// # Errors
    ///
    /// [`ControllerError::InvalidState`] from `Uninitialized`, or from
    /// `Waiting` with nothing to cancel.
    pub fn release(&self) -> Result<(), ControllerError> {
        let session = {
            let mut state = self.shared.lock();
            let cancelled = state.pending_connect.take();
            if let Some(token) = cancelled {
                info!(%token, "cancelled pending connect");
                state.cancelled_connects.push(token);
            }
            match state.status.clone() {
                Status::Connected(session) => {
                    self.shared.transition(&mut state, Status::Disconnected);
                    session
                }
                Status::Disconnected => return Ok(()),
                Status::Waiting if cancelled.is_some() => return Ok(()),
                other => {
                    return Err(ControllerError::InvalidState {
                        operation: "release",
                        status: other.kind(),
                    })
                }
            }
        };

        if let Err(error) = session.profile.disconnect(&session.host) {
            // The status is already Disconnected; the link is gone or going.
            warn!(host = %session.host, %error, "platform disconnect failed");
        }
        Ok(())
    }

    /// Makes the adapter discoverable so a new host can pair.
    ///
    /// # Errors
    ///
    /// - [`ControllerError::InvalidState`] unless `Waiting` or `Disconnected`.
    /// - [`ControllerError::DiscoverableRequestFailed`] on platform failure.
    pub fn request_discoverable(&self) -> Result<(), ControllerError> {
        {
            let state = self.shared.lock();
            match state.status.kind() {
                StatusKind::Waiting | StatusKind::Disconnected => {}
                status => {
                    return Err(ControllerError::InvalidState {
                        operation: "request_discoverable",
                        status,
                    })
                }
            }
        }
        let duration = self.shared.discoverable_duration;
        info!(secs = duration.as_secs(), "requesting discoverable mode");
        self.shared
            .profile
            .set_discoverable(duration)
            .map_err(ControllerError::DiscoverableRequestFailed)
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.shared.lock().status.clone()
    }

    /// Current session, if connected.
    pub fn session(&self) -> Option<Session> {
        self.shared.lock().status.session().cloned()
    }

    /// Receiver that always holds the latest status.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.shared.status_tx.subscribe()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
