//! Integration tests for the connection lifecycle.
//!
//! These drive `ConnectionController` through its public API against
//! `FakeHidProfile`.  Manual mode lets each test decide when, and with which
//! attempt token, the "platform" answers, which is how races between
//! commands and callbacks are reproduced deterministically.
//!
//! ```text
//! Uninitialized ──init──▶ Waiting ──connect_host / host──▶ Connected
//!                            ▲                        │    ▲
//!                            └──(cancel pending)      ▼    │
//!                                               Disconnected
//! ```

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use btkeys_device::application::connection::{
    ConnectionController, ControllerError, ControllerEvent, Status, StatusKind,
};
use btkeys_device::application::profile::{HostDevice, ProfileError, SdpSettings};
use btkeys_device::infrastructure::hid_profile::fake::FakeHidProfile;
use tokio::sync::mpsc::UnboundedReceiver;

type Events = UnboundedReceiver<ControllerEvent>;

fn laptop() -> HostDevice {
    HostDevice::new("AA:BB:CC:DD:EE:FF").with_name("Laptop")
}

fn setup() -> (Arc<FakeHidProfile>, ConnectionController, Events) {
    let fake = Arc::new(FakeHidProfile::manual());
    let (ctl, events) =
        ConnectionController::new(fake.clone(), SdpSettings::default(), Duration::from_secs(120));
    (fake, ctl, events)
}

fn drain(events: &mut Events) -> Vec<ControllerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn disconnected_count(events: &[ControllerEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ControllerEvent::StatusChanged(Status::Disconnected)))
        .count()
}

/// Session is present exactly when the status is `Connected`.
fn assert_session_invariant(ctl: &ConnectionController) {
    let status = ctl.status();
    assert_eq!(status.session().is_some(), status.kind() == StatusKind::Connected);
    assert_eq!(ctl.session().is_some(), status.is_connected());
}

fn registered() -> (Arc<FakeHidProfile>, ConnectionController, Events) {
    let (fake, ctl, mut events) = setup();
    ctl.init().unwrap();
    fake.complete_registration(fake.last_register_token().unwrap(), Ok(()));
    drain(&mut events);
    (fake, ctl, events)
}

fn connected() -> (Arc<FakeHidProfile>, ConnectionController, Events) {
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();
    fake.complete_connect(fake.last_connect_token().unwrap(), laptop());
    drain(&mut events);
    (fake, ctl, events)
}

// ── Registration ──────────────────────────────────────────────────────────────

#[test]
fn test_registration_moves_uninitialized_to_waiting() {
    // Arrange
    let (fake, ctl, mut events) = setup();
    assert_eq!(ctl.status(), Status::Uninitialized);

    // Act
    ctl.init().unwrap();
    let pending = ctl.status();
    fake.complete_registration(fake.last_register_token().unwrap(), Ok(()));

    // Assert
    assert_eq!(pending, Status::Uninitialized);
    assert_eq!(ctl.status(), Status::Waiting);
    assert_eq!(drain(&mut events), vec![ControllerEvent::StatusChanged(Status::Waiting)]);
    assert_eq!(fake.registered_settings(), Some(SdpSettings::default()));
    assert_session_invariant(&ctl);
}

#[test]
fn test_second_init_is_rejected_without_registering_again() {
    let (fake, ctl, _events) = setup();
    ctl.init().unwrap();

    assert!(matches!(ctl.init(), Err(ControllerError::AlreadyInitialized)));
    fake.complete_registration(fake.last_register_token().unwrap(), Ok(()));
    assert!(matches!(ctl.init(), Err(ControllerError::AlreadyInitialized)));
    assert_eq!(fake.register_count(), 1);
}

#[test]
fn test_async_registration_failure_is_reported_and_retry_succeeds() {
    // Arrange
    let (fake, ctl, mut events) = setup();
    ctl.init().unwrap();

    // Act
    fake.complete_registration(fake.last_register_token().unwrap(), Err(ProfileError::Unavailable));

    // Assert
    assert_eq!(ctl.status(), Status::Uninitialized);
    assert_eq!(
        drain(&mut events),
        vec![ControllerEvent::RegistrationFailed {
            error: ProfileError::Unavailable
        }]
    );

    // Act: retry
    ctl.init().unwrap();
    fake.complete_registration(fake.last_register_token().unwrap(), Ok(()));

    // Assert
    assert_eq!(ctl.status(), Status::Waiting);
    assert_eq!(fake.register_count(), 2);
}

#[test]
fn test_refused_registration_is_returned_synchronously() {
    let (fake, ctl, _events) = setup();
    fake.refuse_registration(ProfileError::Unavailable);

    let result = ctl.init();

    assert!(matches!(result, Err(ControllerError::ProfileRegistrationFailed(ProfileError::Unavailable))));
    assert_eq!(ctl.status(), Status::Uninitialized);
}

#[test]
fn test_stale_registration_completion_is_ignored() {
    // Arrange: first attempt fails, second is pending
    let (fake, ctl, _events) = setup();
    ctl.init().unwrap();
    let first = fake.last_register_token().unwrap();
    fake.complete_registration(first, Err(ProfileError::Unavailable));
    ctl.init().unwrap();

    // Act: a late success for the first attempt
    fake.complete_registration(first, Ok(()));

    // Assert
    assert_eq!(ctl.status(), Status::Uninitialized);
}

// ── Connecting ────────────────────────────────────────────────────────────────

#[test]
fn test_connect_host_while_uninitialized_is_invalid_and_changes_nothing() {
    // Arrange
    let (fake, ctl, mut events) = setup();

    // Act
    let result = ctl.connect_host();

    // Assert
    assert!(matches!(
        result,
        Err(ControllerError::InvalidState {
            operation: "connect_host",
            status: StatusKind::Uninitialized
        })
    ));
    assert_eq!(ctl.status(), Status::Uninitialized);
    assert!(fake.connect_tokens().is_empty());
    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_connect_completion_yields_session_for_host() {
    // Arrange
    let (fake, ctl, mut events) = registered();

    // Act
    ctl.connect_host().unwrap();
    assert_eq!(ctl.status(), Status::Waiting);
    fake.complete_connect(fake.last_connect_token().unwrap(), laptop());

    // Assert
    let status = ctl.status();
    assert_eq!(status.session().map(|s| s.host().clone()), Some(laptop()));
    assert_eq!(drain(&mut events), vec![ControllerEvent::StatusChanged(status)]);
    assert_session_invariant(&ctl);
}

#[test]
fn test_connect_host_while_connected_is_invalid() {
    let (fake, ctl, _events) = connected();

    assert!(matches!(
        ctl.connect_host(),
        Err(ControllerError::InvalidState {
            status: StatusKind::Connected,
            ..
        })
    ));
    assert_eq!(fake.connect_tokens().len(), 1);
}

#[test]
fn test_async_connect_failure_keeps_prior_state() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();

    // Act
    fake.fail_connect(fake.last_connect_token().unwrap(), ProfileError::NoBondedHost);

    // Assert
    assert_eq!(ctl.status(), Status::Waiting);
    assert_eq!(
        drain(&mut events),
        vec![ControllerEvent::ConnectFailed {
            error: ProfileError::NoBondedHost
        }]
    );
}

#[test]
fn test_refused_connect_is_returned_synchronously() {
    let (fake, ctl, _events) = registered();
    fake.refuse_connect(ProfileError::NoBondedHost);

    assert!(matches!(
        ctl.connect_host(),
        Err(ControllerError::ConnectFailed(ProfileError::NoBondedHost))
    ));
    assert_eq!(ctl.status(), Status::Waiting);
}

#[test]
fn test_racing_connects_apply_only_latest_completion() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();
    ctl.connect_host().unwrap();
    let tokens = fake.connect_tokens();
    let (stale, current) = (tokens[0], tokens[1]);

    // Act: stale completion first
    fake.complete_connect(stale, laptop());

    // Assert: ignored, and the link is left for the pending attempt
    assert_eq!(ctl.status(), Status::Waiting);
    assert!(fake.disconnect_requests().is_empty());

    // Act: current completion
    fake.complete_connect(current, laptop());

    // Assert
    assert!(ctl.status().is_connected());
    assert_eq!(drain(&mut events).len(), 1);
}

#[test]
fn test_late_stale_completion_after_connect_is_ignored() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();
    ctl.connect_host().unwrap();
    let tokens = fake.connect_tokens();

    // Act: current first, stale afterwards
    fake.complete_connect(tokens[1], laptop());
    fake.complete_connect(tokens[0], laptop());
    fake.fail_connect(tokens[0], ProfileError::Rejected("late".into()));

    // Assert
    assert_eq!(ctl.session().map(|s| s.host().clone()), Some(laptop()));
    assert_eq!(drain(&mut events).len(), 1);
    assert!(fake.disconnect_requests().is_empty());
}

// ── Releasing ─────────────────────────────────────────────────────────────────

#[test]
fn test_release_twice_leaves_disconnected() {
    // Arrange
    let (fake, ctl, mut events) = connected();

    // Act
    ctl.release().unwrap();
    ctl.release().unwrap();

    // Assert
    assert_eq!(ctl.status(), Status::Disconnected);
    assert_eq!(fake.disconnect_requests(), vec![laptop()]);
    assert_eq!(disconnected_count(&drain(&mut events)), 1);
    assert_session_invariant(&ctl);
}

#[test]
fn test_disconnect_echo_after_release_fires_no_second_transition() {
    // Arrange
    let (fake, ctl, mut events) = connected();
    ctl.release().unwrap();

    // Act: the platform confirms the local disconnect
    fake.notify_disconnected(laptop());

    // Assert
    assert_eq!(ctl.status(), Status::Disconnected);
    assert_eq!(disconnected_count(&drain(&mut events)), 1);
}

#[test]
fn test_unsolicited_disconnect_then_release_is_safe() {
    // Arrange
    let (fake, ctl, mut events) = connected();

    // Act
    fake.drop_link();
    let result = ctl.release();

    // Assert
    assert!(result.is_ok());
    assert_eq!(ctl.status(), Status::Disconnected);
    assert!(fake.disconnect_requests().is_empty());
    assert_eq!(disconnected_count(&drain(&mut events)), 1);
}

#[test]
fn test_disconnect_for_other_host_is_ignored() {
    let (fake, ctl, _events) = connected();

    fake.notify_disconnected(HostDevice::new("11:22:33:44:55:66"));

    assert!(ctl.status().is_connected());
}

#[test]
fn test_release_cancels_pending_connect_and_drops_late_link() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();
    let token = fake.last_connect_token().unwrap();

    // Act
    ctl.release().unwrap();
    fake.complete_connect(token, laptop());

    // Assert: stays Waiting and the orphaned link is torn down
    assert_eq!(ctl.status(), Status::Waiting);
    assert_eq!(fake.disconnect_requests(), vec![laptop()]);
    assert!(fake.connected_host().is_none());
    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_release_without_connection_is_invalid() {
    let (_fake, ctl, _events) = setup();
    assert!(matches!(
        ctl.release(),
        Err(ControllerError::InvalidState {
            operation: "release",
            status: StatusKind::Uninitialized
        })
    ));

    let (_fake, ctl, _events) = registered();
    assert!(matches!(
        ctl.release(),
        Err(ControllerError::InvalidState {
            status: StatusKind::Waiting,
            ..
        })
    ));
}

#[test]
fn test_reconnect_from_disconnected() {
    // Arrange
    let (fake, ctl, _events) = connected();
    fake.drop_link();

    // Act
    ctl.connect_host().unwrap();
    fake.complete_connect(fake.last_connect_token().unwrap(), laptop());

    // Assert
    assert!(ctl.status().is_connected());
    assert_eq!(fake.connect_tokens().len(), 2);
}

#[test]
fn test_concurrent_release_and_link_loss_disconnect_once() {
    for _ in 0..64 {
        // Arrange
        let (fake, ctl, mut events) = connected();
        let barrier = Barrier::new(2);

        // Act
        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                ctl.release().unwrap();
            });
            scope.spawn(|| {
                barrier.wait();
                fake.drop_link();
            });
        });

        // Assert
        assert_eq!(ctl.status(), Status::Disconnected);
        assert_eq!(disconnected_count(&drain(&mut events)), 1);
        assert!(fake.connected_host().is_none());
    }
}

// ── Host-initiated links ──────────────────────────────────────────────────────

#[test]
fn test_host_pairing_after_discoverable_connects() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.request_discoverable().unwrap();

    // Act: a new host finds the adapter and opens the link
    fake.host_connects(laptop());

    // Assert
    let status = ctl.status();
    assert_eq!(status.session().map(|s| s.host().clone()), Some(laptop()));
    assert_eq!(drain(&mut events), vec![ControllerEvent::StatusChanged(status)]);
    assert!(fake.disconnect_requests().is_empty());
    assert_eq!(fake.connected_host(), Some(laptop()));
    assert_session_invariant(&ctl);
}

#[test]
fn test_host_reconnects_on_its_own_after_link_loss() {
    // Arrange
    let (fake, ctl, mut events) = connected();
    fake.drop_link();
    assert_eq!(ctl.status(), Status::Disconnected);

    // Act
    fake.host_connects(laptop());

    // Assert
    assert!(ctl.status().is_connected());
    assert!(fake.disconnect_requests().is_empty());
    let kinds: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            ControllerEvent::StatusChanged(s) => Some(s.kind()),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec![StatusKind::Disconnected, StatusKind::Connected]);
    assert_eq!(fake.connect_tokens().len(), 1);
}

#[test]
fn test_host_link_supersedes_pending_connect() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    ctl.connect_host().unwrap();
    let token = fake.last_connect_token().unwrap();

    // Act: the host wins the race, then the platform answers the request
    fake.host_connects(laptop());
    fake.complete_connect(token, laptop());

    // Assert: one transition, and the shared link is kept
    assert!(ctl.status().is_connected());
    assert_eq!(drain(&mut events).len(), 1);
    assert!(fake.disconnect_requests().is_empty());
    assert_eq!(fake.connected_host(), Some(laptop()));
}

#[test]
fn test_second_host_is_turned_away_while_connected() {
    // Arrange
    let (fake, ctl, mut events) = connected();
    let phone = HostDevice::new("11:22:33:44:55:66").with_name("Phone");

    // Act
    fake.host_connects(phone.clone());

    // Assert
    assert_eq!(ctl.session().map(|s| s.host().clone()), Some(laptop()));
    assert_eq!(fake.disconnect_requests(), vec![phone]);
    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_release_after_host_initiated_link_disconnects_it() {
    // Arrange
    let (fake, ctl, mut events) = registered();
    fake.host_connects(laptop());

    // Act
    ctl.release().unwrap();
    fake.notify_disconnected(laptop());

    // Assert
    assert_eq!(ctl.status(), Status::Disconnected);
    assert_eq!(fake.disconnect_requests(), vec![laptop()]);
    assert_eq!(disconnected_count(&drain(&mut events)), 1);
}

// ── Discoverability ───────────────────────────────────────────────────────────

#[test]
fn test_request_discoverable_uses_configured_duration() {
    let (fake, ctl, _events) = registered();

    ctl.request_discoverable().unwrap();

    assert_eq!(fake.discoverable_requests(), vec![Duration::from_secs(120)]);
}

#[test]
fn test_request_discoverable_while_connected_is_invalid() {
    let (fake, ctl, _events) = connected();

    assert!(matches!(
        ctl.request_discoverable(),
        Err(ControllerError::InvalidState {
            status: StatusKind::Connected,
            ..
        })
    ));
    assert!(fake.discoverable_requests().is_empty());
}

#[test]
fn test_request_discoverable_failure_is_reported() {
    let (fake, ctl, _events) = registered();
    fake.refuse_discoverable(ProfileError::Unavailable);

    assert!(matches!(
        ctl.request_discoverable(),
        Err(ControllerError::DiscoverableRequestFailed(ProfileError::Unavailable))
    ));
}

// ── Loopback ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_loopback_lifecycle_is_observable_through_subscription() {
    // Arrange
    let fake = Arc::new(FakeHidProfile::loopback(laptop()));
    let (ctl, mut events) =
        ConnectionController::new(fake.clone(), SdpSettings::default(), Duration::from_secs(60));
    let mut status = ctl.subscribe();
    let timeout = Duration::from_secs(5);

    // Act / Assert: registration completes on the fake's thread
    ctl.init().unwrap();
    tokio::time::timeout(timeout, status.wait_for(|s| *s == Status::Waiting))
        .await
        .expect("registered in time")
        .unwrap();

    ctl.connect_host().unwrap();
    tokio::time::timeout(timeout, status.wait_for(Status::is_connected))
        .await
        .expect("connected in time")
        .unwrap();

    ctl.release().unwrap();
    assert_eq!(*status.borrow(), Status::Disconnected);

    // The echoed disconnect arrives on another thread; give it a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Assert: event order and a single Disconnected
    let kinds: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            ControllerEvent::StatusChanged(s) => Some(s.kind()),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![StatusKind::Waiting, StatusKind::Connected, StatusKind::Disconnected]
    );
    assert_eq!(ctl.status(), Status::Disconnected);
}
