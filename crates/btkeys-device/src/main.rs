//! btkeys-device entry point: loopback demonstration.
//!
//! Wires configuration, logging, the connection controller and the report
//! sender together against `FakeHidProfile` in loopback mode, then walks the
//! whole lifecycle once:
//!
//! ```text
//! main()
//!  └─ load_config(cli.config)         -- argument, $BTKEYS_CONFIG, or btkeys.toml
//!  └─ ConnectionController::init()    -- Uninitialized -> Waiting
//!  └─ request_discoverable()
//!  └─ connect_host()                  -- Waiting -> Connected
//!  └─ KeyboardReportSender::press()   -- A, 1, Ctrl+Shift+T
//!  └─ release()                       -- Connected -> Disconnected
//! ```
//!
//! Set `RUST_LOG=debug` to see every report's bytes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use btkeys_core::{KeyCode, Keymap, Shortcut};
use btkeys_device::application::connection::{ConnectionController, ControllerEvent, Status, StatusKind};
use btkeys_device::application::profile::HostDevice;
use btkeys_device::application::send_keys::KeyboardReportSender;
use btkeys_device::infrastructure::hid_profile::fake::FakeHidProfile;
use btkeys_device::infrastructure::storage::config::load_config;

const TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Bluetooth HID keyboard peripheral, run against an in-process loopback host.
#[derive(Debug, Parser)]
#[command(name = "btkeys-device", version)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(default_value = "btkeys.toml", env = "BTKEYS_CONFIG")]
    config: PathBuf,

    /// Overrides `[logging] log_level` from the configuration file.
    /// `RUST_LOG` still takes precedence over both.
    #[arg(long)]
    log_level: Option<String>,

    /// Bluetooth address reported by the loopback host.
    #[arg(long, default_value = "00:1A:7D:DA:71:13")]
    host_address: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Initialise structured logging.
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!(config = %cli.config.display(), "btkeys-device starting (loopback)");

    let host = HostDevice::new(cli.host_address).with_name("Loopback host");
    let profile = Arc::new(FakeHidProfile::loopback(host));
    let (controller, mut events) = ConnectionController::new(
        profile.clone(),
        config.sdp_settings(),
        config.discoverable_duration(),
    );
    let mut status = controller.subscribe();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ControllerEvent::StatusChanged(status) => info!("status: {status}"),
                ControllerEvent::RegistrationFailed { error } => warn!(%error, "registration failed"),
                ControllerEvent::ConnectFailed { error } => warn!(%error, "connect failed"),
            }
        }
    });

    controller.init()?;
    wait_for(&mut status, StatusKind::Waiting).await?;

    controller.request_discoverable()?;
    controller.connect_host()?;
    wait_for(&mut status, StatusKind::Connected).await?;

    let Some(session) = controller.session() else {
        bail!("connected without a session");
    };
    let sender = KeyboardReportSender::new(Keymap::android());
    let shortcuts = [
        Shortcut::new(KeyCode::A),
        Shortcut::new(KeyCode::DIGIT_1),
        "Ctrl+Shift+T".parse::<Shortcut>()?,
    ];
    for shortcut in &shortcuts {
        sender.press(&session, shortcut)?;
        info!(%shortcut, "sent");
    }
    drop(session);

    controller.release()?;
    wait_for(&mut status, StatusKind::Disconnected).await?;

    for report in profile.sent_reports() {
        info!(report_id = report.report_id, bytes = ?report.bytes, "host received");
    }
    info!("btkeys-device stopped");
    Ok(())
}

async fn wait_for(status: &mut watch::Receiver<Status>, kind: StatusKind) -> anyhow::Result<()> {
    tokio::time::timeout(TRANSITION_TIMEOUT, status.wait_for(|s| s.kind() == kind))
        .await
        .with_context(|| format!("timed out waiting for {kind}"))?
        .context("controller dropped")?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
