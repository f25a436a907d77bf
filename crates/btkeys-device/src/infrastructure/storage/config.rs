//! TOML configuration for the keyboard peripheral.
//!
//! Every field has a default, so a missing file or a partial file both load.
//! Nothing is ever written back.
//!
//! ```toml
//! [device]
//! name = "btkeys"
//! description = "Bluetooth HID keyboard"
//! provider = "btkeys"
//! subclass = 0x40
//!
//! [bluetooth]
//! discoverable_secs = 120
//!
//! [logging]
//! log_level = "info"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use btkeys_core::KEYBOARD_REPORT_DESCRIPTOR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::profile::SdpSettings;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default)]
    pub device: DeviceSection,
    #[serde(default)]
    pub bluetooth: BluetoothSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// SDP record fields advertised at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSection {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    /// HID device subclass (`0x40` keyboard).
    #[serde(default = "default_subclass")]
    pub subclass: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BluetoothSection {
    /// How long `request_discoverable` keeps the adapter visible.
    #[serde(default = "default_discoverable_secs")]
    pub discoverable_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_name() -> String {
    "btkeys".to_string()
}
fn default_description() -> String {
    "Bluetooth HID keyboard".to_string()
}
fn default_provider() -> String {
    "btkeys".to_string()
}
fn default_subclass() -> u8 {
    0x40
}
fn default_discoverable_secs() -> u64 {
    120
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: default_description(),
            provider: default_provider(),
            subclass: default_subclass(),
        }
    }
}

impl Default for BluetoothSection {
    fn default() -> Self {
        Self {
            discoverable_secs: default_discoverable_secs(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DeviceConfig {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Service record for profile registration.
    pub fn sdp_settings(&self) -> SdpSettings {
        SdpSettings {
            name: self.device.name.clone(),
            description: self.device.description.clone(),
            provider: self.device.provider.clone(),
            subclass: self.device.subclass,
            report_descriptor: KEYBOARD_REPORT_DESCRIPTOR.to_vec(),
        }
    }

    pub fn discoverable_duration(&self) -> Duration {
        Duration::from_secs(self.bluetooth.discoverable_secs)
    }
}

/// Loads configuration from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<DeviceConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => DeviceConfig::from_toml_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeviceConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
