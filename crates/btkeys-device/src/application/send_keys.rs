//! KeyboardReportSender: turns a [`Shortcut`] into HID input reports and
//! hands them to the connected host.
//!
//! A press is one report with the modifier byte and the key in the first
//! slot, normally followed at once by the all-zero release report.  Sending
//! without the release leaves the key held on the host until
//! [`KeyboardReportSender::release_all`] is called.

use btkeys_core::{KeyCode, KeyboardReport, Keymap, Shortcut, KEYBOARD_REPORT_ID};
use thiserror::Error;
use tracing::{debug, warn};

use super::connection::Session;
use super::profile::ProfileError;

#[derive(Debug, Error)]
pub enum SendError {
    /// The key has no HID usage.  Nothing was sent.
    #[error("key {0} has no HID usage")]
    UnmappedKey(KeyCode),

    /// The platform rejected a report.  Re-check the controller status.
    #[error("failed to transmit keyboard report")]
    TransmitFailed(#[source] ProfileError),
}

/// Stateless report encoder and sender.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardReportSender {
    keymap: Keymap,
    report_id: u8,
}

impl KeyboardReportSender {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            report_id: KEYBOARD_REPORT_ID,
        }
    }

    /// Builds the key-down report for `shortcut` without sending it.
    ///
    /// # Errors
    ///
    /// [`SendError::UnmappedKey`] if the primary key has no HID usage.
    pub fn encode(&self, shortcut: &Shortcut) -> Result<KeyboardReport, SendError> {
        self.keymap
            .press_report(shortcut)
            .ok_or(SendError::UnmappedKey(shortcut.key))
    }

    /// Sends `shortcut` to the session's host.
    ///
    /// With `release_modifiers` the all-zero report follows the press, so
    /// the host sees a complete key stroke.  Without it, exactly one report
    /// is sent.
    ///
    /// # Errors
    ///
    /// - [`SendError::UnmappedKey`] before any report is sent.
    /// - [`SendError::TransmitFailed`] if the platform rejects a report.  The
    ///   release report is not attempted after a failed press.
    pub fn send(
        &self,
        session: &Session,
        shortcut: &Shortcut,
        release_modifiers: bool,
    ) -> Result<(), SendError> {
        let report = match self.encode(shortcut) {
            Ok(report) => report,
            Err(err) => {
                warn!(shortcut = %shortcut, "no HID usage for key, nothing sent");
                return Err(err);
            }
        };
        self.transmit(session, &report)?;
        if release_modifiers {
            self.transmit(session, &KeyboardReport::released())?;
        }
        Ok(())
    }

    /// Press and release `shortcut`.
    pub fn press(&self, session: &Session, shortcut: &Shortcut) -> Result<(), SendError> {
        self.send(session, shortcut, true)
    }

    /// Sends the all-zero report, releasing every key and modifier.
    pub fn release_all(&self, session: &Session) -> Result<(), SendError> {
        self.transmit(session, &KeyboardReport::released())
    }

    fn transmit(&self, session: &Session, report: &KeyboardReport) -> Result<(), SendError> {
        let bytes = report.to_bytes();
        debug!(host = %session.host(), report_id = self.report_id, ?bytes, "sending keyboard report");
        session
            .profile()
            .send_report(session.host(), self.report_id, &bytes)
            .map_err(SendError::TransmitFailed)
    }
}

impl Default for KeyboardReportSender {
    fn default() -> Self {
        Self::new(Keymap::android())
    }
}
