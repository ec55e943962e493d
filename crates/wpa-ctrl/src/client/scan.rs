//! Scan choreography built on commands and the event stream.

use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use tracing::debug;

use super::{CLIENT_TARGET, Client};
use crate::commands::{SCAN, SCAN_RESULTS, WPS_EVENT_AP_AVAILABLE};
use crate::error::CtrlError;
use crate::network::{AccessPoint, parse_access_points};
use crate::registry::EventStream;

impl Client {
    /// Returns nearby access points, scanning when no cached results exist.
    ///
    /// Waits at most [`Client::scan_timeout`] for the scan to report.
    pub fn scan(&self) -> Result<Vec<AccessPoint>, CtrlError> {
        self.scan_with_timeout(self.scan_timeout)
    }

    /// Like [`Client::scan`] with an explicit wait.
    ///
    /// # Errors
    ///
    /// [`CtrlError::Timeout`] when no access point event arrives in time,
    /// plus any command or decode failure.
    pub fn scan_with_timeout(&self, timeout: Duration) -> Result<Vec<AccessPoint>, CtrlError> {
        let stream = self.notify([WPS_EVENT_AP_AVAILABLE])?;
        let outcome = self.scan_and_collect(&stream, timeout);
        self.stop(&stream);
        outcome
    }

    /// Decodes the daemon's current `SCAN_RESULTS`.
    pub fn scan_results(&self) -> Result<Vec<AccessPoint>, CtrlError> {
        let reply = self.execute(SCAN_RESULTS, &[])?;
        parse_access_points(&reply).map_err(|source| CtrlError::Decode {
            command: SCAN_RESULTS,
            source,
        })
    }

    fn scan_and_collect(
        &self,
        stream: &EventStream,
        timeout: Duration,
    ) -> Result<Vec<AccessPoint>, CtrlError> {
        let cached = self.scan_results()?;
        if !cached.is_empty() {
            debug!(target: CLIENT_TARGET, count = cached.len(), "using cached scan results");
            return Ok(cached);
        }

        self.execute(SCAN, &[])?;
        match stream.recv_timeout(timeout) {
            Ok(_) | Err(RecvTimeoutError::Disconnected) => {}
            Err(RecvTimeoutError::Timeout) => {
                return Err(CtrlError::Timeout {
                    operation: "scan",
                    after: timeout,
                });
            }
        }
        self.scan_results()
    }
}
