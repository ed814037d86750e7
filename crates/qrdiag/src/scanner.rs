//! Scan state machine and detection debouncing.
//!
//! [`Scanner`] is the context object the scan loop drives. It owns the
//! current [`ScanState`], the [`Debouncer`] and a shared handle to the
//! [`DeviceTable`]. It is plain data with no timers, so every transition can
//! be tested by passing explicit instants.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::device::{DeviceRecord, DeviceTable};

/// Where the scan flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Not scanning.
    #[default]
    Idle,
    /// Sampling frames and waiting for a known code.
    Scanning,
    /// A known device was recognized; sampling is halted.
    Matched,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Matched => write!(f, "matched"),
        }
    }
}

/// Suppresses detections that arrive within a fixed window of the last
/// accepted one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    /// Create a debouncer with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// The debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Instant of the last accepted detection, if any.
    #[must_use]
    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    /// Accept a detection at `now` if at least the window has elapsed since
    /// the last accepted one. Accepting records `now`.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    /// Forget the last accepted detection.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

/// Result of feeding a decoded payload to the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Dropped: either not scanning, or inside the debounce window.
    Ignored,
    /// The payload identifies a known device. The scanner is now `Matched`.
    Matched(DeviceRecord),
    /// The payload is not in the device table. The scanner keeps scanning.
    Unrecognized(String),
}

/// The scan flow context.
#[derive(Debug, Clone)]
pub struct Scanner {
    state: ScanState,
    debouncer: Debouncer,
    devices: Arc<DeviceTable>,
}

impl Scanner {
    /// Create an idle scanner over `devices`.
    #[must_use]
    pub fn new(devices: Arc<DeviceTable>, debounce_window: Duration) -> Self {
        Self {
            state: ScanState::Idle,
            debouncer: Debouncer::new(debounce_window),
            devices,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Whether frames should currently be sampled.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    /// The device table.
    #[must_use]
    pub fn devices(&self) -> &Arc<DeviceTable> {
        &self.devices
    }

    /// The debouncer.
    #[must_use]
    pub fn debouncer(&self) -> &Debouncer {
        &self.debouncer
    }

    /// Begin scanning from `Idle`. Other states are left alone.
    pub fn start(&mut self) {
        if self.state == ScanState::Idle {
            debug!("Scanner idle -> scanning");
            self.state = ScanState::Scanning;
        }
    }

    /// Stop scanning.
    pub fn stop(&mut self) {
        debug!(from = %self.state, "Scanner -> idle");
        self.state = ScanState::Idle;
    }

    /// Return to `Scanning` and clear the debounce timestamp.
    pub fn restart(&mut self) {
        debug!(from = %self.state, "Scanner restarted");
        self.state = ScanState::Scanning;
        self.debouncer.reset();
    }

    /// Return to `Scanning` but keep the debounce timestamp, so a code still
    /// in view is not accepted again until the window has elapsed.
    pub fn resume(&mut self) {
        debug!(from = %self.state, "Scanner resumed");
        self.state = ScanState::Scanning;
    }

    /// Feed a decoded payload observed at `now`.
    pub fn detect(&mut self, payload: &str, now: Instant) -> Detection {
        if !self.is_scanning() {
            trace!(state = %self.state, "Detection while not scanning, ignoring");
            return Detection::Ignored;
        }

        if !self.debouncer.accept(now) {
            trace!(payload, "Detection inside debounce window, ignoring");
            return Detection::Ignored;
        }

        match self.devices.lookup(payload) {
            Some(device) => {
                debug!(device = %device.id, "Scanner scanning -> matched");
                self.state = ScanState::Matched;
                Detection::Matched(device.clone())
            }
            None => {
                debug!(payload, "Unrecognized payload");
                Detection::Unrecognized(payload.to_string())
            }
        }
    }
}
