//! The timer-driven scan loop.
//!
//! [`ScanLoop`] samples a [`FrameSource`] at a fixed interval, decodes each
//! frame and feeds payloads to the [`Scanner`]. Outcomes are reported as
//! [`ScanEvent`]s over a channel. A [`ScanHandle`] stops the loop or pauses it
//! while the display is hidden.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Notify};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::decode::QrDecoder;
use crate::device::{DeviceRecord, DeviceTable};
use crate::error::{Error, Result};
use crate::frame::{FramePoll, FrameSource};
use crate::scanner::{Detection, ScanState, Scanner};
use crate::Config;

/// Something the loop wants its consumer to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// The timer started.
    Started,
    /// A known device was recognized. The timer is halted.
    Matched {
        /// The matched device.
        device: DeviceRecord,
        /// The payload as decoded.
        payload: String,
        /// When it was recognized.
        at: DateTime<Utc>,
    },
    /// A code was read but isn't in the device table. Scanning continues.
    Unrecognized {
        /// The payload as decoded.
        payload: String,
        /// When it was read.
        at: DateTime<Utc>,
    },
    /// The display was hidden; sampling is suspended.
    Paused,
    /// The display is visible again; sampling resumed.
    Resumed,
    /// The loop stopped without a match.
    Stopped,
    /// The frame source could not be acquired.
    CameraUnavailable {
        /// Why.
        message: String,
    },
}

/// Why [`ScanLoop::run`] returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanExit {
    /// A known device was recognized.
    Matched(DeviceRecord),
    /// Stopped via the handle, or the event receiver went away.
    Stopped,
    /// The frame source has no more frames.
    SourceExhausted,
}

/// Counters for one scan loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Timer ticks that sampled the source.
    pub ticks: u64,
    /// Frames that were ready for decoding.
    pub frames: u64,
    /// Frames that yielded a payload.
    pub payloads: u64,
    /// Payloads that passed the debounce.
    pub accepted: u64,
}

/// A cloneable handle to control a scan loop from other tasks.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    active: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    visible: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ScanHandle {
    fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            visible: Arc::new(AtomicBool::new(true)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Whether the loop's timer is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Ask the loop to stop. Sticky until the loop is restarted.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Report a visibility change. Hidden suspends sampling.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Whether the display is visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }
}

/// Polls a frame source, decodes, debounces and matches.
pub struct ScanLoop {
    scanner: Scanner,
    source: Box<dyn FrameSource>,
    decoder: Arc<dyn QrDecoder>,
    poll_interval: Duration,
    handle: ScanHandle,
    opened: bool,
    stats: ScanStats,
}

impl std::fmt::Debug for ScanLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanLoop")
            .field("scanner", &self.scanner)
            .field("source", &self.source.name())
            .field("poll_interval", &self.poll_interval)
            .field("handle", &self.handle)
            .field("opened", &self.opened)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl ScanLoop {
    /// Create a loop around an existing scanner context.
    #[must_use]
    pub fn new(
        scanner: Scanner,
        source: Box<dyn FrameSource>,
        decoder: Arc<dyn QrDecoder>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            scanner,
            source,
            decoder,
            poll_interval,
            handle: ScanHandle::new(),
            opened: false,
            stats: ScanStats::default(),
        }
    }

    /// Create a loop using the configured interval and debounce window.
    #[must_use]
    pub fn from_config(
        config: &Config,
        devices: Arc<DeviceTable>,
        source: Box<dyn FrameSource>,
        decoder: Arc<dyn QrDecoder>,
    ) -> Self {
        let scanner = Scanner::new(devices, config.debounce_window());
        Self::new(scanner, source, decoder, config.poll_interval())
    }

    /// A handle for stopping the loop or reporting visibility changes.
    #[must_use]
    pub fn handle(&self) -> ScanHandle {
        self.handle.clone()
    }

    /// The scanner context.
    #[must_use]
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// Current scan state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.scanner.state()
    }

    /// Counters accumulated across runs.
    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Go back to scanning after a match (or a stop).
    ///
    /// Clears the debounce timestamp and any pending stop request. Call
    /// [`ScanLoop::run`] again to restart the timer.
    pub fn restart(&mut self) {
        self.handle.clear_stop();
        self.scanner.restart();
    }

    /// Go back to scanning after a match, keeping the debounce timestamp.
    ///
    /// Used for continuous scanning: a code that stays in view is reported
    /// again only once the debounce window has elapsed.
    pub fn resume(&mut self) {
        self.handle.clear_stop();
        self.scanner.resume();
    }

    /// Run the timer until a device is matched, the loop is stopped, or the
    /// source runs out of frames.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyScanning`] if this loop's timer is already
    /// active. If the source can't be opened its error is returned, usually
    /// [`Error::CameraUnavailable`], after a [`ScanEvent::CameraUnavailable`]
    /// is sent.
    pub async fn run(&mut self, tx: mpsc::Sender<ScanEvent>) -> Result<ScanExit> {
        if self.handle.active.swap(true, Ordering::SeqCst) {
            warn!("Scan loop already running");
            return Err(Error::AlreadyScanning);
        }

        let result = self.run_timer(&tx).await;

        self.handle.active.store(false, Ordering::SeqCst);
        debug!(stats = ?self.stats, "Scan loop finished");
        result
    }

    async fn run_timer(&mut self, tx: &mpsc::Sender<ScanEvent>) -> Result<ScanExit> {
        if !self.opened {
            if let Err(e) = self.source.open().await {
                warn!(source = self.source.name(), error = %e, "Frame source unavailable");
                let _ = tx
                    .send(ScanEvent::CameraUnavailable {
                        message: e.to_string(),
                    })
                    .await;
                self.scanner.stop();
                return Err(e);
            }
            self.opened = true;
        }

        self.scanner.start();
        if self.scanner.state() == ScanState::Matched {
            debug!("Scanner already matched; restart before scanning again");
            return Ok(ScanExit::Stopped);
        }

        debug!(
            interval_ms = self.poll_interval.as_millis(),
            source = self.source.name(),
            "Starting scan loop"
        );
        if tx.send(ScanEvent::Started).await.is_err() {
            return Ok(self.halt());
        }

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.handle.should_stop() {
                let _ = tx.send(ScanEvent::Stopped).await;
                return Ok(self.halt());
            }

            if !self.handle.is_visible() {
                debug!("Display hidden, pausing scan timer");
                let _ = tx.send(ScanEvent::Paused).await;
                while !self.handle.is_visible() && !self.handle.should_stop() {
                    self.handle.wake.notified().await;
                }
                if self.handle.should_stop() {
                    continue;
                }
                debug!("Display visible, resuming scan timer");
                let _ = tx.send(ScanEvent::Resumed).await;
                ticker.reset();
                continue;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                () = self.handle.wake.notified() => continue,
            }

            self.stats.ticks += 1;
            let frame = match self.source.poll_frame().await {
                FramePoll::Ready(frame) => frame,
                FramePoll::Pending => {
                    trace!("Frame not ready");
                    continue;
                }
                FramePoll::Exhausted => {
                    debug!(source = self.source.name(), "Frame source exhausted");
                    let _ = tx.send(ScanEvent::Stopped).await;
                    self.scanner.stop();
                    return Ok(ScanExit::SourceExhausted);
                }
            };

            self.stats.frames += 1;
            let Some(payload) = self.decoder.decode(&frame) else {
                trace!("No QR code in frame");
                continue;
            };
            self.stats.payloads += 1;

            match self.scanner.detect(&payload, Instant::now()) {
                Detection::Ignored => {}
                Detection::Matched(device) => {
                    self.stats.accepted += 1;
                    info!(device = %device.id, name = %device.name, "Recognized device");
                    let _ = tx
                        .send(ScanEvent::Matched {
                            device: device.clone(),
                            payload,
                            at: Utc::now(),
                        })
                        .await;
                    return Ok(ScanExit::Matched(device));
                }
                Detection::Unrecognized(payload) => {
                    self.stats.accepted += 1;
                    info!(payload = %payload, "Unrecognized QR code");
                    let event = ScanEvent::Unrecognized {
                        payload,
                        at: Utc::now(),
                    };
                    if tx.send(event).await.is_err() {
                        debug!("Scan event channel closed, stopping loop");
                        return Ok(self.halt());
                    }
                }
            }
        }
    }

    fn halt(&mut self) -> ScanExit {
        self.scanner.stop();
        ScanExit::Stopped
    }
}
