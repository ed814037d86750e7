//! `qrdiag` - QR-driven device diagnostics
//!
//! This library scans video frames for QR codes, matches decoded payloads
//! against a table of known devices, and produces canned diagnostic reports
//! for the devices it recognizes.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod decode;
pub mod device;
pub mod diagnosis;
pub mod error;
pub mod frame;
pub mod logging;
pub mod monitor;
pub mod report;
pub mod scanner;

pub use config::Config;
pub use decode::{QrDecoder, RqrrDecoder};
pub use device::{DeviceRecord, DeviceTable};
pub use diagnosis::{Diagnosis, Diagnostician, ReadingStatus, SensorReading};
pub use error::{Error, Result};
pub use frame::{Frame, FramePoll, FrameSource, ImageSequenceSource};
pub use logging::init_logging;
pub use monitor::{ScanEvent, ScanExit, ScanHandle, ScanLoop, ScanStats};
pub use report::OutputFormat;
pub use scanner::{Debouncer, Detection, ScanState, Scanner};
