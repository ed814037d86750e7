//! Error types for qrdiag.
//!
//! This module defines all error types used throughout the qrdiag crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for qrdiag operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Device Table Errors ===
    /// The device table file does not exist.
    #[error("device table not found at {path}")]
    DeviceTableNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The device table could not be parsed or failed validation.
    #[error("invalid device table {path}: {message}")]
    DeviceTable {
        /// Path of the offending table (`<built-in>` for the embedded one).
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    /// No device is registered under the given id.
    #[error("unknown device: {id}")]
    UnknownDevice {
        /// The id (QR payload) that was looked up.
        id: String,
    },

    // === Scanning Errors ===
    /// The frame source (camera) could not be acquired.
    #[error("camera unavailable ({source_name}): {message}")]
    CameraUnavailable {
        /// Name of the frame source.
        source_name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// A scan loop was started while its timer was already active.
    #[error("scan loop is already running")]
    AlreadyScanning,

    /// A frame was constructed with inconsistent dimensions.
    #[error("invalid frame: expected {expected} pixels, got {actual}")]
    InvalidFrame {
        /// `width * height`.
        expected: usize,
        /// Length of the supplied pixel buffer.
        actual: usize,
    },

    /// An image could not be loaded.
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        /// Path of the image.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for qrdiag operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a camera unavailable error.
    #[must_use]
    pub fn camera_unavailable(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            source_name,
            message: message.into(),
        }
    }

    /// Create a device table validation error.
    #[must_use]
    pub fn device_table(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DeviceTable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown device error.
    #[must_use]
    pub fn unknown_device(id: impl Into<String>) -> Self {
        Self::UnknownDevice { id: id.into() }
    }

    /// Check if this error is fatal to a scanning flow.
    #[must_use]
    pub fn is_camera_unavailable(&self) -> bool {
        matches!(self, Self::CameraUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::AlreadyScanning;
        assert_eq!(err.to_string(), "scan loop is already running");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_camera_unavailable_display() {
        let err = Error::camera_unavailable("images", "no frames");
        let msg = err.to_string();
        assert!(msg.contains("images"));
        assert!(msg.contains("no frames"));
        assert!(err.is_camera_unavailable());
        assert!(!Error::AlreadyScanning.is_camera_unavailable());
    }

    #[test]
    fn test_device_table_error_display() {
        let err = Error::device_table("/etc/devices.toml", "duplicate id 'pump-01'");
        let msg = err.to_string();
        assert!(msg.contains("/etc/devices.toml"));
        assert!(msg.contains("duplicate id"));
    }

    #[test]
    fn test_device_table_not_found_display() {
        let err = Error::DeviceTableNotFound {
            path: PathBuf::from("/missing/devices.toml"),
        };
        assert!(err.to_string().contains("/missing/devices.toml"));
    }

    #[test]
    fn test_unknown_device_display() {
        let err = Error::unknown_device("NOPE-1");
        assert_eq!(err.to_string(), "unknown device: NOPE-1");
    }

    #[test]
    fn test_invalid_frame_display() {
        let err = Error::InvalidFrame {
            expected: 100,
            actual: 99,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("99"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid interval".to_string(),
        };
        assert!(err.to_string().contains("invalid interval"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }
}
