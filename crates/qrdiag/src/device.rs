//! Known-device table.
//!
//! A QR payload is looked up in a [`DeviceTable`] to find the
//! [`DeviceRecord`] it identifies. The table is read-only once loaded. It
//! comes either from an external TOML/JSON file or from the built-in demo set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use figment::{
    providers::{Format, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnosis::SensorReading;
use crate::error::{Error, Result};

/// Allowed shape of a device id (and therefore of a QR payload).
const ID_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._:-]*$";

/// Pseudo-path reported for errors in the built-in table.
const BUILTIN_PATH: &str = "<built-in>";

/// A device that can be identified by scanning its QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device id. This is also the QR payload that identifies it.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Short icon (usually a single emoji).
    #[serde(default)]
    pub icon: String,
    /// Known issues, one of which is reported per diagnosis.
    pub issues: Vec<String>,
    /// Sensor readouts to show instead of the canned defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<SensorReading>,
    /// Remediation steps to show instead of the canned defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remediation: Vec<String>,
}

impl DeviceRecord {
    /// Create a record with no reading or remediation overrides.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        issues: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            issues,
            readings: Vec::new(),
            remediation: Vec::new(),
        }
    }
}

/// On-disk layout of a device table file.
#[derive(Debug, Deserialize)]
struct DeviceTableFile {
    devices: Vec<DeviceRecord>,
}

/// Static lookup table keyed by QR payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTable {
    devices: Vec<DeviceRecord>,
}

impl DeviceTable {
    /// Build a table from records, validating ids and contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceTable`] if the table is empty, an id is
    /// malformed or duplicated, a name is empty, or a device has no issues.
    pub fn new(devices: Vec<DeviceRecord>) -> Result<Self> {
        Self::validated(devices, Path::new(BUILTIN_PATH))
    }

    fn validated(devices: Vec<DeviceRecord>, path: &Path) -> Result<Self> {
        if devices.is_empty() {
            return Err(Error::device_table(path, "no devices defined"));
        }

        let mut seen = HashSet::new();
        for device in &devices {
            if !id_pattern().is_match(&device.id) {
                return Err(Error::device_table(
                    path,
                    format!("invalid device id '{}'", device.id),
                ));
            }
            if !seen.insert(device.id.as_str()) {
                return Err(Error::device_table(
                    path,
                    format!("duplicate device id '{}'", device.id),
                ));
            }
            if device.name.trim().is_empty() {
                return Err(Error::device_table(
                    path,
                    format!("device '{}' has an empty name", device.id),
                ));
            }
            if device.issues.is_empty() {
                return Err(Error::device_table(
                    path,
                    format!("device '{}' has no issues", device.id),
                ));
            }
        }

        Ok(Self { devices })
    }

    /// The demo table compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            devices: builtin_devices(),
        }
    }

    /// Load a table from a TOML or JSON file.
    ///
    /// The format is picked by extension: `.json` is JSON, anything else is TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceTableNotFound`] if the file is missing and
    /// [`Error::DeviceTable`] if it can't be parsed or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::DeviceTableNotFound {
                path: path.to_path_buf(),
            });
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let file: DeviceTableFile = if is_json {
            let text = std::fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|e| Error::device_table(path, e.to_string()))?
        } else {
            Figment::from(Toml::file(path))
                .extract()
                .map_err(|e| Error::device_table(path, e.to_string()))?
        };

        debug!(path = %path.display(), devices = file.devices.len(), "Loaded device table");
        Self::validated(file.devices, path)
    }

    /// Load the configured table, or the built-in one if none is configured.
    ///
    /// # Errors
    ///
    /// Same as [`DeviceTable::load`].
    pub fn load_or_builtin(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Look up the device identified by a QR payload.
    ///
    /// Surrounding whitespace is ignored; matching is otherwise exact.
    #[must_use]
    pub fn lookup(&self, payload: &str) -> Option<&DeviceRecord> {
        let key = payload.trim();
        self.devices.iter().find(|d| d.id == key)
    }

    /// All devices, in table order.
    #[must_use]
    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(ID_PATTERN).expect("device id pattern is valid"))
}

fn builtin_devices() -> Vec<DeviceRecord> {
    vec![
        DeviceRecord::new(
            "HVAC-2041",
            "Rooftop HVAC Unit",
            "❄️",
            vec![
                "Compressor short-cycling detected".to_string(),
                "Condenser coil airflow below threshold".to_string(),
                "Refrigerant pressure drifting low".to_string(),
            ],
        ),
        DeviceRecord::new(
            "PUMP-7731",
            "Coolant Circulation Pump",
            "💧",
            vec![
                "Bearing vibration above baseline".to_string(),
                "Intermittent cavitation at inlet".to_string(),
                "Motor current imbalance between phases".to_string(),
            ],
        ),
        DeviceRecord::new(
            "GEN-0917",
            "Backup Diesel Generator",
            "⚡",
            vec![
                "Starter battery voltage sagging under load".to_string(),
                "Coolant temperature rising during weekly test".to_string(),
            ],
        ),
    ]
}
