//! Canned diagnostic reports.
//!
//! A [`Diagnosis`] is built for a matched device by picking one of its known
//! issues at random and attaching sensor readouts and remediation steps.
//! Nothing here talks to real sensors.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::device::DeviceRecord;

/// Issue text used when a record somehow carries no issues.
const NO_ISSUE: &str = "No known issues";

/// Severity of a single sensor readout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    /// Within normal range.
    #[default]
    Nominal,
    /// Drifting out of range.
    Warning,
    /// Out of range.
    Critical,
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominal => write!(f, "nominal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single sensor readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// What is being measured.
    pub label: String,
    /// Displayed value.
    pub value: String,
    /// Unit of the value.
    #[serde(default)]
    pub unit: String,
    /// Severity.
    #[serde(default)]
    pub status: ReadingStatus,
}

impl SensorReading {
    /// Create a new reading.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
        status: ReadingStatus,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            unit: unit.into(),
            status,
        }
    }
}

/// A diagnostic report for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Id of the diagnosed device.
    pub device_id: String,
    /// Name of the diagnosed device.
    pub device_name: String,
    /// Icon of the diagnosed device.
    pub icon: String,
    /// The reported issue.
    pub issue: String,
    /// Sensor readouts.
    pub readings: Vec<SensorReading>,
    /// Ordered remediation steps.
    pub remediation: Vec<String>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

impl Diagnosis {
    /// The worst status among the readings.
    #[must_use]
    pub fn overall_status(&self) -> ReadingStatus {
        self.readings
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or_default()
    }
}

/// Produces diagnoses for matched devices.
#[derive(Debug)]
pub struct Diagnostician {
    rng: StdRng,
}

impl Diagnostician {
    /// Create a diagnostician. A seed makes issue selection reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Build a diagnosis for `device`.
    pub fn diagnose(&mut self, device: &DeviceRecord) -> Diagnosis {
        let issue = if device.issues.is_empty() {
            NO_ISSUE.to_string()
        } else {
            let index = self.rng.random_range(0..device.issues.len());
            device.issues[index].clone()
        };

        let readings = if device.readings.is_empty() {
            canned_readings()
        } else {
            device.readings.clone()
        };

        let remediation = if device.remediation.is_empty() {
            canned_remediation(&device.name, &issue)
        } else {
            device.remediation.clone()
        };

        Diagnosis {
            device_id: device.id.clone(),
            device_name: device.name.clone(),
            icon: device.icon.clone(),
            issue,
            readings,
            remediation,
            generated_at: Utc::now(),
        }
    }
}

fn canned_readings() -> Vec<SensorReading> {
    vec![
        SensorReading::new("Temperature", "78.4", "°C", ReadingStatus::Warning),
        SensorReading::new("Vibration", "7.2", "mm/s", ReadingStatus::Critical),
        SensorReading::new("Supply voltage", "229.8", "V", ReadingStatus::Nominal),
        SensorReading::new("Runtime", "1842", "h", ReadingStatus::Nominal),
    ]
}

fn canned_remediation(device_name: &str, issue: &str) -> Vec<String> {
    vec![
        format!("Power down the {device_name} and apply lockout/tagout before inspection."),
        format!("Inspect the unit for the reported condition: {issue}."),
        "Replace or re-seat any worn components found during inspection.".to_string(),
        "Restart the unit and confirm all readings return to nominal.".to_string(),
        "Log the intervention and schedule a follow-up scan within 7 days.".to_string(),
    ]
}
