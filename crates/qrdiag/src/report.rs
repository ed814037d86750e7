//! Rendering of diagnoses, device lists and scan status for the terminal.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::device::{DeviceRecord, DeviceTable};
use crate::diagnosis::{Diagnosis, ReadingStatus};
use crate::error::Result;
use crate::monitor::ScanEvent;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable panels
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Render a diagnosis.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_diagnosis(diagnosis: &Diagnosis, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(diagnosis)?);
    }

    let mut lines = Vec::new();
    let title = format!("{} {}", diagnosis.icon, diagnosis.device_name)
        .trim()
        .to_string();
    lines.push(title.clone());
    lines.push("=".repeat(title.chars().count().max(8)));
    lines.push(format!("Device:    {}", diagnosis.device_id));
    lines.push(format!(
        "Status:    {}",
        status_label(diagnosis.overall_status())
    ));
    lines.push(format!("Issue:     {}", diagnosis.issue));
    lines.push(format!(
        "Generated: {}",
        diagnosis.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());

    lines.push("[Sensor readings]".to_string());
    let label_width = diagnosis
        .readings
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);
    for reading in &diagnosis.readings {
        let value = format!("{} {}", reading.value, reading.unit).trim().to_string();
        lines.push(format!(
            "  {:<label_width$}  {:>12}  {}",
            reading.label,
            value,
            reading.status
        ));
    }
    lines.push(String::new());

    lines.push("[Remediation]".to_string());
    for (index, step) in diagnosis.remediation.iter().enumerate() {
        lines.push(format!("  {}. {}", index + 1, step));
    }

    Ok(lines.join("\n"))
}

/// Render the device table.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_devices(table: &DeviceTable, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(table.devices())?);
    }

    let id_width = table
        .devices()
        .iter()
        .map(|d| d.id.chars().count())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut lines = vec![format!("{:<id_width$}  {:<4}  NAME", "ID", "ICON")];
    for device in table.devices() {
        lines.push(format!(
            "{:<id_width$}  {:<4}  {} ({} issues)",
            device.id,
            device.icon,
            device.name,
            device.issues.len()
        ));
    }
    Ok(lines.join("\n"))
}

/// Render a single device record.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_device(device: &DeviceRecord, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(device)?);
    }

    let mut lines = vec![
        format!("{} {}", device.icon, device.name).trim().to_string(),
        format!("Id: {}", device.id),
        "Known issues:".to_string(),
    ];
    for issue in &device.issues {
        lines.push(format!("  - {issue}"));
    }
    if !device.readings.is_empty() {
        lines.push(format!("Custom readings: {}", device.readings.len()));
    }
    if !device.remediation.is_empty() {
        lines.push(format!("Custom remediation steps: {}", device.remediation.len()));
    }
    Ok(lines.join("\n"))
}

/// One-line status message for a scan event.
#[must_use]
pub fn status_line(event: &ScanEvent) -> String {
    match event {
        ScanEvent::Started => "Scanning for QR codes...".to_string(),
        ScanEvent::Matched { device, .. } => {
            format!("Recognized {} ({})", device.name, device.id)
        }
        ScanEvent::Unrecognized { payload, .. } => {
            format!("Unrecognized QR code: {payload}")
        }
        ScanEvent::Paused => "Scanning paused".to_string(),
        ScanEvent::Resumed => "Scanning resumed".to_string(),
        ScanEvent::Stopped => "Scanning stopped".to_string(),
        ScanEvent::CameraUnavailable { message } => {
            format!("Camera unavailable: {message}")
        }
    }
}

fn status_label(status: ReadingStatus) -> &'static str {
    match status {
        ReadingStatus::Nominal => "OK",
        ReadingStatus::Warning => "ATTENTION",
        ReadingStatus::Critical => "FAULT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use crate::diagnosis::{Diagnostician, SensorReading};

    fn diagnosis() -> Diagnosis {
        let device = DeviceTable::builtin().lookup("HVAC-2041").unwrap().clone();
        Diagnostician::new(Some(9)).diagnose(&device)
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn test_render_diagnosis_text() {
        let diagnosis = diagnosis();
        let text = render_diagnosis(&diagnosis, OutputFormat::Text).unwrap();

        assert!(text.starts_with("❄️ Rooftop HVAC Unit"));
        assert!(text.contains("Device:    HVAC-2041"));
        assert!(text.contains("Status:    FAULT"));
        assert!(text.contains(&diagnosis.issue));
        assert!(text.contains("[Sensor readings]"));
        assert!(text.contains("7.2 mm/s"));
        assert!(text.contains("[Remediation]"));
        assert!(text.contains("  1. Power down the Rooftop HVAC Unit"));
    }

    #[test]
    fn test_render_diagnosis_json() {
        let diagnosis = diagnosis();
        let json = render_diagnosis(&diagnosis, OutputFormat::Json).unwrap();
        let parsed: Diagnosis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, diagnosis);
    }

    #[test]
    fn test_render_diagnosis_without_icon() {
        let diagnosis = Diagnosis {
            device_id: "A".to_string(),
            device_name: "Plain".to_string(),
            icon: String::new(),
            issue: "Issue".to_string(),
            readings: vec![SensorReading::new("Load", "5", "", ReadingStatus::Nominal)],
            remediation: Vec::new(),
            generated_at: Utc::now(),
        };
        let text = render_diagnosis(&diagnosis, OutputFormat::Text).unwrap();
        assert!(text.starts_with("Plain\n"));
        assert!(text.contains("Status:    OK"));
    }

    #[test]
    fn test_render_devices_text() {
        let text = render_devices(&DeviceTable::builtin(), OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ID"));
        assert!(text.contains("PUMP-7731"));
        assert!(text.contains("Backup Diesel Generator (2 issues)"));
    }

    #[test]
    fn test_render_devices_json() {
        let json = render_devices(&DeviceTable::builtin(), OutputFormat::Json).unwrap();
        let parsed: Vec<DeviceRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_render_device_text() {
        let table = DeviceTable::builtin();
        let text = render_device(table.lookup("GEN-0917").unwrap(), OutputFormat::Text).unwrap();
        assert!(text.contains("Id: GEN-0917"));
        assert!(text.contains("  - Starter battery voltage sagging under load"));
        assert!(!text.contains("Custom"));
    }

    #[test]
    fn test_status_lines() {
        let device = DeviceTable::builtin().lookup("PUMP-7731").unwrap().clone();
        assert_eq!(status_line(&ScanEvent::Started), "Scanning for QR codes...");
        assert_eq!(
            status_line(&ScanEvent::Matched {
                device,
                payload: "PUMP-7731".to_string(),
                at: Utc::now(),
            }),
            "Recognized Coolant Circulation Pump (PUMP-7731)"
        );
        assert_eq!(
            status_line(&ScanEvent::Unrecognized {
                payload: "hello".to_string(),
                at: Utc::now(),
            }),
            "Unrecognized QR code: hello"
        );
        assert_eq!(
            status_line(&ScanEvent::CameraUnavailable {
                message: "busy".to_string()
            }),
            "Camera unavailable: busy"
        );
    }
}
