//! Configuration management for qrdiag.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::report::OutputFormat;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "qrdiag";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `QRDIAG_`)
/// 2. TOML config file at `~/.config/qrdiag/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scan loop configuration.
    pub scanner: ScannerConfig,
    /// Device table configuration.
    pub devices: DevicesConfig,
    /// Report configuration.
    pub report: ReportConfig,
}

/// Scan loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Interval between frame samples in milliseconds.
    pub poll_interval_ms: u64,
    /// Minimum time between accepted detections in milliseconds.
    pub debounce_window_ms: u64,
    /// Capacity of the scan event channel.
    pub event_buffer: usize,
}

/// Device table configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Path to an external device table (TOML or JSON).
    /// The built-in demo table is used when unset.
    pub table_path: Option<PathBuf>,
}

/// Report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Seed for issue selection. Entropy-seeded when unset.
    pub seed: Option<u64>,
    /// Default output format.
    pub format: OutputFormat,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            debounce_window_ms: 2000,
            event_buffer: 16,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("QRDIAG_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.scanner.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.scanner.debounce_window_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "debounce_window_ms must be greater than 0".to_string(),
            });
        }

        if self.scanner.event_buffer == 0 {
            return Err(Error::ConfigValidation {
                message: "event_buffer must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.scanner.poll_interval_ms)
    }

    /// Get the debounce window as a Duration.
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.scanner.debounce_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.scanner.poll_interval_ms, 300);
        assert_eq!(config.scanner.debounce_window_ms, 2000);
        assert_eq!(config.scanner.event_buffer, 16);
        assert!(config.devices.table_path.is_none());
        assert!(config.report.seed.is_none());
        assert_eq!(config.report.format, OutputFormat::Text);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.scanner.poll_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_zero_debounce_window() {
        let mut config = Config::default();
        config.scanner.debounce_window_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("debounce_window_ms"));
    }

    #[test]
    fn test_validate_zero_event_buffer() {
        let mut config = Config::default();
        config.scanner.event_buffer = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("event_buffer"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert_eq!(config.debounce_window(), Duration::from_millis(2000));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("qrdiag"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    // Loading tests run inside a figment `Jail`, which serializes access to
    // the process environment.

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_jail| {
            // A missing file falls back to defaults
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [scanner]
                poll_interval_ms = 100

                [devices]
                table_path = "/tmp/devices.toml"

                [report]
                seed = 7
                format = "json"
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.scanner.poll_interval_ms, 100);
            assert_eq!(config.scanner.debounce_window_ms, 2000);
            assert_eq!(
                config.devices.table_path,
                Some(PathBuf::from("/tmp/devices.toml"))
            );
            assert_eq!(config.report.seed, Some(7));
            assert_eq!(config.report.format, OutputFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                "[scanner]\npoll_interval_ms = 100\ndebounce_window_ms = 1500",
            )?;
            jail.set_env("QRDIAG_SCANNER__POLL_INTERVAL_MS", "500");
            jail.set_env("QRDIAG_REPORT__SEED", "42");

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.scanner.poll_interval_ms, 500);
            assert_eq!(config.scanner.debounce_window_ms, 1500);
            assert_eq!(config.report.seed, Some(42));
            Ok(())
        });
    }

    #[test]
    fn test_env_values_are_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("QRDIAG_SCANNER__EVENT_BUFFER", "0");

            let result = Config::load_from(Some(PathBuf::from("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[scanner]\ndebounce_window_ms = 0")?;

            let result = Config::load_from(Some(PathBuf::from("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_scanner_config_deserialize() {
        let json = r#"{"poll_interval_ms": 50}"#;
        let scanner: ScannerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(scanner.poll_interval_ms, 50);
        assert_eq!(scanner.debounce_window_ms, 2000);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("poll_interval_ms"));
        assert!(json.contains("table_path"));
    }
}
