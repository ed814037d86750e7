//! Command-line interface for qrdiag.
//!
//! This module provides the CLI structure for the `qrdiag` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DecodeCommand, DevicesCommand, DiagnoseCommand, ScanCommand,
};

/// qrdiag - Scan a device's QR code and show its diagnostic report
///
/// Samples frames for QR codes, matches them against a table of known
/// devices and prints a diagnostic report for the device it recognizes.
#[derive(Debug, Parser)]
#[command(name = "qrdiag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan image frames for a known device and report on it
    Scan(ScanCommand),

    /// Decode the QR code in a single image
    Decode(DecodeCommand),

    /// Produce a diagnostic report for a payload without scanning
    Diagnose(DiagnoseCommand),

    /// Inspect the known-device table
    #[command(subcommand)]
    Devices(DevicesCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use crate::logging::Verbosity;
    use crate::report::OutputFormat;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Devices(DevicesCommand::List { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "qrdiag");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_scan() {
        let cli =
            Cli::try_parse_from(["qrdiag", "scan", "frames/", "extra.png", "--loop"]).unwrap();
        let Command::Scan(scan) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(
            scan.inputs,
            vec![PathBuf::from("frames/"), PathBuf::from("extra.png")]
        );
        assert!(scan.looping);
        assert!(!scan.continuous);
        assert!(scan.format.is_none());
        assert!(scan.seed.is_none());
    }

    #[test]
    fn test_parse_scan_requires_input() {
        assert!(Cli::try_parse_from(["qrdiag", "scan"]).is_err());
    }

    #[test]
    fn test_parse_scan_options() {
        let cli = Cli::try_parse_from([
            "qrdiag",
            "scan",
            "a.png",
            "--continuous",
            "--format",
            "json",
            "--seed",
            "5",
            "--devices",
            "table.toml",
        ])
        .unwrap();
        let Command::Scan(scan) = cli.command else {
            panic!("expected scan");
        };
        assert!(scan.continuous);
        assert_eq!(scan.format, Some(OutputFormat::Json));
        assert_eq!(scan.seed, Some(5));
        assert_eq!(scan.devices, Some(PathBuf::from("table.toml")));
    }

    #[test]
    fn test_parse_diagnose() {
        let cli = Cli::try_parse_from(["qrdiag", "diagnose", "PUMP-7731"]).unwrap();
        let Command::Diagnose(cmd) = cli.command else {
            panic!("expected diagnose");
        };
        assert_eq!(cmd.payload, "PUMP-7731");
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from(["qrdiag", "decode", "code.png"]).unwrap();
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn test_parse_devices_show() {
        let cli = Cli::try_parse_from(["qrdiag", "devices", "show", "GEN-0917", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Devices(DevicesCommand::Show { json: true, .. })
        ));
    }

    #[test]
    fn test_parse_with_global_flags() {
        let cli = Cli::try_parse_from([
            "qrdiag",
            "-c",
            "/custom/config.toml",
            "-vv",
            "config",
            "show",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Show { json: false })
        ));
    }
}
