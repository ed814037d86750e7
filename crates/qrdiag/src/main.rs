//! `qrdiag` - CLI for the QR device diagnostics scanner
//!
//! This binary replays image frames through the scan loop and prints a
//! diagnostic report for each device it recognizes.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use qrdiag::cli::{
    Cli, Command, ConfigCommand, DecodeCommand, DevicesCommand, DiagnoseCommand, ScanCommand,
};
use qrdiag::report::{self, OutputFormat};
use qrdiag::{
    init_logging, Config, DeviceTable, Diagnostician, Error, Frame, ImageSequenceSource,
    QrDecoder, RqrrDecoder, ScanEvent, ScanExit, ScanLoop,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // Loaded per command: `config` subcommands must still work when the
    // file is broken.
    let load = || Config::load_from(cli.config.clone());

    match cli.command {
        Command::Scan(scan_cmd) => handle_scan(&load()?, scan_cmd).await,
        Command::Decode(decode_cmd) => handle_decode(&decode_cmd),
        Command::Diagnose(diagnose_cmd) => handle_diagnose(&load()?, &diagnose_cmd),
        Command::Devices(devices_cmd) => handle_devices(&load()?, &devices_cmd),
        Command::Config(config_cmd) => handle_config(cli.config, config_cmd),
    }
}

fn load_devices(config: &Config, override_path: Option<&PathBuf>) -> qrdiag::Result<DeviceTable> {
    DeviceTable::load_or_builtin(override_path.or(config.devices.table_path.as_ref()))
}

async fn handle_scan(config: &Config, cmd: ScanCommand) -> anyhow::Result<()> {
    let devices = Arc::new(load_devices(config, cmd.devices.as_ref())?);
    let format = cmd.format.unwrap_or(config.report.format);
    let mut diagnostician = Diagnostician::new(cmd.seed.or(config.report.seed));

    let source = ImageSequenceSource::new(cmd.inputs).looping(cmd.looping);
    let mut scan = ScanLoop::from_config(
        config,
        devices,
        Box::new(source),
        Arc::new(RqrrDecoder::new()),
    );

    let handle = scan.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let (tx, mut rx) = mpsc::channel(config.scanner.event_buffer);
    let status = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let line = report::status_line(&event);
            match event {
                ScanEvent::CameraUnavailable { .. } => error!("{line}"),
                ScanEvent::Unrecognized { .. } => warn!("{line}"),
                _ => info!("{line}"),
            }
        }
    });

    let mut reports = 0_u32;
    let outcome = loop {
        match scan.run(tx.clone()).await {
            Ok(ScanExit::Matched(device)) => {
                let diagnosis = diagnostician.diagnose(&device);
                println!("{}", report::render_diagnosis(&diagnosis, format)?);
                reports += 1;
                if !cmd.continuous {
                    break Ok(());
                }
                scan.resume();
            }
            Ok(ScanExit::Stopped | ScanExit::SourceExhausted) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    drop(tx);
    status.await.context("status task failed")?;
    outcome?;

    if reports == 0 {
        warn!("No known device was recognized");
    }
    info!(stats = ?scan.stats(), "Scan finished");
    Ok(())
}

fn handle_decode(cmd: &DecodeCommand) -> anyhow::Result<()> {
    let frame = Frame::from_image_file(&cmd.image)?;
    match RqrrDecoder::new().decode(&frame) {
        Some(payload) => {
            println!("{payload}");
            Ok(())
        }
        None => bail!("no QR code found in {}", cmd.image.display()),
    }
}

fn handle_diagnose(config: &Config, cmd: &DiagnoseCommand) -> anyhow::Result<()> {
    let devices = load_devices(config, cmd.devices.as_ref())?;
    let device = devices
        .lookup(&cmd.payload)
        .ok_or_else(|| Error::unknown_device(cmd.payload.trim()))?;

    let mut diagnostician = Diagnostician::new(cmd.seed.or(config.report.seed));
    let diagnosis = diagnostician.diagnose(device);
    let format = cmd.format.unwrap_or(config.report.format);
    println!("{}", report::render_diagnosis(&diagnosis, format)?);
    Ok(())
}

fn handle_devices(config: &Config, cmd: &DevicesCommand) -> anyhow::Result<()> {
    let devices = load_devices(config, None)?;
    match cmd {
        DevicesCommand::List { json } => {
            println!("{}", report::render_devices(&devices, json_format(*json))?);
        }
        DevicesCommand::Show { id, json } => {
            let device = devices
                .lookup(id)
                .ok_or_else(|| Error::unknown_device(id.as_str()))?;
            println!("{}", report::render_device(device, json_format(*json))?);
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            let config = &config;
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Scanner]");
                println!("  Poll interval (ms):   {}", config.scanner.poll_interval_ms);
                println!("  Debounce window (ms): {}", config.scanner.debounce_window_ms);
                println!("  Event buffer:         {}", config.scanner.event_buffer);
                println!();
                println!("[Devices]");
                match &config.devices.table_path {
                    Some(path) => println!("  Table:                {}", path.display()),
                    None => println!("  Table:                built-in"),
                }
                println!();
                println!("[Report]");
                match config.report.seed {
                    Some(seed) => println!("  Seed:                 {seed}"),
                    None => println!("  Seed:                 random"),
                }
                println!("  Format:               {:?}", config.report.format);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.or(config_path).unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            let validated = Config::load_from(Some(path))
                .and_then(|config| load_devices(&config, None).map(|table| table.len()));
            match validated {
                Ok(count) => println!("Configuration is valid ({count} devices)."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn json_format(json: bool) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    }
}
