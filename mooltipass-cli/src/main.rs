// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Battery monitor for Mooltipass devices.
//!
//! Connects over USB HID, then polls the debug battery status and prints one
//! line per answer.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use mooltipass_hid::{GetBatteryStatus, MooltipassDevice};
use std::path::PathBuf;
use std::time::Duration;

mod app;
mod config;

use app::{run_monitor, MonitorOptions};
use config::Config;

#[derive(Parser)]
#[command(
    name = "mooltipass-battery",
    version,
    about = "Battery diagnostics for Mooltipass devices"
)]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Debug logging and device details on connect
    #[arg(short, long)]
    verbose: bool,

    /// Print one JSON object per poll
    #[arg(long)]
    json: bool,

    /// Number of polls, 0 polls forever
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u64,

    /// Seconds between polls, overrides the config file
    #[arg(short, long)]
    interval: Option<f64>,

    #[arg(long)]
    start_charging: bool,

    #[arg(long)]
    stop_charging: bool,

    /// Power the screen from USB
    #[arg(long)]
    usb_screen_power: bool,

    /// Power the screen from the battery
    #[arg(long)]
    battery_screen_power: bool,

    /// Force the charge voltage (raw DAC units)
    #[arg(long, default_value_t = 0)]
    force_charge_voltage: u16,

    #[arg(long)]
    stop_force_charge: bool,
}

impl Args {
    fn first_request(&self) -> GetBatteryStatus {
        GetBatteryStatus::new()
            .start_charging(self.start_charging)
            .stop_charging(self.stop_charging)
            .switch_to_usb_screen_power(self.usb_screen_power)
            .switch_to_battery_screen_power(self.battery_screen_power)
            .force_charge_voltage(self.force_charge_voltage)
            .stop_force_charge(self.stop_force_charge)
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let level = if args.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();

    let interval = match args.interval {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("Invalid interval: {}", secs))?,
        None => config.poll_interval()?,
    };

    let mut device = MooltipassDevice::new_hid()
        .with_device_info(config.device.clone())
        .with_read_timeout(config.read_timeout());
    device
        .connect(args.verbose)
        .context("Failed to connect to Mooltipass")?;
    info!("Connected");

    let options = MonitorOptions {
        count: args.count,
        interval,
        json: args.json,
        first_request: args.first_request(),
    };
    let result = run_monitor(&mut device, &options, &mut std::io::stdout().lock());

    device.disconnect();
    result
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
