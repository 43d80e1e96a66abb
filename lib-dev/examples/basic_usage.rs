// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use mooltipass_hid::{GetBatteryStatus, MooltipassDevice};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Look for a Mooltipass with the stock VID/PID
    let mut device = MooltipassDevice::new_hid();
    device.connect(true)?;

    // Read the battery status a few times without touching the charger
    for _ in 0..3 {
        match device.battery_status(&GetBatteryStatus::new()) {
            Ok(status) => println!("Battery: {}", status),
            Err(e) => eprintln!("Failed to read battery status: {}", e),
        }
        std::thread::sleep(Duration::from_secs(1));
    }

    // Raw answer, e.g. to inspect bytes the decoder does not know about
    let answer = device.get_battery_status(false, false, false, false, 0, false)?;
    println!("Raw answer: {}", answer);

    device.disconnect();
    Ok(())
}
