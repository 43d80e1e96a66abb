// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{debug, error};
use mooltipass_hid::{BatteryStatus, GetBatteryStatus, HidTransport, MooltipassDevice};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// What to do once connected
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Number of polls, 0 polls until the process is stopped
    pub count: u64,
    pub interval: Duration,
    pub json: bool,
    /// Sent until one poll succeeds, later polls are plain reads
    pub first_request: GetBatteryStatus,
}

#[derive(Serialize)]
struct StatusLine<'a> {
    time: String,
    #[serde(flatten)]
    status: &'a BatteryStatus,
}

/// Render one poll result
pub fn format_status(timestamp: &str, status: &BatteryStatus, json: bool) -> Result<String> {
    if json {
        let line = StatusLine {
            time: timestamp.to_string(),
            status,
        };
        serde_json::to_string(&line).context("Failed to serialize battery status")
    } else {
        Ok(format!("[{}] {}", timestamp, status))
    }
}

/// Poll the battery status and write one line per answer.
///
/// A failed poll is logged and polling goes on. Fails only if no poll
/// succeeded.
pub fn run_monitor<T: HidTransport, W: Write>(
    device: &mut MooltipassDevice<T>,
    options: &MonitorOptions,
    out: &mut W,
) -> Result<()> {
    let mut polls = 0u64;
    let mut successes = 0u64;

    loop {
        let request = if successes == 0 {
            options.first_request.clone()
        } else {
            GetBatteryStatus::new()
        };
        debug!("Poll {}: {}", polls + 1, request);

        match device.battery_status(&request) {
            Ok(status) => {
                let timestamp = Local::now().format("%H:%M:%S").to_string();
                writeln!(out, "{}", format_status(&timestamp, &status, options.json)?)?;
                successes += 1;
            }
            Err(e) => error!("Failed to read battery status: {}", e),
        }

        polls += 1;
        if options.count != 0 && polls >= options.count {
            break;
        }
        std::thread::sleep(options.interval);
    }

    if successes == 0 {
        bail!("No battery status received in {} attempt(s)", polls);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooltipass_hid::{encode_packet, AckError, ConnectionError, Packet};
    use std::collections::VecDeque;

    struct ScriptedTransport {
        sent: Vec<Packet>,
        answers: VecDeque<Result<Packet, AckError>>,
    }

    impl HidTransport for ScriptedTransport {
        fn connect(
            &mut self,
            _verbose: bool,
            _vendor_id: u16,
            _product_id: u16,
            _read_timeout: Duration,
            _ping: &Packet,
        ) -> Result<(), ConnectionError> {
            Ok(())
        }

        fn disconnect(&mut self) {}

        fn send_and_wait_for_ack(&mut self, packet: &Packet) -> Result<Packet, AckError> {
            self.sent.push(packet.clone());
            self.answers.pop_front().unwrap_or(Err(AckError::Timeout))
        }
    }

    fn status_answer(voltage: u16) -> Packet {
        let mut data = vec![0u8; 12];
        data.extend(&voltage.to_le_bytes());
        data.extend(&[0u8; 6]);
        encode_packet(0x800C, Some(&data))
    }

    fn device(answers: Vec<Result<Packet, AckError>>) -> MooltipassDevice<ScriptedTransport> {
        MooltipassDevice::new(ScriptedTransport {
            sent: Vec::new(),
            answers: answers.into(),
        })
    }

    fn options(count: u64, json: bool) -> MonitorOptions {
        MonitorOptions {
            count,
            interval: Duration::ZERO,
            json,
            first_request: GetBatteryStatus::new().start_charging(true),
        }
    }

    #[test]
    fn test_flags_only_sent_first() {
        let mut device = device(vec![Ok(status_answer(4000)), Ok(status_answer(4010))]);
        let mut out = Vec::new();

        run_monitor(&mut device, &options(2, false), &mut out).unwrap();

        let sent = &device.internal_device().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].payload(), &[1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(sent[1].payload(), &[0, 0, 0, 0, 0, 0, 0]);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("aux voltage: 4010"));
    }

    #[test]
    fn test_json_output() {
        let mut device = device(vec![Ok(status_answer(3950))]);
        let mut out = Vec::new();

        run_monitor(&mut device, &options(1, true), &mut out).unwrap();

        let line: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["aux_battery_voltage"], 3950);
        assert!(line["time"].is_string());
    }

    #[test]
    fn test_failed_poll_continues() {
        let mut device = device(vec![Err(AckError::Timeout), Ok(status_answer(3800))]);
        let mut out = Vec::new();

        run_monitor(&mut device, &options(2, false), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_flags_resent_until_acknowledged() {
        let mut device = device(vec![
            Err(AckError::Timeout),
            Err(AckError::Nack { command: 0x800C }),
            Ok(status_answer(3800)),
            Ok(status_answer(3810)),
        ]);
        let mut out = Vec::new();

        run_monitor(&mut device, &options(4, false), &mut out).unwrap();

        let sent = &device.internal_device().sent;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].payload(), &[1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(sent[1].payload(), &[1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(sent[2].payload(), &[1, 0, 0, 0, 0, 0, 0]);
        assert_eq!(sent[3].payload(), &[0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_all_polls_failed() {
        let mut device = device(vec![]);
        let mut out = Vec::new();

        let result = run_monitor(&mut device, &options(3, false), &mut out);

        assert!(result.is_err());
        assert_eq!(device.internal_device().sent.len(), 3);
    }

    #[test]
    fn test_format_status_text() {
        let status = BatteryStatus {
            power_source: 1,
            platform_charging: 0,
            main_adc_battery_value: 2950,
            aux_charge_status: 0,
            aux_battery_voltage: 3700,
            aux_charge_current: 0,
            aux_stepdown_voltage: 3300,
            aux_dac_register_val: 0,
        };

        assert_eq!(
            format_status("12:00:00", &status, false).unwrap(),
            "[12:00:00] power source: 1, charging: false, main ADC: 2950, aux status: 0, aux voltage: 3700, aux current: 0, stepdown: 3300, DAC: 0"
        );
    }
}
