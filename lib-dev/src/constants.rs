// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use std::time::Duration;

/// USB vendor ID of the Mooltipass device
pub const USB_VID: u16 = 0x1209;

/// USB product ID of the Mooltipass device
pub const USB_PID: u16 = 0x4321;

/// Read timeout in milliseconds for a single device answer
pub const USB_READ_TIMEOUT_MS: u64 = 4000;

/// Read timeout for a single device answer
pub const USB_READ_TIMEOUT: Duration = Duration::from_millis(USB_READ_TIMEOUT_MS);

/// Size of one HID report, excluding the report ID
pub const HID_REPORT_SIZE: usize = 64;

/// HID report ID used for every message
pub const HID_REPORT_ID: u8 = 0x00;

/// Size of the packet header (command + length)
pub const HEADER_SIZE: usize = 4;

/// Offset of the data region within a received frame
pub const DATA_INDEX: usize = HEADER_SIZE;

/// Largest payload that fits in a single report
pub const MAX_PAYLOAD_SIZE: usize = HID_REPORT_SIZE - HEADER_SIZE;

/// Single byte answer for a refused command
pub const HID_1BYTE_NACK: u8 = 0x00;

/// Single byte answer for an accepted command
pub const HID_1BYTE_ACK: u8 = 0x01;

/// Number of random bytes carried by a ping
pub const PING_NONCE_SIZE: usize = 4;

/// Size of the battery status answer payload
pub const BATTERY_STATUS_SIZE: usize = 20;
