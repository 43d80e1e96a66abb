// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! # Mooltipass HID Communication Library
//!
//! This library provides HID communication with Mooltipass devices, including:
//! - Packet encoding and decoding for the command/length/payload format
//! - Device connection with a ping handshake
//! - Blocking send-and-wait-for-acknowledgement
//! - Battery status diagnostics

pub mod constants;
pub mod hid_commands;
pub mod hid_device;
pub mod mooltipass_device;
pub mod packet;

// Re-export commonly used types
pub use constants::*;
pub use hid_commands::{
    build_ping_packet, BatteryStatus, GetBatteryStatus, HidCommand, HidInputMessage,
    HidMessageError, HidOutputCommand, Ping,
};
pub use hid_device::{
    AckError, ConnectionError, DeviceInfo, GenericHidDevice, HidError, HidTransport,
};
pub use mooltipass_device::{MooltipassDevice, MooltipassError};
pub use packet::{decode_text, encode_packet, text_to_bytes, Packet};
