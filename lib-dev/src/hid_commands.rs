// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::{BATTERY_STATUS_SIZE, PING_NONCE_SIZE};
use crate::packet::Packet;
use bytes::Buf;
use serde::Serialize;
use std::fmt;

/// Command identifiers understood by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum HidCommand {
    Ping = 0x0001,
    Retry = 0x0002,
    PlatInfo = 0x0003,
    GetDeviceStatus = 0x0011,
    DbgGetBatteryStatus = 0x800C,
}

impl From<HidCommand> for u16 {
    fn from(val: HidCommand) -> Self {
        val as u16
    }
}

impl TryFrom<u16> for HidCommand {
    type Error = HidMessageError;

    fn try_from(val: u16) -> Result<Self, Self::Error> {
        match val {
            0x0001 => Ok(HidCommand::Ping),
            0x0002 => Ok(HidCommand::Retry),
            0x0003 => Ok(HidCommand::PlatInfo),
            0x0011 => Ok(HidCommand::GetDeviceStatus),
            0x800C => Ok(HidCommand::DbgGetBatteryStatus),
            cmd => Err(HidMessageError::UnknownCommand(cmd)),
        }
    }
}

impl fmt::Display for HidCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HidCommand::Ping => write!(f, "Ping"),
            HidCommand::Retry => write!(f, "Retry"),
            HidCommand::PlatInfo => write!(f, "Platform Info"),
            HidCommand::GetDeviceStatus => write!(f, "Get Device Status"),
            HidCommand::DbgGetBatteryStatus => write!(f, "Debug Get Battery Status"),
        }
    }
}

/// Base trait for messages decoded from a reply payload
pub trait HidInputMessage: fmt::Debug {
    fn from_buffer(buffer: &[u8]) -> Result<Self, HidMessageError>
    where
        Self: Sized;
}

/// Errors that can occur when parsing HID messages
#[derive(Debug, thiserror::Error)]
pub enum HidMessageError {
    #[error("Invalid buffer length: expected at least {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown command: {0:#06x}")]
    UnknownCommand(u16),

    #[error("Payload of {0} bytes does not fit the 16-bit length field")]
    PayloadTooLarge(usize),
}

/// Base trait for commands sent to the device
pub trait HidOutputCommand: fmt::Debug {
    fn command(&self) -> HidCommand;

    fn payload(&self) -> Vec<u8>;

    fn to_packet(&self) -> Packet {
        Packet::new(self.command().into(), Some(&self.payload()))
    }
}

/// Ping carrying a nonce the device echoes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    nonce: [u8; PING_NONCE_SIZE],
}

impl Ping {
    pub fn new(nonce: [u8; PING_NONCE_SIZE]) -> Self {
        Self { nonce }
    }

    /// Ping with independently drawn random nonce bytes
    pub fn random() -> Self {
        Self::new(rand::random())
    }

    pub fn nonce(&self) -> [u8; PING_NONCE_SIZE] {
        self.nonce
    }
}

impl HidOutputCommand for Ping {
    fn command(&self) -> HidCommand {
        HidCommand::Ping
    }

    fn payload(&self) -> Vec<u8> {
        self.nonce.to_vec()
    }
}

impl fmt::Display for Ping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ping {{ nonce: {:02x?} }}", self.nonce)
    }
}

/// Build the connect-time handshake packet
pub fn build_ping_packet() -> Packet {
    Ping::random().to_packet()
}

/// Debug battery status request.
///
/// The flags let the caller drive the charger and the screen power source
/// while reading the status back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetBatteryStatus {
    start_charging: bool,
    stop_charging: bool,
    switch_to_usb_screen_power: bool,
    switch_to_battery_screen_power: bool,
    force_charge_voltage: u16,
    stop_force_charge: bool,
}

impl GetBatteryStatus {
    /// Plain status read, no side effects on the device
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_charging(mut self, start: bool) -> Self {
        self.start_charging = start;
        self
    }

    pub fn stop_charging(mut self, stop: bool) -> Self {
        self.stop_charging = stop;
        self
    }

    pub fn switch_to_usb_screen_power(mut self, switch: bool) -> Self {
        self.switch_to_usb_screen_power = switch;
        self
    }

    pub fn switch_to_battery_screen_power(mut self, switch: bool) -> Self {
        self.switch_to_battery_screen_power = switch;
        self
    }

    /// Force the charge voltage, 0 leaves it untouched
    pub fn force_charge_voltage(mut self, voltage: u16) -> Self {
        self.force_charge_voltage = voltage;
        self
    }

    pub fn stop_force_charge(mut self, stop: bool) -> Self {
        self.stop_force_charge = stop;
        self
    }
}

impl HidOutputCommand for GetBatteryStatus {
    fn command(&self) -> HidCommand {
        HidCommand::DbgGetBatteryStatus
    }

    fn payload(&self) -> Vec<u8> {
        let [voltage_lo, voltage_hi] = self.force_charge_voltage.to_le_bytes();
        vec![
            u8::from(self.start_charging),
            u8::from(self.stop_charging),
            u8::from(self.switch_to_usb_screen_power),
            u8::from(self.switch_to_battery_screen_power),
            voltage_lo,
            voltage_hi,
            u8::from(self.stop_force_charge),
        ]
    }
}

impl fmt::Display for GetBatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GetBatteryStatus {{ start_charging: {}, stop_charging: {}, usb_screen: {}, battery_screen: {}, force_voltage: {}, stop_force: {} }}",
            self.start_charging,
            self.stop_charging,
            self.switch_to_usb_screen_power,
            self.switch_to_battery_screen_power,
            self.force_charge_voltage,
            self.stop_force_charge
        )
    }
}

/// Battery status reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatteryStatus {
    pub power_source: u32,
    pub platform_charging: u32,
    pub main_adc_battery_value: u16,
    pub aux_charge_status: u16,
    pub aux_battery_voltage: u16,
    pub aux_charge_current: i16,
    pub aux_stepdown_voltage: u16,
    pub aux_dac_register_val: u16,
}

impl BatteryStatus {
    pub fn is_charging(&self) -> bool {
        self.platform_charging != 0
    }
}

impl HidInputMessage for BatteryStatus {
    fn from_buffer(buffer: &[u8]) -> Result<Self, HidMessageError> {
        if buffer.len() < BATTERY_STATUS_SIZE {
            return Err(HidMessageError::InvalidLength {
                expected: BATTERY_STATUS_SIZE,
                actual: buffer.len(),
            });
        }

        let mut buf = buffer;
        Ok(Self {
            power_source: buf.get_u32_le(),
            platform_charging: buf.get_u32_le(),
            main_adc_battery_value: buf.get_u16_le(),
            aux_charge_status: buf.get_u16_le(),
            aux_battery_voltage: buf.get_u16_le(),
            aux_charge_current: buf.get_i16_le(),
            aux_stepdown_voltage: buf.get_u16_le(),
            aux_dac_register_val: buf.get_u16_le(),
        })
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "power source: {}, charging: {}, main ADC: {}, aux status: {}, aux voltage: {}, aux current: {}, stepdown: {}, DAC: {}",
            self.power_source,
            self.is_charging(),
            self.main_adc_battery_value,
            self.aux_charge_status,
            self.aux_battery_voltage,
            self.aux_charge_current,
            self.aux_stepdown_voltage,
            self.aux_dac_register_val
        )
    }
}
