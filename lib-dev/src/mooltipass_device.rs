// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::USB_READ_TIMEOUT;
use crate::hid_commands::{
    build_ping_packet, BatteryStatus, GetBatteryStatus, HidInputMessage, HidMessageError,
    HidOutputCommand,
};
use crate::hid_device::{AckError, ConnectionError, DeviceInfo, GenericHidDevice, HidTransport};
use crate::packet::{decode_text, Packet};
use log::debug;
use std::time::Duration;

/// Errors from the decoding helpers of [`MooltipassDevice`]
#[derive(Debug, thiserror::Error)]
pub enum MooltipassError {
    #[error(transparent)]
    Ack(#[from] AckError),

    #[error(transparent)]
    Message(#[from] HidMessageError),
}

/// Mooltipass device on top of a HID transport
pub struct MooltipassDevice<T: HidTransport = GenericHidDevice> {
    device: T,
    device_info: DeviceInfo,
    read_timeout: Duration,
}

impl MooltipassDevice<GenericHidDevice> {
    /// Device backed by hidapi, looking for the stock VID/PID
    pub fn new_hid() -> Self {
        Self::new(GenericHidDevice::new())
    }
}

impl<T: HidTransport> MooltipassDevice<T> {
    pub fn new(device: T) -> Self {
        Self {
            device,
            device_info: DeviceInfo::default(),
            read_timeout: USB_READ_TIMEOUT,
        }
    }

    /// Connect to a device other than the stock VID/PID
    pub fn with_device_info(mut self, device_info: DeviceInfo) -> Self {
        self.device_info = device_info;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    /// Try to connect, sending a fresh ping for the handshake
    pub fn connect(&mut self, verbose: bool) -> Result<(), ConnectionError> {
        let ping = build_ping_packet();
        debug!("Connecting with {}", ping);
        self.device.connect(
            verbose,
            self.device_info.vendor_id,
            self.device_info.product_id,
            self.read_timeout,
            &ping,
        )
    }

    pub fn disconnect(&mut self) {
        self.device.disconnect();
    }

    pub fn internal_device(&self) -> &T {
        &self.device
    }

    pub fn internal_device_mut(&mut self) -> &mut T {
        &mut self.device
    }

    /// Swap in another (possibly already connected) transport
    pub fn set_internal_device(&mut self, device: T) {
        self.device = device;
    }

    /// Text stored in the data region of an answer
    pub fn text_from_packet(&self, packet: &Packet) -> String {
        decode_text(&packet.to_frame())
    }

    /// Send any command and wait for its answer
    pub fn send_command<C: HidOutputCommand>(
        &mut self,
        command: &C,
    ) -> Result<Packet, AckError> {
        let packet = command.to_packet();
        debug!("Sending {:?}", command);
        self.device.send_and_wait_for_ack(&packet)
    }

    /// Query the battery status, optionally driving the charger and the
    /// screen power source. Returns the raw answer.
    pub fn get_battery_status(
        &mut self,
        start_charging: bool,
        stop_charging: bool,
        switch_to_usb_screen_power: bool,
        switch_to_battery_screen_power: bool,
        force_charge_voltage: u16,
        stop_force_charge: bool,
    ) -> Result<Packet, AckError> {
        let request = GetBatteryStatus::new()
            .start_charging(start_charging)
            .stop_charging(stop_charging)
            .switch_to_usb_screen_power(switch_to_usb_screen_power)
            .switch_to_battery_screen_power(switch_to_battery_screen_power)
            .force_charge_voltage(force_charge_voltage)
            .stop_force_charge(stop_force_charge);
        self.send_command(&request)
    }

    /// Send a battery status request and decode the answer
    pub fn battery_status(
        &mut self,
        request: &GetBatteryStatus,
    ) -> Result<BatteryStatus, MooltipassError> {
        let answer = self.send_command(request)?;
        Ok(BatteryStatus::from_buffer(answer.payload())?)
    }
}
