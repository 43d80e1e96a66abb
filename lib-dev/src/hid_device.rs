// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

use crate::constants::{
    HID_1BYTE_NACK, HID_REPORT_ID, HID_REPORT_SIZE, MAX_PAYLOAD_SIZE, USB_PID, USB_VID,
};
use crate::hid_commands::{HidCommand, HidMessageError};
use crate::packet::Packet;
use hidapi::{HidApi, HidDevice as RawHidDevice};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Device identification information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            vendor_id: USB_VID,
            product_id: USB_PID,
        }
    }
}

/// Errors that can occur with HID operations
#[derive(Debug, thiserror::Error)]
pub enum HidError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Failed to write to device: {0}")]
    WriteFailed(String),

    #[error("Failed to read from device: {0}")]
    ReadFailed(String),

    #[error("HID API error: {0}")]
    HidApiError(String),
}

/// Errors while establishing a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("No device found with VID {vendor_id:#06x} PID {product_id:#06x}")]
    NotFound { vendor_id: u16, product_id: u16 },

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error(transparent)]
    Hid(#[from] HidError),
}

/// Errors while waiting for the answer to a command
#[derive(Debug, thiserror::Error)]
pub enum AckError {
    #[error("Timed out waiting for acknowledgement")]
    Timeout,

    #[error("Device refused command {command:#06x}")]
    Nack { command: u16 },

    #[error("Device asked to retry the command")]
    Retry,

    #[error("Unexpected answer: expected command {expected:#06x}, got {actual:#06x}")]
    UnexpectedCommand { expected: u16, actual: u16 },

    #[error("Malformed answer: {0}")]
    Malformed(#[from] HidMessageError),

    #[error(transparent)]
    Hid(#[from] HidError),
}

/// Transport the device façade talks through
pub trait HidTransport {
    /// Open the device and run the ping handshake
    fn connect(
        &mut self,
        verbose: bool,
        vendor_id: u16,
        product_id: u16,
        read_timeout: Duration,
        ping: &Packet,
    ) -> Result<(), ConnectionError>;

    fn disconnect(&mut self);

    /// Send `packet` and block until the device answers or the read times out
    fn send_and_wait_for_ack(&mut self, packet: &Packet) -> Result<Packet, AckError>;
}

/// Check an answer against the request it belongs to
pub fn check_ack(request: &Packet, answer: &Packet) -> Result<(), AckError> {
    if answer.command() == u16::from(HidCommand::Retry) {
        return Err(AckError::Retry);
    }
    if answer.command() != request.command() {
        return Err(AckError::UnexpectedCommand {
            expected: request.command(),
            actual: answer.command(),
        });
    }
    if answer.payload() == [HID_1BYTE_NACK] {
        return Err(AckError::Nack {
            command: request.command(),
        });
    }
    Ok(())
}

/// Check that the answer to a ping echoes its nonce
pub fn check_ping_echo(ping: &Packet, answer: &Packet) -> Result<(), ConnectionError> {
    if answer.command() != ping.command() || answer.payload() != ping.payload() {
        warn!(
            "Ping answer {:02x?} does not echo nonce {:02x?}",
            answer.payload(),
            ping.payload()
        );
        return Err(ConnectionError::HandshakeFailed(
            "ping answer does not match".to_string(),
        ));
    }
    Ok(())
}

/// hidapi backed transport, one message per report
pub struct GenericHidDevice {
    device: Option<RawHidDevice>,
    read_timeout: Duration,
}

impl GenericHidDevice {
    pub fn new() -> Self {
        Self {
            device: None,
            read_timeout: crate::constants::USB_READ_TIMEOUT,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Search for a device matching the VID/PID pair
    fn open(vendor_id: u16, product_id: u16) -> Result<RawHidDevice, ConnectionError> {
        let api = HidApi::new().map_err(|e| HidError::HidApiError(e.to_string()))?;

        let device_info = api
            .device_list()
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or(ConnectionError::NotFound {
                vendor_id,
                product_id,
            })?;

        debug!("Found device: {:?}", device_info);
        device_info
            .open_device(&api)
            .map_err(|e| ConnectionError::OpenFailed(e.to_string()))
    }

    fn log_hardware_info(device: &RawHidDevice) {
        let manufacturer = device.get_manufacturer_string().ok().flatten();
        let product = device.get_product_string().ok().flatten();
        let serial_number = device.get_serial_number_string().ok().flatten();
        info!(
            "Connected to device: manufacturer {:?}, product {:?}, serial {:?}",
            manufacturer, product, serial_number
        );
    }

    /// Send a packet as a single report
    fn send_report(&self, packet: &Packet) -> Result<usize, HidError> {
        let dev = self.device.as_ref().ok_or(HidError::NotConnected)?;

        if packet.payload().len() > MAX_PAYLOAD_SIZE {
            return Err(HidError::WriteFailed(format!(
                "payload of {} bytes does not fit a report, at most {} allowed",
                packet.payload().len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        let frame = packet.to_frame();

        let mut buffer = vec![HID_REPORT_ID];
        buffer.extend_from_slice(&frame);
        buffer.resize(HID_REPORT_SIZE + 1, 0);

        debug!("HID TX: {:02x?}", buffer);

        dev.write(&buffer)
            .map_err(|e| HidError::WriteFailed(e.to_string()))
    }

    /// Read a single report, `None` on timeout
    fn read_report(&self) -> Result<Option<Packet>, AckError> {
        let dev = self.device.as_ref().ok_or(HidError::NotConnected)?;

        let timeout_ms = i32::try_from(self.read_timeout.as_millis()).unwrap_or(i32::MAX);
        let mut buffer = [0u8; HID_REPORT_SIZE];
        match dev.read_timeout(&mut buffer, timeout_ms) {
            Ok(0) => Ok(None),
            Ok(size) => {
                debug!("HID RX: {:02x?}", &buffer[..size]);
                Ok(Some(Packet::from_frame(&buffer[..size])?))
            }
            Err(e) => Err(HidError::ReadFailed(e.to_string()).into()),
        }
    }
}

impl Default for GenericHidDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HidTransport for GenericHidDevice {
    fn connect(
        &mut self,
        verbose: bool,
        vendor_id: u16,
        product_id: u16,
        read_timeout: Duration,
        ping: &Packet,
    ) -> Result<(), ConnectionError> {
        info!(
            "Looking for device VID {:#06x} PID {:#06x}...",
            vendor_id, product_id
        );

        let device = Self::open(vendor_id, product_id)?;
        if verbose {
            Self::log_hardware_info(&device);
        }
        self.device = Some(device);
        self.read_timeout = read_timeout;

        let answer = match self.send_and_wait_for_ack(ping) {
            Ok(answer) => answer,
            Err(e) => {
                self.disconnect();
                return Err(ConnectionError::HandshakeFailed(e.to_string()));
            }
        };

        if let Err(e) = check_ping_echo(ping, &answer) {
            self.disconnect();
            return Err(e);
        }

        info!("Device opened successfully");
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.device.take().is_some() {
            info!("Device disconnected");
        }
    }

    fn send_and_wait_for_ack(&mut self, packet: &Packet) -> Result<Packet, AckError> {
        self.send_report(packet)?;

        let answer = self.read_report()?.ok_or(AckError::Timeout)?;
        if let Err(e) = check_ack(packet, &answer) {
            warn!("Command {:#06x} not acknowledged: {}", packet.command(), e);
            return Err(e);
        }
        Ok(answer)
    }
}
