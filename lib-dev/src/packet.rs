// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Matthias Bilger <matthias@bilger.info>

//! Packet codec for the Mooltipass HID protocol.
//!
//! Every message on the wire starts with a 2-byte little-endian command,
//! followed by a 2-byte little-endian payload length and the payload itself.

use crate::constants::{DATA_INDEX, HEADER_SIZE};
use crate::hid_commands::HidMessageError;
use bytes::{Buf, BufMut, BytesMut};
use log::warn;
use serde::Serialize;
use std::fmt;

/// A single protocol message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    command: u16,
    length: u16,
    payload: Vec<u8>,
}

impl Packet {
    /// Build a packet for `command`, copying `payload` verbatim.
    ///
    /// `None` encodes as an empty payload. A payload longer than `u16::MAX`
    /// bytes cannot be described by the length field and is rejected.
    pub fn try_new(command: u16, payload: Option<&[u8]>) -> Result<Self, HidMessageError> {
        let payload = payload.map(<[u8]>::to_vec).unwrap_or_default();
        let length = u16::try_from(payload.len())
            .map_err(|_| HidMessageError::PayloadTooLarge(payload.len()))?;

        Ok(Self {
            command,
            length,
            payload,
        })
    }

    /// Infallible variant of [`Packet::try_new`] for payloads known to fit.
    ///
    /// Truncates anything past `u16::MAX` bytes so that the length field
    /// still matches the payload. Use `try_new` when the size is not bounded.
    pub fn new(command: u16, payload: Option<&[u8]>) -> Self {
        let payload = payload.unwrap_or_default();
        let kept = payload.len().min(usize::from(u16::MAX));
        if kept < payload.len() {
            warn!(
                "Payload of {} bytes truncated to {} for command {:#06x}",
                payload.len(),
                kept,
                command
            );
        }

        Self {
            command,
            length: kept as u16,
            payload: payload[..kept].to_vec(),
        }
    }

    pub fn command(&self) -> u16 {
        self.command
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Command field as it appears on the wire
    pub fn command_bytes(&self) -> [u8; 2] {
        self.command.to_le_bytes()
    }

    /// Length field as it appears on the wire
    pub fn length_bytes(&self) -> [u8; 2] {
        self.length.to_le_bytes()
    }

    /// Command and length fields
    pub fn header(&self) -> [u8; HEADER_SIZE] {
        let [c0, c1] = self.command_bytes();
        let [l0, l1] = self.length_bytes();
        [c0, c1, l0, l1]
    }

    /// Header followed by the payload, without report padding
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        frame.put_u16_le(self.command);
        frame.put_u16_le(self.length);
        frame.put_slice(&self.payload);
        frame.to_vec()
    }

    /// Parse a received frame. Bytes past the announced length are padding
    /// and get ignored.
    pub fn from_frame(frame: &[u8]) -> Result<Self, HidMessageError> {
        if frame.len() < HEADER_SIZE {
            return Err(HidMessageError::InvalidLength {
                expected: HEADER_SIZE,
                actual: frame.len(),
            });
        }

        let mut buf = frame;
        let command = buf.get_u16_le();
        let length = buf.get_u16_le();

        if buf.remaining() < usize::from(length) {
            return Err(HidMessageError::InvalidLength {
                expected: HEADER_SIZE + usize::from(length),
                actual: frame.len(),
            });
        }

        Ok(Self {
            command,
            length,
            payload: buf[..usize::from(length)].to_vec(),
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet {{ command: {:#06x}, length: {}, payload: {:02x?} }}",
            self.command, self.length, self.payload
        )
    }
}

/// Build a packet for a command and an optional payload
pub fn encode_packet(command: u16, payload: Option<&[u8]>) -> Packet {
    Packet::new(command, payload)
}

/// Read the NUL-terminated Latin-1 string stored in the data region of a
/// received frame.
///
/// Without a terminator the whole data region is returned. A frame too short
/// to carry a data region decodes as an empty string.
pub fn decode_text(frame: &[u8]) -> String {
    let data = frame.get(DATA_INDEX..).unwrap_or_default();
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    data[..end].iter().map(|&b| char::from(b)).collect()
}

/// Latin-1 encode `text` and append a NUL terminator.
///
/// Characters outside Latin-1 are replaced with `?`.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .chain(std::iter::once(0))
        .collect()
}
