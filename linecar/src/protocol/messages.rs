// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Inter-core message format and the command set of the control core.
//!
//! An [`IpcMessage`] carries a user code and up to [`IPC_PAYLOAD_CAPACITY`] payload bytes. For
//! command messages ([`USR_CODE_CMD`]) the first payload byte selects the command and the
//! remaining bytes are little-endian operands.

use heapless::Vec;

use crate::control::TuneParam;

/// Sync byte for link frames.
pub const START_BYTE: u8 = 0xA5;

/// Largest payload carried by one message.
pub const IPC_PAYLOAD_CAPACITY: usize = 255;

// Client IDs
pub const CLIENT_BRIDGE_TO_CONTROL: u8 = 0x00;
pub const CLIENT_CONTROL_TO_BRIDGE: u8 = 0x01;

// User codes
pub const USR_CODE_CMD: u8 = 0x01;
pub const USR_CODE_REQ: u8 = 0x02;
pub const USR_CODE_RSP: u8 = 0x03;

// Control core commands
pub const CMD_START_CAR: u8 = 0x01;
pub const CMD_STOP_CAR: u8 = 0x02;
pub const CMD_ECHO: u8 = 0x03;
pub const CMD_TUNE: u8 = 0x04;

// Bridge core commands
pub const BRIDGE_NTF_RELAY: u8 = 0x01;
pub const BRIDGE_CAR_SAY: u8 = 0x02;

pub type Payload = Vec<u8, IPC_PAYLOAD_CAPACITY>;

/// Fixed-capacity message exchanged between the bridge and the control core.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpcMessage {
    pub client_id: u8,
    pub user_code: u8,
    pub payload: Payload,
}

impl IpcMessage {
    /// Build a message, returning `None` if `payload` does not fit.
    pub fn new(client_id: u8, user_code: u8, payload: &[u8]) -> Option<Self> {
        Some(Self {
            client_id,
            user_code,
            payload: Vec::from_slice(payload).ok()?,
        })
    }

    /// Command message from the bridge to the control core.
    pub fn to_control(payload: &[u8]) -> Option<Self> {
        Self::new(CLIENT_BRIDGE_TO_CONTROL, USR_CODE_CMD, payload)
    }

    /// Command message from the control core to the bridge.
    pub fn to_bridge(payload: &[u8]) -> Option<Self> {
        Self::new(CLIENT_CONTROL_TO_BRIDGE, USR_CODE_CMD, payload)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Reasons an inbound message is dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// No payload bytes.
    Empty,
    /// User code other than [`USR_CODE_CMD`].
    UnsupportedUserCode(u8),
    /// First payload byte is not a known command.
    UnknownCommand(u8),
    /// Operands missing for the command.
    Truncated,
    /// TUNE parameter index out of range.
    UnknownParameter(u8),
    /// Reserved link opcode.
    Reserved,
    /// Payload does not fit into a message.
    TooLong,
}

/// Commands understood by the control core.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    StartCar,
    StopCar,
    /// Relay the payload back to the link via the bridge.
    EchoRelay(Payload),
    SetParameter(TuneParam, i16),
}

impl Command {
    /// Decode a message received from the bridge.
    pub fn decode(msg: &IpcMessage) -> Result<Self, DecodeError> {
        let (&opcode, operands) = msg.payload.split_first().ok_or(DecodeError::Empty)?;

        if msg.user_code != USR_CODE_CMD {
            return Err(DecodeError::UnsupportedUserCode(msg.user_code));
        }

        match opcode {
            CMD_START_CAR => Ok(Command::StartCar),
            CMD_STOP_CAR => Ok(Command::StopCar),
            CMD_ECHO => {
                // Operands are a strict sub-slice, so this never exceeds capacity.
                let payload = Vec::from_slice(operands).map_err(|_| DecodeError::TooLong)?;
                Ok(Command::EchoRelay(payload))
            }
            CMD_TUNE => {
                let [index, lo, hi, ..] = *operands else {
                    return Err(DecodeError::Truncated);
                };
                let param = TuneParam::from_index(index).ok_or(DecodeError::UnknownParameter(index))?;
                Ok(Command::SetParameter(param, i16::from_le_bytes([lo, hi])))
            }
            other => Err(DecodeError::UnknownCommand(other)),
        }
    }

    /// Encode as a bridge-to-control command message.
    pub fn encode(&self) -> Result<IpcMessage, DecodeError> {
        let mut payload = Payload::new();
        match self {
            Command::StartCar => push(&mut payload, &[CMD_START_CAR])?,
            Command::StopCar => push(&mut payload, &[CMD_STOP_CAR])?,
            Command::EchoRelay(data) => {
                push(&mut payload, &[CMD_ECHO])?;
                push(&mut payload, data)?;
            }
            Command::SetParameter(param, value) => {
                let [lo, hi] = value.to_le_bytes();
                push(&mut payload, &[CMD_TUNE, param.index(), lo, hi])?;
            }
        }

        Ok(IpcMessage {
            client_id: CLIENT_BRIDGE_TO_CONTROL,
            user_code: USR_CODE_CMD,
            payload,
        })
    }
}

fn push(payload: &mut Payload, bytes: &[u8]) -> Result<(), DecodeError> {
    payload
        .extend_from_slice(bytes)
        .map_err(|_| DecodeError::TooLong)
}
