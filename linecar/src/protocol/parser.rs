// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-stream framing for the serial command link.
//!
//! Frame layout: `[START_BYTE, len, data[0..len], checksum]` where `checksum` is the wrapping sum
//! of `len` and every data byte. Frames with `len == 0` or a bad checksum are discarded and the
//! parser resynchronizes on the next start byte.

use heapless::Vec;

use crate::protocol::messages::{IPC_PAYLOAD_CAPACITY, START_BYTE};

/// Largest data section of a link frame.
pub const MAX_FRAME_LEN: usize = IPC_PAYLOAD_CAPACITY;

/// Largest encoded frame: start byte, length, data, checksum.
pub const MAX_ENCODED_LEN: usize = MAX_FRAME_LEN + 3;

pub type Frame = Vec<u8, MAX_FRAME_LEN>;

enum State {
    WaitStart,
    WaitLen,
    Data { len: u8 },
    WaitChecksum,
}

pub struct Parser {
    state: State,
    checksum: u8,
    data: Frame,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::WaitStart,
            checksum: 0,
            data: Frame::new(),
        }
    }

    /// Process a single incoming byte. Returns `Some(frame)` when a complete, valid frame has been
    /// received.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            State::WaitStart => {
                if byte == START_BYTE {
                    self.state = State::WaitLen;
                    self.checksum = 0;
                    self.data.clear();
                }
            }
            State::WaitLen => {
                if byte == 0 {
                    // Empty frame, reset state
                    self.state = State::WaitStart;
                } else {
                    self.checksum = byte;
                    self.state = State::Data { len: byte };
                }
            }
            State::Data { len } => {
                self.checksum = self.checksum.wrapping_add(byte);
                // Capacity equals the largest length byte, so this cannot overflow.
                let _ = self.data.push(byte);
                if self.data.len() == len as usize {
                    self.state = State::WaitChecksum;
                }
            }
            State::WaitChecksum => {
                // Reset for next frame
                self.state = State::WaitStart;

                if byte == self.checksum {
                    return Some(core::mem::take(&mut self.data));
                }
                log::debug!("link frame dropped: bad checksum");
            }
        }
        None
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `data` as a link frame. Returns `None` if `data` is empty or too long.
pub fn encode_frame(data: &[u8]) -> Option<Vec<u8, MAX_ENCODED_LEN>> {
    if data.is_empty() || data.len() > MAX_FRAME_LEN {
        return None;
    }

    let len = data.len() as u8;
    let checksum = data.iter().fold(len, |acc, b| acc.wrapping_add(*b));

    let mut out = Vec::new();
    out.push(START_BYTE).ok()?;
    out.push(len).ok()?;
    out.extend_from_slice(data).ok()?;
    out.push(checksum).ok()?;
    Some(out)
}
