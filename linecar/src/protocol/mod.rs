// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Command Protocol
//!
//! - [`messages`] - Inter-core message format and command codes.
//! - [`parser`] - Byte-stream framing for the serial link.
//! - [`mailbox`] - Interrupt-safe message handoff.
//! - [`bridge`] - Routing between the serial link and the control loop.
//! - [`channel`] - Command handling inside the control loop.

pub mod bridge;
pub mod channel;
pub mod mailbox;
pub mod messages;
pub mod parser;

pub use bridge::{LinkReceiver, LinkRoute};
pub use channel::{ChannelStats, CommandChannel};
pub use mailbox::{Mailbox, MailboxTransport, SingleSlot};
pub use messages::{Command, DecodeError, IpcMessage, Payload};
pub use parser::Parser;
