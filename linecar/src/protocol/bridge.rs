// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Link bridge: routes frames from the serial command link to the control loop and turns relay
//! requests from the control loop back into link payloads.
//!
//! Byte 0 of every link frame selects the destination:
//!
//! | Opcode | Meaning                                                    |
//! |--------|------------------------------------------------------------|
//! | `0x00` | reserved, dropped                                          |
//! | `0x01` | bridge-local command, logged and ignored                   |
//! | `0x02` | control command, byte 0 stripped and forwarded as `CMD`    |
//! | `0x03` | link echo, the remaining bytes are queued to be sent back  |
//!
//! Nothing here writes to the link. Replies are queued as messages and written out by whoever
//! owns the transmitter, outside the receive interrupt.

use heapless::Vec;

use crate::protocol::mailbox::Mailbox;
use crate::protocol::messages::{
    DecodeError, IpcMessage, Payload, BRIDGE_CAR_SAY, BRIDGE_NTF_RELAY, CLIENT_BRIDGE_TO_CONTROL,
    CLIENT_CONTROL_TO_BRIDGE, USR_CODE_CMD, USR_CODE_RSP,
};
use crate::protocol::parser::{encode_frame, Frame, Parser, MAX_ENCODED_LEN};

pub const LINK_RESERVED: u8 = 0x00;
pub const LINK_BRIDGE_CMD: u8 = 0x01;
pub const LINK_CONTROL_CMD: u8 = 0x02;
pub const LINK_ECHO: u8 = 0x03;

/// Reply for [`BRIDGE_CAR_SAY`].
pub const CAR_SAY_TEXT: &[u8] = b"Wroom!";

/// Where a link frame goes.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkRoute {
    /// Command for the bridge itself. Not handled by this firmware.
    Local(Payload),
    /// Command message for the control loop.
    Forward(IpcMessage),
    /// Bytes to send back on the link unchanged.
    Echo(Payload),
}

/// Decide where a received link frame goes.
pub fn route_frame(frame: &[u8]) -> Result<LinkRoute, DecodeError> {
    let (&opcode, rest) = frame.split_first().ok_or(DecodeError::Empty)?;
    let rest = Vec::from_slice(rest).map_err(|_| DecodeError::TooLong)?;

    match opcode {
        LINK_RESERVED => Err(DecodeError::Reserved),
        LINK_BRIDGE_CMD => Ok(LinkRoute::Local(rest)),
        LINK_CONTROL_CMD => {
            if rest.is_empty() {
                return Err(DecodeError::Empty);
            }
            Ok(LinkRoute::Forward(IpcMessage {
                client_id: CLIENT_BRIDGE_TO_CONTROL,
                user_code: USR_CODE_CMD,
                payload: rest,
            }))
        }
        LINK_ECHO => Ok(LinkRoute::Echo(rest)),
        other => Err(DecodeError::UnknownCommand(other)),
    }
}

/// Queued reply carrying `data` back to the link unchanged.
pub fn echo_reply(data: Payload) -> IpcMessage {
    IpcMessage {
        client_id: CLIENT_CONTROL_TO_BRIDGE,
        user_code: USR_CODE_RSP,
        payload: data,
    }
}

/// Link payload requested by an outbound message, if any.
///
/// Responses are sent as they are. Commands are bridge requests from the control loop.
pub fn outbound_payload(msg: &IpcMessage) -> Option<Payload> {
    match msg.user_code {
        USR_CODE_RSP => Some(msg.payload.clone()),
        USR_CODE_CMD => {
            let (&cmd, rest) = msg.payload.split_first()?;
            match cmd {
                BRIDGE_NTF_RELAY => Vec::from_slice(rest).ok(),
                BRIDGE_CAR_SAY => Vec::from_slice(CAR_SAY_TEXT).ok(),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Link frame for a message from the control loop, if it asks for one.
pub fn encode_outbound(msg: &IpcMessage) -> Option<Vec<u8, MAX_ENCODED_LEN>> {
    encode_frame(&outbound_payload(msg)?)
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct BridgeStats {
    pub forwarded: u32,
    pub echoed: u32,
    /// Frames rejected because the destination mailbox was still full.
    pub busy: u32,
    pub invalid: u32,
}

/// Feeds link bytes through the frame parser. Control commands go to one mailbox and echo
/// replies to another.
///
/// Intended to run in the serial receive interrupt.
pub struct LinkReceiver<'a, const N: usize> {
    parser: Parser,
    to_control: &'a Mailbox<N>,
    to_link: &'a Mailbox<N>,
    stats: BridgeStats,
}

impl<'a, const N: usize> LinkReceiver<'a, N> {
    pub fn new(to_control: &'a Mailbox<N>, to_link: &'a Mailbox<N>) -> Self {
        Self {
            parser: Parser::new(),
            to_control,
            to_link,
            stats: BridgeStats::default(),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Process one received byte.
    pub fn push_byte(&mut self, byte: u8) {
        if let Some(frame) = self.parser.push(byte) {
            self.handle_frame(&frame);
        }
    }

    fn handle_frame(&mut self, frame: &Frame) {
        match route_frame(frame) {
            Ok(LinkRoute::Forward(msg)) => {
                if self.to_control.post(msg).is_err() {
                    self.stats.busy = self.stats.busy.wrapping_add(1);
                    log::debug!("control mailbox full, command dropped");
                } else {
                    self.stats.forwarded = self.stats.forwarded.wrapping_add(1);
                }
            }
            Ok(LinkRoute::Echo(data)) => {
                if self.to_link.post(echo_reply(data)).is_err() {
                    self.stats.busy = self.stats.busy.wrapping_add(1);
                    log::debug!("link reply pending, echo dropped");
                } else {
                    self.stats.echoed = self.stats.echoed.wrapping_add(1);
                }
            }
            Ok(LinkRoute::Local(_)) => log::debug!("bridge-local command ignored"),
            Err(e) => {
                self.stats.invalid = self.stats.invalid.wrapping_add(1);
                log::debug!("link frame dropped: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mailbox::SingleSlot;
    use crate::protocol::messages::{CMD_START_CAR, CMD_STOP_CAR};
    use crate::protocol::parser::MAX_FRAME_LEN;

    fn feed<const N: usize>(rx: &mut LinkReceiver<'_, N>, data: &[u8]) {
        for b in encode_frame(data).unwrap() {
            rx.push_byte(b);
        }
    }

    #[test]
    fn routed_frame_strips_opcode() {
        let route = route_frame(&[LINK_CONTROL_CMD, 0x04, 0x02, 0xEE, 0x02]).unwrap();
        let LinkRoute::Forward(msg) = route else {
            panic!("expected forward, got {route:?}");
        };
        assert_eq!(msg.user_code, USR_CODE_CMD);
        assert_eq!(msg.payload.as_slice(), &[0x04, 0x02, 0xEE, 0x02]);
    }

    #[test]
    fn reserved_and_unknown_opcodes_are_errors() {
        assert_eq!(route_frame(&[]), Err(DecodeError::Empty));
        assert_eq!(route_frame(&[LINK_RESERVED, 1]), Err(DecodeError::Reserved));
        assert_eq!(route_frame(&[0x7F]), Err(DecodeError::UnknownCommand(0x7F)));
        assert_eq!(route_frame(&[LINK_CONTROL_CMD]), Err(DecodeError::Empty));
    }

    #[test]
    fn local_and_echo_routes() {
        assert_eq!(
            route_frame(&[LINK_BRIDGE_CMD, 9]),
            Ok(LinkRoute::Local(Vec::from_slice(&[9]).unwrap()))
        );
        assert_eq!(
            route_frame(&[LINK_ECHO, b'o', b'k']),
            Ok(LinkRoute::Echo(Vec::from_slice(b"ok").unwrap()))
        );
    }

    #[test]
    fn outbound_relay_and_car_say() {
        let relay = IpcMessage::to_bridge(&[BRIDGE_NTF_RELAY, b'h', b'i']).unwrap();
        assert_eq!(outbound_payload(&relay).unwrap().as_slice(), b"hi");

        let say = IpcMessage::to_bridge(&[BRIDGE_CAR_SAY]).unwrap();
        assert_eq!(outbound_payload(&say).unwrap().as_slice(), CAR_SAY_TEXT);

        let unknown = IpcMessage::to_bridge(&[0x09]).unwrap();
        assert!(outbound_payload(&unknown).is_none());
        assert_eq!(
            encode_outbound(&relay).unwrap().as_slice(),
            encode_frame(b"hi").unwrap().as_slice()
        );
    }

    #[test]
    fn receiver_posts_to_mailbox_and_rejects_when_busy() {
        let (inbox, link_out) = (SingleSlot::new(), SingleSlot::new());
        let mut rx = LinkReceiver::new(&inbox, &link_out);

        feed(&mut rx, &[LINK_CONTROL_CMD, CMD_START_CAR]);
        feed(&mut rx, &[LINK_CONTROL_CMD, CMD_STOP_CAR]);

        assert_eq!(rx.stats().forwarded, 1);
        assert_eq!(rx.stats().busy, 1);
        assert_eq!(inbox.try_take().unwrap().payload.as_slice(), &[CMD_START_CAR]);
        assert!(inbox.is_empty());
        assert!(link_out.is_empty());
    }

    #[test]
    fn receiver_queues_echo_and_counts_invalid() {
        let (inbox, link_out) = (SingleSlot::new(), SingleSlot::new());
        let mut rx = LinkReceiver::new(&inbox, &link_out);

        feed(&mut rx, &[LINK_ECHO, 1, 2, 3]);
        feed(&mut rx, &[LINK_RESERVED]);

        let reply = link_out.try_take().unwrap();
        assert_eq!(reply.user_code, USR_CODE_RSP);
        assert_eq!(
            encode_outbound(&reply).unwrap().as_slice(),
            encode_frame(&[1, 2, 3]).unwrap().as_slice()
        );
        assert_eq!(rx.stats().echoed, 1);
        assert_eq!(rx.stats().invalid, 1);
        assert!(inbox.is_empty());
    }

    #[test]
    fn echo_waits_for_the_pending_reply() {
        let (inbox, link_out) = (SingleSlot::new(), SingleSlot::new());
        let mut rx = LinkReceiver::new(&inbox, &link_out);

        feed(&mut rx, &[LINK_ECHO, b'a']);
        feed(&mut rx, &[LINK_ECHO, b'b']);

        assert_eq!(rx.stats().echoed, 1);
        assert_eq!(rx.stats().busy, 1);
        assert_eq!(link_out.try_take().unwrap().payload.as_slice(), b"a");
        assert!(link_out.is_empty());
    }

    #[test]
    fn largest_echo_fits_in_one_reply() {
        let (inbox, link_out) = (SingleSlot::new(), SingleSlot::new());
        let mut rx = LinkReceiver::new(&inbox, &link_out);

        let mut frame = [0x5Au8; MAX_FRAME_LEN];
        frame[0] = LINK_ECHO;
        feed(&mut rx, &frame);

        assert_eq!(link_out.try_take().unwrap().len(), MAX_FRAME_LEN - 1);
    }
}
