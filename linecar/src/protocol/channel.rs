// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command channel of the control loop.
//!
//! Polled once per tick. Takes at most one message from the transport, decodes it, and applies it
//! to the [`CarContext`] before the loop reads any parameter.

use crate::control::CarContext;
use crate::protocol::messages::{
    Command, IpcMessage, Payload, BRIDGE_NTF_RELAY, CLIENT_CONTROL_TO_BRIDGE, USR_CODE_CMD,
};
use crate::traits::Transport;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ChannelStats {
    /// Messages taken from the transport.
    pub received: u32,
    /// Malformed messages dropped.
    pub rejected: u32,
    /// Echo payloads handed to the bridge.
    pub relayed: u32,
    /// Echo payloads dropped because the bridge was busy.
    pub relay_dropped: u32,
}

pub struct CommandChannel<T: Transport> {
    transport: T,
    stats: ChannelStats,
}

impl<T: Transport> CommandChannel<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stats: ChannelStats::default(),
        }
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle one pending message, if any. Returns the command that was applied.
    pub fn poll(&mut self, ctx: &mut CarContext) -> Option<Command> {
        if !self.transport.is_message_available() {
            return None;
        }
        let msg = match self.transport.receive() {
            Ok(msg) => msg,
            Err(nb::Error::WouldBlock) => return None,
            Err(nb::Error::Other(e)) => {
                log::warn!("transport receive failed: {:?}", e);
                return None;
            }
        };
        self.stats.received = self.stats.received.wrapping_add(1);

        let cmd = match Command::decode(&msg) {
            Ok(cmd) => cmd,
            Err(e) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                log::debug!("command dropped: {:?}", e);
                return None;
            }
        };

        self.apply(&cmd, ctx);
        Some(cmd)
    }

    fn apply(&mut self, cmd: &Command, ctx: &mut CarContext) {
        match cmd {
            Command::StartCar => {
                log::info!("start");
                ctx.start();
            }
            Command::StopCar => {
                log::info!("stop");
                ctx.stop();
            }
            Command::SetParameter(param, value) => {
                ctx.params.apply(*param, *value);
                log::info!("tune {:?} = {}", param, value);
            }
            Command::EchoRelay(data) => self.relay(data),
        }
    }

    fn relay(&mut self, data: &Payload) {
        let mut payload = Payload::new();
        // Echo operands are one byte shorter than the inbound payload, so the prefix always fits.
        if payload.push(BRIDGE_NTF_RELAY).is_err() || payload.extend_from_slice(data).is_err() {
            return;
        }
        let msg = IpcMessage {
            client_id: CLIENT_CONTROL_TO_BRIDGE,
            user_code: USR_CODE_CMD,
            payload,
        };

        match self.transport.send(msg) {
            Ok(()) => self.stats.relayed = self.stats.relayed.wrapping_add(1),
            Err(nb::Error::WouldBlock) => {
                self.stats.relay_dropped = self.stats.relay_dropped.wrapping_add(1);
                log::debug!("bridge busy, echo dropped");
            }
            Err(nb::Error::Other(e)) => {
                self.stats.relay_dropped = self.stats.relay_dropped.wrapping_add(1);
                log::warn!("echo relay failed: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{DriveState, RuntimeParameters, TuneParam};
    use crate::protocol::mailbox::{MailboxTransport, SingleSlot};
    use crate::protocol::messages::{CMD_ECHO, CMD_START_CAR, CMD_STOP_CAR, CMD_TUNE};

    fn cmd(bytes: &[u8]) -> IpcMessage {
        IpcMessage::to_control(bytes).unwrap()
    }

    /// Transport whose availability flag is set independently of its queue.
    struct FlaggedLink {
        flag: bool,
        pending: Option<IpcMessage>,
    }

    impl Transport for FlaggedLink {
        type Error = core::convert::Infallible;

        fn is_message_available(&self) -> bool {
            self.flag
        }

        fn receive(&mut self) -> nb::Result<IpcMessage, Self::Error> {
            self.pending.take().ok_or(nb::Error::WouldBlock)
        }

        fn send(&mut self, _msg: IpcMessage) -> nb::Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn empty_transport_does_nothing() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        assert!(channel.poll(&mut ctx).is_none());
        assert_eq!(ctx, CarContext::default());
        assert_eq!(channel.stats(), ChannelStats::default());
    }

    #[test]
    fn nothing_is_taken_until_flagged_available() {
        let mut channel = CommandChannel::new(FlaggedLink {
            flag: false,
            pending: Some(cmd(&[CMD_START_CAR])),
        });
        let mut ctx = CarContext::default();

        assert!(channel.poll(&mut ctx).is_none());
        assert!(channel.transport().pending.is_some());
        assert_eq!(ctx.state(), DriveState::Idle);
    }

    #[test]
    fn tune_kp_changes_only_kp() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        inbox.post(cmd(&[CMD_TUNE, 2, 0xEE, 0x02])).unwrap();
        assert_eq!(
            channel.poll(&mut ctx),
            Some(Command::SetParameter(TuneParam::Kp, 750))
        );

        let expected = RuntimeParameters {
            kp: 750.0,
            ..RuntimeParameters::default()
        };
        assert_eq!(ctx.params, expected);
        assert_eq!(ctx.state(), DriveState::Idle);
    }

    #[test]
    fn start_then_stop_twice() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        inbox.post(cmd(&[CMD_START_CAR])).unwrap();
        channel.poll(&mut ctx);
        assert_eq!(ctx.state(), DriveState::Running);

        inbox.post(cmd(&[CMD_STOP_CAR])).unwrap();
        channel.poll(&mut ctx);
        let once = ctx;

        inbox.post(cmd(&[CMD_STOP_CAR])).unwrap();
        channel.poll(&mut ctx);
        assert_eq!(ctx, once);
        assert_eq!(ctx.state(), DriveState::Stopped);
    }

    #[test]
    fn malformed_messages_are_counted() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        for bad in [&[0x09u8][..], &[CMD_TUNE, 2][..], &[CMD_TUNE, 9, 0, 0][..]] {
            inbox.post(cmd(bad)).unwrap();
            assert!(channel.poll(&mut ctx).is_none());
        }

        assert_eq!(channel.stats().received, 3);
        assert_eq!(channel.stats().rejected, 3);
        assert_eq!(ctx, CarContext::default());
    }

    #[test]
    fn echo_is_relayed_with_notify_prefix() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        inbox.post(cmd(&[CMD_ECHO, b'p', b'i', b'n', b'g'])).unwrap();
        channel.poll(&mut ctx);

        let relayed = outbox.try_take().unwrap();
        assert_eq!(relayed.payload.as_slice(), &[BRIDGE_NTF_RELAY, b'p', b'i', b'n', b'g']);
        assert_eq!(channel.stats().relayed, 1);
    }

    #[test]
    fn echo_dropped_when_bridge_busy() {
        let (inbox, outbox) = (SingleSlot::new(), SingleSlot::new());
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        outbox.post(IpcMessage::to_bridge(&[0x02]).unwrap()).unwrap();
        inbox.post(cmd(&[CMD_ECHO, 1])).unwrap();
        channel.poll(&mut ctx);

        assert_eq!(channel.stats().relay_dropped, 1);
        assert_eq!(outbox.try_take().unwrap().payload.as_slice(), &[0x02]);
    }

    #[test]
    fn one_message_per_poll() {
        let inbox: crate::protocol::Mailbox<2> = crate::protocol::Mailbox::new();
        let outbox = SingleSlot::new();
        let mut channel = CommandChannel::new(MailboxTransport::new(&inbox, &outbox));
        let mut ctx = CarContext::default();

        inbox.post(cmd(&[CMD_START_CAR])).unwrap();
        inbox.post(cmd(&[CMD_STOP_CAR])).unwrap();

        assert_eq!(channel.poll(&mut ctx), Some(Command::StartCar));
        assert_eq!(ctx.state(), DriveState::Running);
        assert_eq!(channel.poll(&mut ctx), Some(Command::StopCar));
        assert_eq!(ctx.state(), DriveState::Stopped);
    }
}
