// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-safe mailbox between a message producer and the control loop.
//!
//! A [`Mailbox`] holds at most `N` messages in arrival order. Posting to a full mailbox rejects the
//! new message and hands it back to the producer; queued messages are never overwritten. Taking a
//! message removes it inside the same critical section, so the consumer owns the payload before
//! the slot becomes free again.
//!
//! ```ignore
//! static INBOX: Mailbox<1> = Mailbox::new();
//!
//! // interrupt handler
//! if INBOX.post(msg).is_err() {
//!     // previous message not consumed yet
//! }
//!
//! // control loop
//! if let Ok(msg) = INBOX.try_take() {
//!     handle(msg);
//! }
//! ```

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;
use heapless::Deque;

use crate::protocol::messages::IpcMessage;
use crate::traits::Transport;

/// Bounded FIFO of inter-core messages shared with an interrupt handler.
pub struct Mailbox<const N: usize> {
    slots: Mutex<RefCell<Deque<IpcMessage, N>>>,
}

/// Single pending message, the classic data-available flag handoff.
pub type SingleSlot = Mailbox<1>;

impl<const N: usize> Mailbox<N> {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Queue a message. Returns it back if the mailbox is full.
    pub fn post(&self, msg: IpcMessage) -> Result<(), IpcMessage> {
        critical_section::with(|cs| self.slots.borrow(cs).borrow_mut().push_back(msg))
    }

    /// Remove the oldest message, or `WouldBlock` if none is pending.
    pub fn try_take(&self) -> nb::Result<IpcMessage, Infallible> {
        critical_section::with(|cs| self.slots.borrow(cs).borrow_mut().pop_front())
            .ok_or(nb::Error::WouldBlock)
    }

    /// Whether a message is waiting.
    pub fn is_available(&self) -> bool {
        critical_section::with(|cs| !self.slots.borrow(cs).borrow().is_empty())
    }

    /// Whether a further post would be rejected.
    pub fn is_full(&self) -> bool {
        critical_section::with(|cs| self.slots.borrow(cs).borrow().is_full())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.slots.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        !self.is_available()
    }
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Transport`] built from an inbound and an outbound mailbox.
///
/// The peer counts as busy while the outbound mailbox is full.
pub struct MailboxTransport<'a, const IN: usize, const OUT: usize> {
    inbound: &'a Mailbox<IN>,
    outbound: &'a Mailbox<OUT>,
}

impl<'a, const IN: usize, const OUT: usize> MailboxTransport<'a, IN, OUT> {
    pub fn new(inbound: &'a Mailbox<IN>, outbound: &'a Mailbox<OUT>) -> Self {
        Self { inbound, outbound }
    }

    /// Whether the peer can accept another message.
    pub fn is_peer_ready(&self) -> bool {
        !self.outbound.is_full()
    }
}

impl<'a, const IN: usize, const OUT: usize> Transport for MailboxTransport<'a, IN, OUT> {
    type Error = Infallible;

    fn is_message_available(&self) -> bool {
        self.inbound.is_available()
    }

    fn receive(&mut self) -> nb::Result<IpcMessage, Infallible> {
        self.inbound.try_take()
    }

    fn send(&mut self, msg: IpcMessage) -> nb::Result<(), Infallible> {
        self.outbound.post(msg).map_err(|_| nb::Error::WouldBlock)
    }
}
