// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial command link and the bridge side of the control mailboxes.
//!
//! The USART receive interrupt feeds link bytes to a [`LinkReceiver`], which posts control
//! commands into [`TO_CONTROL`] and echo replies into [`LINK_ECHO`]. The interrupt never transmits.
//! Queued replies and the messages the control loop posts into [`TO_BRIDGE`] are written out by
//! [`BridgeDelay`] while the loop waits for its next tick, with interrupts enabled.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::blocking::delay::DelayMs;
use nb::block;

use linecar::protocol::bridge::encode_outbound;
use linecar::protocol::{LinkReceiver, Mailbox, SingleSlot};
use linecar::traits::Clock;
use stm32f7xx_hal::{
    pac::{self, interrupt},
    prelude::*,
    serial::{Event, Pins, Rx, Serial, Tx},
};

use crate::hw::clock::Millis;

type LinkUsart = pac::USART2;

/// Transmit half of the command link.
pub type LinkTx = Tx<LinkUsart>;

/// Commands for the control loop.
pub static TO_CONTROL: SingleSlot = Mailbox::new();

/// Requests from the control loop to the bridge.
pub static TO_BRIDGE: SingleSlot = Mailbox::new();

/// Echo replies waiting to go back out on the link.
pub static LINK_ECHO: SingleSlot = Mailbox::new();

struct LinkRx {
    rx: Rx<LinkUsart>,
    receiver: LinkReceiver<'static, 1>,
}

static LINK_RX: Mutex<RefCell<Option<LinkRx>>> = Mutex::new(RefCell::new(None));

/// Take over the link USART, enable its receive interrupt and hand back the transmitter.
pub fn init<PINS: Pins<LinkUsart>>(mut serial: Serial<LinkUsart, PINS>) -> LinkTx {
    serial.listen(Event::Rxne);
    let (tx, rx) = serial.split();

    critical_section::with(|cs| {
        LINK_RX.borrow_ref_mut(cs).replace(LinkRx {
            rx,
            receiver: LinkReceiver::new(&TO_CONTROL, &LINK_ECHO),
        });
    });

    // SAFETY: the handler only touches state guarded by critical sections.
    unsafe { cortex_m::peripheral::NVIC::unmask(pac::Interrupt::USART2) };
    tx
}

#[interrupt]
fn USART2() {
    critical_section::with(|cs| {
        let mut link = LINK_RX.borrow_ref_mut(cs);
        let Some(link) = link.as_mut() else {
            return;
        };

        // Drain everything received so far. A receive error ends the burst.
        while let Ok(byte) = link.rx.read() {
            link.receiver.push_byte(byte);
        }
    });
}

/// Delay that writes queued link traffic while it waits.
pub struct BridgeDelay {
    clock: Millis,
    tx: LinkTx,
}

impl BridgeDelay {
    pub fn new(clock: Millis, tx: LinkTx) -> Self {
        Self { clock, tx }
    }

    /// Write out one queued message, echo replies first. Returns `false` if there was none.
    pub fn pump_outbound(&mut self) -> bool {
        let Ok(msg) = LINK_ECHO.try_take().or_else(|_| TO_BRIDGE.try_take()) else {
            return false;
        };

        match encode_outbound(&msg) {
            Some(frame) => {
                for &b in frame.iter() {
                    let _ = block!(self.tx.write(b));
                }
            }
            None => log::debug!("bridge request ignored: {:?}", msg.payload.first()),
        }
        true
    }
}

impl DelayMs<u32> for BridgeDelay {
    fn delay_ms(&mut self, ms: u32) {
        let start = self.clock.now_ms();
        while self.clock.now_ms().wrapping_sub(start) < ms {
            if !self.pump_outbound() {
                // SysTick wakes us every millisecond.
                cortex_m::asm::wfi();
            }
        }
    }
}

impl DelayMs<u8> for BridgeDelay {
    fn delay_ms(&mut self, ms: u8) {
        DelayMs::<u32>::delay_ms(self, ms as u32);
    }
}
