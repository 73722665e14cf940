// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART debug console and `log` backend.
//!
//! Every log record becomes one `[LEVEL] message\r\n` line on the debug port.
//!
//! To access the terminal on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```
//!
//! To close the debug terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::cell::RefCell;
use core::fmt::{self, Write as _};

use critical_section::Mutex;
use log::{LevelFilter, Log, Metadata, Record};
use nb::block;

use stm32f7xx_hal::{
    pac,
    prelude::*,
    serial::{Instance, Pins, Serial, Tx},
};

pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Write string and CRLF terminator.
    #[inline]
    pub fn println(&mut self, s: &str) {
        self.write_str(s);
        self.write_str("\r\n");
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

pub type DebugPort = Usart<pac::USART3>;

static CONSOLE: Mutex<RefCell<Option<DebugPort>>> = Mutex::new(RefCell::new(None));

static LOGGER: UsartLogger = UsartLogger;

struct UsartLogger;

impl Log for UsartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        critical_section::with(|cs| {
            if let Some(port) = CONSOLE.borrow_ref_mut(cs).as_mut() {
                let _ = write!(port, "[{}] {}\r\n", record.level(), record.args());
            }
        });
    }

    fn flush(&self) {
        critical_section::with(|cs| {
            if let Some(port) = CONSOLE.borrow_ref_mut(cs).as_mut() {
                port.flush();
            }
        });
    }
}

/// Route the `log` macros to `port`.
pub fn init_logger(mut port: DebugPort, level: LevelFilter) {
    port.println("");
    critical_section::with(|cs| {
        CONSOLE.borrow_ref_mut(cs).replace(port);
    });
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
