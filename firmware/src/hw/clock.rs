// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond clock on SysTick.

use core::sync::atomic::{AtomicU32, Ordering};

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use cortex_m_rt::exception;
use linecar::traits::Clock;
use stm32f7xx_hal::rcc::Clocks;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Start a 1 kHz SysTick interrupt from the core clock.
pub fn init(mut syst: SYST, clocks: &Clocks) {
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(clocks.sysclk().raw() / 1_000 - 1);
    syst.clear_current();
    syst.enable_counter();
    syst.enable_interrupt();
}

#[exception]
fn SysTick() {
    // Wraps after 49.7 days; consumers use wrapping arithmetic.
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Milliseconds since [`init`].
#[derive(Copy, Clone, Debug, Default)]
pub struct Millis;

impl Clock for Millis {
    #[inline]
    fn now_ms(&self) -> u32 {
        MILLIS.load(Ordering::Relaxed)
    }
}
