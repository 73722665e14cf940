// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the car controller on an STM32F767ZI board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpiod, Alternate, OpenDrain},
    pac,
    prelude::*,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);
/// ```
pub struct BoardPins {
    pub usart3: Usart3Pins,
    pub usart2: Usart2Pins,
    pub i2c1: I2c1Pins,
    pub spi1: Spi1Pins,
}

/// Debug console on the ST-LINK virtual COM port.
pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

/// Command link to the radio module.
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// Motor board (PCA9685) and tracking board (PCF8574).
pub struct I2c1Pins {
    pub scl: gpiob::PB8<Alternate<4, OpenDrain>>,
    pub sda: gpiob::PB9<Alternate<4, OpenDrain>>,
}

/// WS2812 strip. Only MOSI is wired.
pub struct Spi1Pins {
    pub sck: gpioa::PA5<Alternate<5>>,
    pub miso: gpioa::PA6<Alternate<5>>,
    pub mosi: gpioa::PA7<Alternate<5>>,
}

impl BoardPins {
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpiod = gpiod.split();

        Self {
            usart3: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            usart2: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            i2c1: I2c1Pins {
                scl: gpiob.pb8.into_alternate_open_drain::<4>(),
                sda: gpiob.pb9.into_alternate_open_drain::<4>(),
            },

            spi1: Spi1Pins {
                sck: gpioa.pa5.into_alternate::<5>(),
                miso: gpioa.pa6.into_alternate::<5>(),
                mosi: gpioa.pa7.into_alternate::<5>(),
            },
        }
    }
}
