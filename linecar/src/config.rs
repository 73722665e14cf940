// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Compile-time loop configuration.

use crate::control::position::DEFAULT_SENSOR_COUNT;
use crate::control::MotorPolarity;
use crate::drivers::ws2812::Grb;

/// Control loop period.
pub const DEFAULT_TICK_MS: u32 = 20;

/// LED colour for a sensor that sees the line.
pub const LED_LINE_ON: Grb = Grb::new(0x55, 0x00, 0x00);

/// LED colour for a sensor that does not.
pub const LED_LINE_OFF: Grb = Grb::BLACK;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LoopConfig {
    pub tick_ms: u32,
    pub sensor_count: u8,
    pub polarity: MotorPolarity,
    pub led_on: Grb,
    pub led_off: Grb,
}

impl LoopConfig {
    pub const fn new() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            sensor_count: DEFAULT_SENSOR_COUNT,
            polarity: MotorPolarity::Normal,
            led_on: LED_LINE_ON,
            led_off: LED_LINE_OFF,
        }
    }

    pub fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms.max(1);
        self
    }

    pub fn with_sensor_count(mut self, sensor_count: u8) -> Self {
        self.sensor_count = sensor_count;
        self
    }

    pub fn with_polarity(mut self, polarity: MotorPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_led_colors(mut self, on: Grb, off: Grb) -> Self {
        self.led_on = on;
        self.led_off = off;
        self
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::new()
    }
}
