// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PCF8574 8-bit I/O expander wired to the line-tracking sensor board.

use embedded_hal::blocking::i2c::{Read, Write};

use crate::control::SensorReading;
use crate::traits::LineSensor;

/// Address of the tracking board expander.
pub const DEFAULT_ADDRESS: u8 = 0x25;

/// Sensor inputs on P0..P6. P7 is not connected.
pub const SENSOR_MASK: u8 = 0x7F;

/// Line sensor array behind a PCF8574.
pub struct Pcf8574<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Pcf8574<I2C>
where
    I2C: Read<Error = E> + Write<Error = E>,
{
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Release every pin high so it can be read as an input.
    pub fn init(&mut self) -> Result<(), E> {
        self.write_port(0xFF)
    }

    pub fn read_port(&mut self) -> Result<u8, E> {
        let mut buf = [0u8];
        self.i2c.read(self.address, &mut buf)?;
        Ok(buf[0])
    }

    pub fn write_port(&mut self, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[value])
    }
}

impl<I2C, E> LineSensor for Pcf8574<I2C>
where
    I2C: Read<Error = E> + Write<Error = E>,
    E: core::fmt::Debug,
{
    type Error = E;

    fn read(&mut self) -> Result<SensorReading, E> {
        Ok(SensorReading(self.read_port()? & SENSOR_MASK))
    }
}
