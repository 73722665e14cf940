// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! NXP PCA9685 16-channel, 12-bit PWM controller over I2C.
//!
//! This module handles register access and on/off time computation. The motor layer in
//! [`crate::drivers::car_drive`] sits on top of it.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use micromath::F32Ext;

/// Address of the PCA9685 on the car's motor board.
pub const DEFAULT_ADDRESS: u8 = 0x5F;

/// Number of PWM outputs.
pub const CHANNELS: u8 = 16;

/// Counter steps per PWM period. A pulse width of this value or more is fully on.
pub const PWM_STEPS: u16 = 4096;

/// Internal oscillator.
pub const OSC_HZ: f32 = 25_000_000.0;

pub const PRESCALE_MIN: u8 = 0x03;
pub const PRESCALE_MAX: u8 = 0xFF;

// Register addresses
pub mod reg {
    pub const MODE1: u8 = 0x00;
    pub const LED0_ON_L: u8 = 0x06;
    pub const PRE_SCALE: u8 = 0xFE;

    /// Each channel occupies ON_L, ON_H, OFF_L, OFF_H.
    pub const LED_STRIDE: u8 = 4;
}

/// MODE1 register.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Mode1 {
    raw: u8,
}

impl Mode1 {
    const RESTART: u8 = 1 << 7;
    const AI: u8 = 1 << 5;
    const SLEEP: u8 = 1 << 4;

    #[inline]
    pub fn from_raw(raw: u8) -> Self {
        Self { raw }
    }

    #[inline]
    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// PWM channels were running when the oscillator was stopped.
    #[inline]
    pub fn restart(&self) -> bool {
        (self.raw & Self::RESTART) != 0
    }

    /// Register auto-increment.
    #[inline]
    pub fn auto_increment(&self) -> bool {
        (self.raw & Self::AI) != 0
    }

    /// Low-power mode, oscillator off.
    #[inline]
    pub fn sleep(&self) -> bool {
        (self.raw & Self::SLEEP) != 0
    }

    fn with_sleep(self, on: bool) -> Self {
        Self::from_raw(set_bit(self.raw, Self::SLEEP, on))
    }

    fn with_auto_increment(self, on: bool) -> Self {
        Self::from_raw(set_bit(self.raw, Self::AI, on))
    }
}

#[inline]
fn set_bit(raw: u8, mask: u8, on: bool) -> u8 {
    if on {
        raw | mask
    } else {
        raw & !mask
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// I2C transfer failed.
    Bus(E),
    /// Channel index ≥ [`CHANNELS`].
    InvalidChannel(u8),
}

/// Prescaler value for an output frequency of `freq_hz`.
pub fn prescale_for(freq_hz: f32) -> u8 {
    if freq_hz <= 0.0 {
        return PRESCALE_MAX;
    }
    let prescale = (OSC_HZ / (PWM_STEPS as f32 * freq_hz)).round() - 1.0;
    prescale.clamp(PRESCALE_MIN as f32, PRESCALE_MAX as f32) as u8
}

/// ON and OFF counter values for a pulse of `pulse_width` steps starting at phase 0.
///
/// Zero and full scale use the dedicated full-off and full-on bits.
pub fn on_off_times(pulse_width: u16) -> (u16, u16) {
    match pulse_width {
        0 => (0, PWM_STEPS),
        w if w >= PWM_STEPS => (PWM_STEPS, 0),
        w => (0, w),
    }
}

/// PCA9685 on an I2C bus.
pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Driver at [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Release the bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Clear MODE1: oscillator on, auto-increment off, all-call disabled.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.write_reg(reg::MODE1, 0x00)
    }

    pub fn read_reg(&mut self, addr: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[addr], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    pub fn write_reg(&mut self, addr: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c.write(self.address, &[addr, value]).map_err(Error::Bus)
    }

    pub fn mode1(&mut self) -> Result<Mode1, Error<E>> {
        Ok(Mode1::from_raw(self.read_reg(reg::MODE1)?))
    }

    /// Set the PWM frequency of all channels.
    pub fn set_frequency<D: DelayMs<u8>>(
        &mut self,
        freq_hz: f32,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        self.set_prescale(prescale_for(freq_hz), delay)
    }

    /// Write the prescaler. The oscillator has to be asleep for the write to take effect.
    pub fn set_prescale<D: DelayMs<u8>>(
        &mut self,
        prescale: u8,
        delay: &mut D,
    ) -> Result<(), Error<E>> {
        let mode = self.mode1()?;
        self.write_reg(reg::MODE1, mode.with_sleep(true).raw())?;
        self.write_reg(reg::PRE_SCALE, prescale.max(PRESCALE_MIN))?;
        self.wake(delay)
    }

    /// Leave sleep with auto-increment on, restarting channels that were running.
    fn wake<D: DelayMs<u8>>(&mut self, delay: &mut D) -> Result<(), Error<E>> {
        let mode = self.mode1()?.with_sleep(false).with_auto_increment(true);
        self.write_reg(reg::MODE1, mode.raw())?;

        if mode.restart() {
            // Oscillator needs 500 µs to stabilize.
            delay.delay_ms(1);
            // Writing one clears RESTART.
            self.write_reg(reg::MODE1, mode.raw())?;
        }
        Ok(())
    }

    /// Program raw ON and OFF counter values for `channel`.
    pub fn set_on_off(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Error<E>> {
        if channel >= CHANNELS {
            return Err(Error::InvalidChannel(channel));
        }

        let addr = reg::LED0_ON_L + reg::LED_STRIDE * channel;
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        self.i2c
            .write(self.address, &[addr, on_l, on_h, off_l, off_h])
            .map_err(Error::Bus)
    }

    /// Set the high time of `channel` in counter steps (0..=4096).
    pub fn set_pulse_width(&mut self, channel: u8, pulse_width: u16) -> Result<(), Error<E>> {
        let (on, off) = on_off_times(pulse_width);
        self.set_on_off(channel, on, off)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    /// Register-level PCA9685 model that records every write.
    pub struct FakeBus {
        pub regs: [u8; 256],
        pub writes: Vec<(u8, Vec<u8>)>,
    }

    impl FakeBus {
        pub fn new() -> Self {
            Self {
                regs: [0; 256],
                writes: Vec::new(),
            }
        }
    }

    impl Write for FakeBus {
        type Error = Infallible;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Infallible> {
            if let Some((&reg, data)) = bytes.split_first() {
                for (i, b) in data.iter().enumerate() {
                    self.regs[reg as usize + i] = *b;
                }
            }
            self.writes.push((address, bytes.to_vec()));
            Ok(())
        }
    }

    impl WriteRead for FakeBus {
        type Error = Infallible;

        fn write_read(
            &mut self,
            _address: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), Infallible> {
            let reg = bytes[0] as usize;
            buffer.copy_from_slice(&self.regs[reg..reg + buffer.len()]);
            Ok(())
        }
    }

    pub struct NoDelay;

    impl DelayMs<u8> for NoDelay {
        fn delay_ms(&mut self, _ms: u8) {}
    }

    #[test]
    fn prescale_follows_datasheet_formula() {
        assert_eq!(prescale_for(100.0), 60);
        assert_eq!(prescale_for(50.0), 121);
        assert_eq!(prescale_for(1526.0), PRESCALE_MIN);
        assert_eq!(prescale_for(10.0), PRESCALE_MAX);
    }

    #[test]
    fn pulse_width_edges_use_full_on_and_off() {
        assert_eq!(on_off_times(0), (0, 4096));
        assert_eq!(on_off_times(1000), (0, 1000));
        assert_eq!(on_off_times(4095), (0, 4095));
        assert_eq!(on_off_times(4096), (4096, 0));
        assert_eq!(on_off_times(9000), (4096, 0));
    }

    #[test]
    fn channel_registers_are_strided() {
        let mut pwm = Pca9685::new(FakeBus::new());
        pwm.set_pulse_width(15, 1000).unwrap();

        let bus = pwm.free();
        let (addr, bytes) = &bus.writes[0];
        assert_eq!(*addr, DEFAULT_ADDRESS);
        assert_eq!(bytes.as_slice(), &[0x42, 0x00, 0x00, 0xE8, 0x03]);
    }

    #[test]
    fn invalid_channel_is_rejected() {
        let mut pwm = Pca9685::new(FakeBus::new());
        assert_eq!(pwm.set_pulse_width(16, 10), Err(Error::InvalidChannel(16)));
        assert!(pwm.free().writes.is_empty());
    }

    #[test]
    fn prescale_goes_through_sleep() {
        let mut bus = FakeBus::new();
        bus.regs[reg::MODE1 as usize] = 0x80;
        let mut pwm = Pca9685::new(bus);
        pwm.set_frequency(100.0, &mut NoDelay).unwrap();

        let bus = pwm.free();
        let writes: Vec<&[u8]> = bus.writes.iter().map(|(_, b)| b.as_slice()).collect();
        assert_eq!(
            writes,
            [
                &[reg::MODE1, 0x90][..],
                &[reg::PRE_SCALE, 60][..],
                &[reg::MODE1, 0xA0][..],
                &[reg::MODE1, 0xA0][..],
            ]
        );
    }
}
