// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Four DC motors behind H-bridges whose inputs are PCA9685 outputs.
//!
//! Each motor has two inputs. A positive speed drives IN1 with the speed as pulse width and holds
//! IN2 low; a negative speed does the opposite.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};

use crate::control::{WheelSpeeds, WHEEL_SPEED_LIMIT};
use crate::drivers::pca9685::{self, Pca9685};
use crate::traits::DriveTrain;

/// PWM frequency for the motor bridges.
pub const MOTOR_PWM_HZ: f32 = 100.0;

/// PCA9685 outputs of one motor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MotorChannels {
    pub in1: u8,
    pub in2: u8,
}

/// Channel map of the stock car, in [`WheelSpeeds::as_array`] order.
pub const MOTOR_CHANNELS: [MotorChannels; 4] = [
    // M1 front left
    MotorChannels { in1: 15, in2: 14 },
    // M2 back left
    MotorChannels { in1: 9, in2: 8 },
    // M3 front right
    MotorChannels { in1: 12, in2: 13 },
    // M4 back right
    MotorChannels { in1: 10, in2: 11 },
];

/// Pulse widths for (IN1, IN2) at `speed`.
pub fn bridge_duty(speed: i16) -> (u16, u16) {
    let speed = speed.clamp(-WHEEL_SPEED_LIMIT, WHEEL_SPEED_LIMIT);
    if speed >= 0 {
        (speed as u16, 0)
    } else {
        (0, speed.unsigned_abs())
    }
}

pub struct CarDrive<I2C> {
    pwm: Pca9685<I2C>,
}

impl<I2C, E> CarDrive<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    pub fn new(pwm: Pca9685<I2C>) -> Self {
        Self { pwm }
    }

    /// Reset the PWM chip, set the motor frequency and stop every wheel.
    pub fn init<D: DelayMs<u8>>(&mut self, delay: &mut D) -> Result<(), pca9685::Error<E>> {
        self.pwm.init()?;
        self.pwm.set_frequency(MOTOR_PWM_HZ, delay)?;
        self.set_wheel_speeds(WheelSpeeds::STOP)
    }

    pub fn free(self) -> Pca9685<I2C> {
        self.pwm
    }
}

impl<I2C, E> DriveTrain for CarDrive<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: core::fmt::Debug,
{
    type Error = pca9685::Error<E>;

    fn set_wheel_speeds(&mut self, speeds: WheelSpeeds) -> Result<(), Self::Error> {
        for (motor, speed) in MOTOR_CHANNELS.iter().zip(speeds.as_array()) {
            let (in1, in2) = bridge_duty(speed);
            self.pwm.set_pulse_width(motor.in1, in1)?;
            self.pwm.set_pulse_width(motor.in2, in2)?;
        }
        Ok(())
    }
}
