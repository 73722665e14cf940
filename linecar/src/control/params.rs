// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Live-tunable runtime parameters.
//!
//! Parameters reset to the compiled-in defaults on power-up and are only changed through TUNE
//! commands on the command channel. Out-of-range values are clamped, never rejected.

use crate::control::mixer::WHEEL_SPEED_LIMIT;

/// Largest accepted PID gain.
pub const GAIN_LIMIT: f32 = 10_000.0;

/// Default forward speed (PCA9685 pulse width units).
pub const DEFAULT_BASE_SPEED: i16 = 1000;
/// Default bound on the steering correction.
pub const DEFAULT_MAX_CORRECTION: u16 = 1200;
pub const DEFAULT_KP: f32 = 0.4;
pub const DEFAULT_KD: f32 = 0.01;
pub const DEFAULT_KI: f32 = 0.0;

/// Index of a tunable parameter in a TUNE command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TuneParam {
    BaseSpeed = 0,
    MaxCorrection = 1,
    Kp = 2,
    Kd = 3,
    Ki = 4,
}

impl TuneParam {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::BaseSpeed),
            1 => Some(Self::MaxCorrection),
            2 => Some(Self::Kp),
            3 => Some(Self::Kd),
            4 => Some(Self::Ki),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Gains and speed settings read by the controller and mixer every tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RuntimeParameters {
    pub kp: f32,
    pub kd: f32,
    pub ki: f32,
    pub base_speed: i16,
    pub max_correction: u16,
}

impl RuntimeParameters {
    /// Apply one TUNE value, clamping it into the sane range for that parameter.
    ///
    /// Gains are transported as integers, so tuning precision is one unit.
    pub fn apply(&mut self, param: TuneParam, value: i16) {
        match param {
            TuneParam::BaseSpeed => {
                self.base_speed = value.clamp(-WHEEL_SPEED_LIMIT, WHEEL_SPEED_LIMIT);
            }
            TuneParam::MaxCorrection => {
                self.max_correction = value.clamp(0, WHEEL_SPEED_LIMIT) as u16;
            }
            TuneParam::Kp => self.kp = clamp_gain(value),
            TuneParam::Kd => self.kd = clamp_gain(value),
            TuneParam::Ki => self.ki = clamp_gain(value),
        }
    }

    pub fn with_gains(mut self, kp: f32, ki: f32, kd: f32) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    pub fn with_speed(mut self, base_speed: i16, max_correction: u16) -> Self {
        self.base_speed = base_speed;
        self.max_correction = max_correction;
        self
    }
}

impl Default for RuntimeParameters {
    fn default() -> Self {
        Self {
            kp: DEFAULT_KP,
            kd: DEFAULT_KD,
            ki: DEFAULT_KI,
            base_speed: DEFAULT_BASE_SPEED,
            max_correction: DEFAULT_MAX_CORRECTION,
        }
    }
}

#[inline]
fn clamp_gain(value: i16) -> f32 {
    (value as f32).clamp(0.0, GAIN_LIMIT)
}
