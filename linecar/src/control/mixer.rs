// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Differential-drive mixing of base speed and steering correction.

/// Hardware-declared safe range for a single wheel command.
pub const WHEEL_SPEED_LIMIT: i16 = 4000;

/// Sign convention between mixed wheel speeds and the motor driver.
///
/// Depends on how the motors are wired to the H-bridge outputs. The default is
/// [`MotorPolarity::Normal`]: the left side receives `base + correction`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MotorPolarity {
    /// Mixed values are passed to the motor driver unchanged.
    #[default]
    Normal,
    /// All four mixed values are negated before reaching the motor driver.
    Inverted,
}

/// Signed speed command for each of the four wheels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct WheelSpeeds {
    pub front_left: i16,
    pub back_left: i16,
    pub front_right: i16,
    pub back_right: i16,
}

impl WheelSpeeds {
    pub const STOP: Self = Self::new(0, 0, 0, 0);

    pub const fn new(front_left: i16, back_left: i16, front_right: i16, back_right: i16) -> Self {
        Self {
            front_left,
            back_left,
            front_right,
            back_right,
        }
    }

    /// Both wheels on each side driven identically.
    pub const fn sides(left: i16, right: i16) -> Self {
        Self::new(left, left, right, right)
    }

    /// Wheel commands in motor order M1..M4.
    pub fn as_array(&self) -> [i16; 4] {
        [
            self.front_left,
            self.back_left,
            self.front_right,
            self.back_right,
        ]
    }
}

/// Maps base speed and correction to per-wheel commands.
#[derive(Copy, Clone, Debug, Default)]
pub struct DriveMixer {
    polarity: MotorPolarity,
}

impl DriveMixer {
    pub fn new(polarity: MotorPolarity) -> Self {
        Self { polarity }
    }

    #[inline]
    pub fn polarity(&self) -> MotorPolarity {
        self.polarity
    }

    /// Left side gets `base + correction`, right side `base - correction`, each clamped to
    /// ±[`WHEEL_SPEED_LIMIT`] and then adjusted for polarity.
    pub fn mix(&self, base_speed: i16, correction: i32) -> WheelSpeeds {
        let base = base_speed as i32;
        let limit = WHEEL_SPEED_LIMIT as i32;

        let mut left = base.saturating_add(correction).clamp(-limit, limit) as i16;
        let mut right = base.saturating_sub(correction).clamp(-limit, limit) as i16;

        if self.polarity == MotorPolarity::Inverted {
            left = -left;
            right = -right;
        }

        WheelSpeeds::sides(left, right)
    }
}
