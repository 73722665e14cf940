// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line position estimation from the reflective sensor array.
//!
//! Each sensor is assigned a fixed weight on a symmetric scale from [`POSITION_MIN`] to
//! [`POSITION_MAX`]. The position is the mean weight of all sensors that currently see the line.

/// Leftmost line position (sensor 0 only).
pub const POSITION_MIN: f32 = -3000.0;
/// Rightmost line position (last sensor only).
pub const POSITION_MAX: f32 = 3000.0;

/// Number of sensors on the stock tracking module.
pub const DEFAULT_SENSOR_COUNT: u8 = 7;

/// Raw snapshot of the sensor array. Bit `i` set means sensor `i` sees the line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SensorReading(pub u8);

impl SensorReading {
    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether sensor `index` sees the line.
    #[inline]
    pub fn is_active(&self, index: u8) -> bool {
        index < 8 && (self.0 >> index) & 1 != 0
    }

    /// Number of sensors that see the line.
    #[inline]
    pub fn active_count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Drop bits above the first `sensor_count` sensors.
    #[inline]
    pub fn masked(self, sensor_count: u8) -> Self {
        if sensor_count >= 8 {
            self
        } else {
            Self(self.0 & ((1u8 << sensor_count) - 1))
        }
    }
}

/// Maps a [`SensorReading`] to a signed line offset.
#[derive(Copy, Clone, Debug)]
pub struct PositionEstimator {
    sensor_count: u8,
    step: f32,
}

impl PositionEstimator {
    /// Create an estimator for `sensor_count` sensors (clamped to 2..=8).
    pub fn new(sensor_count: u8) -> Self {
        let sensor_count = sensor_count.clamp(2, 8);
        let step = (POSITION_MAX - POSITION_MIN) / (sensor_count - 1) as f32;
        Self { sensor_count, step }
    }

    #[inline]
    pub fn sensor_count(&self) -> u8 {
        self.sensor_count
    }

    /// Weight of sensor `index`: `(index - center) * step`.
    #[inline]
    pub fn weight(&self, index: u8) -> f32 {
        POSITION_MIN + index as f32 * self.step
    }

    /// Estimate the line position.
    ///
    /// `last_error` is the previous controller error. When no sensor sees the line the estimate
    /// saturates on the side the car was last departing towards: [`POSITION_MIN`] if the last
    /// error was negative, [`POSITION_MAX`] otherwise.
    pub fn estimate(&self, reading: SensorReading, last_error: f32) -> f32 {
        let reading = reading.masked(self.sensor_count);

        let mut sum = 0.0;
        let mut active = 0u32;
        for i in 0..self.sensor_count {
            if reading.is_active(i) {
                sum += self.weight(i);
                active += 1;
            }
        }

        if active == 0 {
            return if last_error < 0.0 {
                POSITION_MIN
            } else {
                POSITION_MAX
            };
        }

        (sum / active as f32).clamp(POSITION_MIN, POSITION_MAX)
    }
}

impl Default for PositionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_COUNT)
    }
}
