// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PID steering controller for line following.
//!
//! Works in `no_std` and does not allocate memory. Gains come from [`RuntimeParameters`] on every
//! call so that live tuning takes effect on the next tick.

use crate::control::RuntimeParameters;

/// Smallest time step used for the I and D terms (seconds).
pub const MIN_DT_S: f32 = 0.001;

/// Default integral anti-windup clamp.
pub const INTEGRAL_LIMIT: f32 = 100.0;

/// State carried between controller updates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ControllerState {
    /// Error seen on the previous update
    pub last_error: f32,
    /// Integrator state
    pub integral: f32,
    /// Clock reading of the previous update
    pub last_timestamp_ms: u32,
}

/// PID controller producing a bounded integer steering correction.
pub struct Pid {
    state: ControllerState,

    /// Integral anti-windup clamp
    int_min: f32,
    int_max: f32,

    /// No derivative history yet
    first_update: bool,
}

impl Pid {
    /// Create a controller with zeroed state.
    pub fn new() -> Self {
        Self {
            state: ControllerState::default(),
            int_min: -INTEGRAL_LIMIT,
            int_max: INTEGRAL_LIMIT,
            first_update: true,
        }
    }

    /// Set integral limits for anti-windup.
    pub fn with_integral_limits(mut self, min: f32, max: f32) -> Self {
        self.int_min = min;
        self.int_max = max;
        self
    }

    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[inline]
    pub fn last_error(&self) -> f32 {
        self.state.last_error
    }

    /// Reset integrator + derivative history and restart timing from `now_ms`.
    pub fn reset(&mut self, now_ms: u32) {
        self.state = ControllerState {
            last_error: 0.0,
            integral: 0.0,
            last_timestamp_ms: now_ms,
        };
        self.first_update = true;
    }

    /// Update the controller.
    ///
    /// `error` — target minus measurement, i.e. the negated line position
    /// `now_ms` — current millisecond clock reading
    ///
    /// Returns the correction truncated toward zero, within `±params.max_correction`.
    pub fn update(&mut self, error: f32, now_ms: u32, params: &RuntimeParameters) -> i32 {
        let elapsed_ms = now_ms.wrapping_sub(self.state.last_timestamp_ms);
        let mut dt = elapsed_ms as f32 / 1000.0;
        if dt < MIN_DT_S {
            dt = MIN_DT_S;
        }

        // ----- P term -----
        let p = params.kp * error;

        // ----- I term -----
        self.state.integral = (self.state.integral + error * dt).clamp(self.int_min, self.int_max);
        let i = params.ki * self.state.integral;

        // ----- D term (skipped until there is a previous error) -----
        let d = if self.first_update {
            self.first_update = false;
            0.0
        } else {
            params.kd * (error - self.state.last_error) / dt
        };

        // ----- Output clamp -----
        let limit = params.max_correction as f32;
        let out = (p + i + d).clamp(-limit, limit);

        self.state.last_error = error;
        self.state.last_timestamp_ms = now_ms;

        out as i32
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}
