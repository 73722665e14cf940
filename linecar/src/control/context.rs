// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared car state: runtime parameters and enable flags.
//!
//! Owned by the [`LineFollower`](crate::control::LineFollower) and lent to the command channel at
//! the top of every tick, so the loop always reads a fully applied update.

use crate::control::RuntimeParameters;

/// Operating state derived from the enable flags.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DriveState {
    /// Waiting for the first start command. Nothing is actuated.
    Idle,
    /// Following the line.
    Running,
    /// Started before, motors currently held at zero.
    Stopped,
}

/// Start/stop flags.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EnableFlags {
    /// One-shot latch set by the first start command, never cleared.
    pub car_started: bool,
    /// Whether the loop drives the motors.
    pub motors_enabled: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CarContext {
    pub params: RuntimeParameters,
    pub flags: EnableFlags,
}

impl CarContext {
    pub fn new(params: RuntimeParameters) -> Self {
        Self {
            params,
            flags: EnableFlags::default(),
        }
    }

    pub fn state(&self) -> DriveState {
        match (self.flags.car_started, self.flags.motors_enabled) {
            (false, _) => DriveState::Idle,
            (true, true) => DriveState::Running,
            (true, false) => DriveState::Stopped,
        }
    }

    /// Latch the start flag and enable the motors.
    pub fn start(&mut self) {
        self.flags.car_started = true;
        self.flags.motors_enabled = true;
    }

    /// Disable the motors. Has no effect before the car was started.
    pub fn stop(&mut self) {
        self.flags.motors_enabled = false;
    }
}
