// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! This module provides the building blocks of the line-following loop.
//!
//! ## Modules
//!
//! - [`position`] - Sensor bitmask to line offset.
//! - [`pid`] - PID controller producing the steering correction.
//! - [`mixer`] - Base speed and correction to four wheel speeds.
//! - [`params`] - Runtime-tunable gains and speeds.
//! - [`context`] - Enable flags and parameters shared with the command channel.
//! - [`line_follower`] - The control loop tying it all together.

pub mod context;
pub mod line_follower;
pub mod mixer;
pub mod params;
pub mod pid;
pub mod position;

pub use context::{CarContext, DriveState, EnableFlags};
pub use line_follower::{LineFollower, TickReport};
pub use mixer::{DriveMixer, MotorPolarity, WheelSpeeds, WHEEL_SPEED_LIMIT};
pub use params::{RuntimeParameters, TuneParam};
pub use pid::{ControllerState, Pid};
pub use position::{PositionEstimator, SensorReading};
