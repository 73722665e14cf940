// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interfaces between the control loop and the hardware around it.
//!
//! Device drivers in [`crate::drivers`] implement these for the stock car; tests substitute
//! in-memory fakes.

use core::fmt::Debug;

use crate::control::{SensorReading, WheelSpeeds};
use crate::drivers::ws2812::Grb;
use crate::protocol::IpcMessage;

/// Line sensor array polled once per tick.
pub trait LineSensor {
    type Error: Debug;

    /// Take one snapshot of the sensor array. No debouncing or filtering.
    fn read(&mut self) -> Result<SensorReading, Self::Error>;
}

/// Four-wheel drivetrain.
pub trait DriveTrain {
    type Error: Debug;

    /// Apply four signed speed commands in the range ±4000.
    fn set_wheel_speeds(&mut self, speeds: WheelSpeeds) -> Result<(), Self::Error>;
}

/// Addressable LED strip with a frame buffer.
pub trait LedStrip {
    type Error: Debug;

    /// Number of pixels on the strip.
    fn len(&self) -> usize;

    /// Set one pixel in the frame buffer. Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: usize, color: Grb);

    /// Send the frame buffer to the strip.
    fn push_frame(&mut self) -> Result<(), Self::Error>;
}

/// Free-running millisecond counter.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Message link to the other core. At most one message in flight per direction unless the
/// implementation queues.
pub trait Transport {
    type Error: Debug;

    fn is_message_available(&self) -> bool;

    /// Take the next inbound message, or `WouldBlock` if none is pending.
    fn receive(&mut self) -> nb::Result<IpcMessage, Self::Error>;

    /// Hand a message to the other core, or `WouldBlock` if it is still busy.
    fn send(&mut self, msg: IpcMessage) -> nb::Result<(), Self::Error>;
}
