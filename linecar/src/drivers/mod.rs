// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers written against the `embedded-hal` bus traits, so
//! they run on the board and against in-memory buses in tests.
//!
//! ## Existing drivers
//!
//! - [`pca9685`] – NXP PCA9685 16-channel PWM controller (I2C)
//! - [`car_drive`] – four H-bridge motors driven from the PCA9685
//! - [`pcf8574`] – PCF8574 I/O expander reading the line sensors (I2C)
//! - [`ws2812`] – WS2812 LED strip bit-banged over SPI MOSI

pub mod pca9685;

pub mod car_drive;
pub mod pcf8574;
pub mod ws2812;

pub use car_drive::CarDrive;
pub use pca9685::Pca9685;
pub use pcf8574::Pcf8574;
pub use ws2812::{Grb, Ws2812};
