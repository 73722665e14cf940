// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Linecar
//!
//! Hardware-independent core of the line-following car firmware: the control loop, its command
//! protocol and the drivers for the car's peripheral chips. Board bring-up lives in the `firmware`
//! crate.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`control`] | Position estimate, PID, drive mixer and the control loop |
//! | [`protocol`] | Inter-core messages, link framing, mailbox and command handling |
//! | [`drivers`] | Device-level drivers (PCA9685, PCF8574, WS2812) |
//! | [`traits`] | Interfaces between the loop and the hardware |
//! | [`config`] | Compile-time loop configuration |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test -p linecar
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod drivers;
pub mod protocol;
pub mod traits;

pub use config::LoopConfig;
pub use control::{LineFollower, TickReport};
