// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod clock;
pub mod link;
pub mod pins;
pub mod usart;

pub use clock::Millis;
pub use link::BridgeDelay;
pub use pins::BoardPins;
pub use usart::Usart;
