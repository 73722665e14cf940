// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! WS2812 addressable LED strip driven from an SPI data line.
//!
//! Every colour bit becomes three SPI bits: `110` for a one and `100` for a zero, sent MSB first in
//! G, R, B order. At 2.5 Mbit/s that gives the 1.2 µs bit period the LEDs expect. A zero byte before
//! and after the frame holds the line low long enough to latch.

use embedded_hal::blocking::spi::Write;

use crate::traits::LedStrip;

/// LEDs on the stock car.
pub const DEFAULT_LED_COUNT: usize = 12;

/// SPI clock that yields the WS2812 bit timing.
pub const SPI_FREQ_HZ: u32 = 2_500_000;

/// Encoded bytes per LED: 24 colour bits × 3 SPI bits.
pub const BYTES_PER_LED: usize = 9;

const BLANKING: [u8; 1] = [0x00];

/// Pixel colour in wire order.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Grb {
    pub g: u8,
    pub r: u8,
    pub b: u8,
}

impl Grb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(g: u8, r: u8, b: u8) -> Self {
        Self { g, r, b }
    }

    #[inline]
    fn bits(self) -> u32 {
        (self.g as u32) << 16 | (self.r as u32) << 8 | self.b as u32
    }
}

/// Expand one pixel into its SPI bit stream.
pub fn encode_pixel(color: Grb) -> [u8; BYTES_PER_LED] {
    let color = color.bits();
    let mut out = [0u8; BYTES_PER_LED];
    let mut bit = 0usize;

    for i in (0..24).rev() {
        let pattern: u8 = if (color >> i) & 1 == 1 { 0b110 } else { 0b100 };
        for j in (0..3).rev() {
            if (pattern >> j) & 1 == 1 {
                out[bit / 8] |= 0x80 >> (bit % 8);
            }
            bit += 1;
        }
    }
    out
}

/// Strip of `N` LEDs on an SPI bus. Only MOSI needs to be wired.
pub struct Ws2812<SPI, const N: usize = DEFAULT_LED_COUNT> {
    spi: SPI,
    pixels: [Grb; N],
}

impl<SPI, E, const N: usize> Ws2812<SPI, N>
where
    SPI: Write<u8, Error = E>,
{
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            pixels: [Grb::BLACK; N],
        }
    }

    pub fn free(self) -> SPI {
        self.spi
    }

    pub fn pixels(&self) -> &[Grb; N] {
        &self.pixels
    }

    pub fn fill(&mut self, color: Grb) {
        self.pixels = [color; N];
    }

    /// Encode and send the frame buffer, framed by blanking bytes.
    pub fn show(&mut self) -> Result<(), E> {
        self.spi.write(&BLANKING)?;
        for pixel in self.pixels.iter() {
            self.spi.write(&encode_pixel(*pixel))?;
        }
        self.spi.write(&BLANKING)
    }
}

impl<SPI, E, const N: usize> LedStrip for Ws2812<SPI, N>
where
    SPI: Write<u8, Error = E>,
    E: core::fmt::Debug,
{
    type Error = E;

    fn len(&self) -> usize {
        N
    }

    fn set_pixel(&mut self, index: usize, color: Grb) {
        if let Some(p) = self.pixels.get_mut(index) {
            *p = color;
        }
    }

    fn push_frame(&mut self) -> Result<(), E> {
        self.show()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    #[derive(Default)]
    struct SpiLog {
        bytes: Vec<u8>,
    }

    impl Write<u8> for SpiLog {
        type Error = Infallible;

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            self.bytes.extend_from_slice(words);
            Ok(())
        }
    }

    #[test]
    fn zero_bits_encode_as_100() {
        let black = encode_pixel(Grb::BLACK);
        assert_eq!(black, [0x92, 0x49, 0x24, 0x92, 0x49, 0x24, 0x92, 0x49, 0x24]);
    }

    #[test]
    fn one_bits_encode_as_110() {
        let white = encode_pixel(Grb::new(0xFF, 0xFF, 0xFF));
        assert_eq!(white, [0xDB, 0x6D, 0xB6, 0xDB, 0x6D, 0xB6, 0xDB, 0x6D, 0xB6]);
    }

    #[test]
    fn green_is_sent_first() {
        let green = encode_pixel(Grb::new(0xFF, 0, 0));
        assert_eq!(&green[..3], &[0xDB, 0x6D, 0xB6]);
        assert_eq!(&green[3..], &encode_pixel(Grb::BLACK)[3..]);
    }

    #[test]
    fn frame_is_blanked_on_both_ends() {
        let mut strip: Ws2812<_, 2> = Ws2812::new(SpiLog::default());
        strip.set_pixel(1, Grb::new(0x55, 0, 0));
        strip.set_pixel(5, Grb::new(1, 2, 3));
        strip.push_frame().unwrap();

        let bytes = strip.free().bytes;
        assert_eq!(bytes.len(), 2 + 2 * BYTES_PER_LED);
        assert_eq!(bytes[0], 0x00);
        assert_eq!(*bytes.last().unwrap(), 0x00);
        assert_eq!(&bytes[1..10], &encode_pixel(Grb::BLACK));
        assert_eq!(&bytes[10..19], &encode_pixel(Grb::new(0x55, 0, 0)));
    }

    #[test]
    fn fill_sets_every_pixel() {
        let mut strip: Ws2812<_> = Ws2812::new(SpiLog::default());
        strip.fill(Grb::new(1, 1, 1));
        assert_eq!(strip.len(), DEFAULT_LED_COUNT);
        assert!(strip.pixels().iter().all(|p| *p == Grb::new(1, 1, 1)));
    }
}
