// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line-following car firmware for an STM32F767ZI board.
//!
//! Bus layout:
//!
//! - I2C1: PCA9685 motor PWM (0x5F) and PCF8574 track sensor (0x25)
//! - SPI1: WS2812 strip on MOSI
//! - USART2: command link
//! - USART3: debug log

#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_halt as _;

use hal::{
    i2c::{BlockingI2c, Mode as I2cMode},
    pac,
    prelude::*,
    serial::{Config, Serial},
    spi::{Mode, Phase, Polarity, Spi},
};
use stm32f7xx_hal as hal;

use linecar::control::MotorPolarity;
use linecar::drivers::{ws2812, CarDrive, Pca9685, Pcf8574, Ws2812};
use linecar::protocol::MailboxTransport;
use linecar::{LineFollower, LoopConfig};

mod hw;
use hw::{clock, link, usart, BoardPins, BridgeDelay, Millis, Usart};

#[cfg(feature = "inverted-drive")]
const POLARITY: MotorPolarity = MotorPolarity::Inverted;
#[cfg(not(feature = "inverted-drive"))]
const POLARITY: MotorPolarity = MotorPolarity::Normal;

fn serial_config() -> Config {
    Config {
        baud_rate: 115_200.bps(),
        ..Default::default()
    }
}

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    // Clocks. 80 MHz on APB2 divides down to the 2.5 MHz WS2812 SPI clock.
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(80.MHz()).freeze();
    let mut apb1 = rcc.apb1;
    let mut apb2 = rcc.apb2;

    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);

    // USART3 (DBG)
    let console = Serial::new(
        dp.USART3,
        (pins.usart3.tx, pins.usart3.rx),
        &clocks,
        serial_config(),
    );
    usart::init_logger(Usart::new(console), log::LevelFilter::Info);
    log::info!("linecar firmware starting");

    clock::init(cp.SYST, &clocks);
    let clock = Millis;

    // USART2, command link. Outbound traffic is written during the tick wait.
    let link_serial = Serial::new(
        dp.USART2,
        (pins.usart2.tx, pins.usart2.rx),
        &clocks,
        serial_config(),
    );
    let mut delay = BridgeDelay::new(clock, link::init(link_serial));

    // I2C1, shared by the motor and track boards
    let i2c = BlockingI2c::i2c1(
        dp.I2C1,
        (pins.i2c1.scl, pins.i2c1.sda),
        I2cMode::fast(400.kHz()),
        &clocks,
        &mut apb1,
        10_000,
    );
    let i2c_bus = shared_bus::BusManagerSimple::new(i2c);

    let mut drive = CarDrive::new(Pca9685::new(i2c_bus.acquire_i2c()));
    if let Err(e) = drive.init(&mut delay) {
        log::error!("motor board init failed: {:?}", e);
    }

    let mut track = Pcf8574::new(i2c_bus.acquire_i2c());
    if let Err(e) = track.init() {
        log::error!("track sensor init failed: {:?}", e);
    }

    // SPI1, WS2812 strip
    let spi_mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnFirstTransition,
    };
    let spi1 = Spi::new(dp.SPI1, (pins.spi1.sck, pins.spi1.miso, pins.spi1.mosi)).enable::<u8>(
        spi_mode,
        ws2812::SPI_FREQ_HZ.Hz(),
        &clocks,
        &mut apb2,
    );
    let leds: Ws2812<_> = Ws2812::new(spi1);

    let config = LoopConfig::default().with_polarity(POLARITY);
    let transport = MailboxTransport::new(&link::TO_CONTROL, &link::TO_BRIDGE);
    let mut car = LineFollower::new(config, transport, track, drive, leds);

    car.run(&clock, &mut delay)
}
