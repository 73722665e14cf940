// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line-following control loop.
//!
//! Each tick:
//!
//! 1. Handle at most one pending command.
//! 2. In [`DriveState::Running`]: read the sensors, estimate the line position, run the PID, mix
//!    the correction into four wheel speeds and apply them.
//! 3. In [`DriveState::Stopped`]: hold the wheels at zero.
//! 4. In both of those states, mirror the sensor bits onto the LED strip.
//!
//! A failed sensor read marks the tick as stale. The last good reading is shown on the LEDs and
//! the previous correction is applied again without advancing the PID.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::LoopConfig;
use crate::control::{
    CarContext, DriveMixer, DriveState, Pid, PositionEstimator, RuntimeParameters, SensorReading,
    WheelSpeeds,
};
use crate::protocol::{ChannelStats, Command, CommandChannel};
use crate::traits::{Clock, DriveTrain, LedStrip, LineSensor, Transport};

/// Summary of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub state: DriveState,
    /// Command applied at the start of the tick.
    pub command: Option<Command>,
    /// Reading used this tick. Repeats the last good reading when `stale`.
    pub reading: SensorReading,
    pub position: f32,
    pub correction: i32,
    /// Speeds sent to the drivetrain. `None` while idle.
    pub speeds: Option<WheelSpeeds>,
    pub stale: bool,
}

pub struct LineFollower<T, S, D, L>
where
    T: Transport,
    S: LineSensor,
    D: DriveTrain,
    L: LedStrip,
{
    config: LoopConfig,
    ctx: CarContext,
    channel: CommandChannel<T>,
    estimator: PositionEstimator,
    pid: Pid,
    mixer: DriveMixer,

    sensor: S,
    drive: D,
    leds: L,

    prev_state: DriveState,
    last_reading: SensorReading,
    last_position: f32,
    last_correction: i32,
}

impl<T, S, D, L> LineFollower<T, S, D, L>
where
    T: Transport,
    S: LineSensor,
    D: DriveTrain,
    L: LedStrip,
{
    pub fn new(config: LoopConfig, transport: T, sensor: S, drive: D, leds: L) -> Self {
        Self {
            config,
            ctx: CarContext::default(),
            channel: CommandChannel::new(transport),
            estimator: PositionEstimator::new(config.sensor_count),
            pid: Pid::new(),
            mixer: DriveMixer::new(config.polarity),
            sensor,
            drive,
            leds,
            prev_state: DriveState::Idle,
            last_reading: SensorReading::default(),
            last_position: 0.0,
            last_correction: 0,
        }
    }

    /// Start from `params` instead of the compiled-in defaults.
    pub fn with_params(mut self, params: RuntimeParameters) -> Self {
        self.ctx.params = params;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn context(&self) -> &CarContext {
        &self.ctx
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn channel_stats(&self) -> ChannelStats {
        self.channel.stats()
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn drive(&self) -> &D {
        &self.drive
    }

    pub fn leds(&self) -> &L {
        &self.leds
    }

    /// Run one control cycle at time `now_ms`.
    pub fn tick(&mut self, now_ms: u32) -> TickReport {
        let command = self.channel.poll(&mut self.ctx);
        let state = self.ctx.state();

        if state != self.prev_state {
            log::info!("{:?} -> {:?}", self.prev_state, state);
            if state == DriveState::Running {
                self.pid.reset(now_ms);
                self.last_correction = 0;
            }
            self.prev_state = state;
        }

        let mut report = TickReport {
            state,
            command,
            reading: self.last_reading,
            position: self.last_position,
            correction: self.last_correction,
            speeds: None,
            stale: false,
        };

        if state == DriveState::Idle {
            return report;
        }

        let fresh = self.read_sensors();
        report.stale = fresh.is_none();
        report.reading = self.last_reading;

        let speeds = match state {
            DriveState::Running => {
                if let Some(reading) = fresh {
                    let position = self.estimator.estimate(reading, self.pid.last_error());
                    self.last_position = position;
                    self.last_correction = self.pid.update(-position, now_ms, &self.ctx.params);
                }
                report.position = self.last_position;
                report.correction = self.last_correction;
                self.mixer.mix(self.ctx.params.base_speed, self.last_correction)
            }
            _ => WheelSpeeds::STOP,
        };

        if let Err(e) = self.drive.set_wheel_speeds(speeds) {
            log::warn!("motor update failed: {:?}", e);
        }
        report.speeds = Some(speeds);

        self.mirror_sensors();
        log::trace!("{:?}", report);
        report
    }

    /// Tick forever at the configured period.
    pub fn run<C, W>(&mut self, clock: &C, delay: &mut W) -> !
    where
        C: Clock,
        W: DelayMs<u32>,
    {
        log::info!("control loop running, tick {} ms", self.config.tick_ms);
        loop {
            let start = clock.now_ms();
            self.tick(start);
            delay.delay_ms(remaining_ms(self.config.tick_ms, start, clock.now_ms()));
        }
    }

    fn read_sensors(&mut self) -> Option<SensorReading> {
        match self.sensor.read() {
            Ok(reading) => {
                let reading = reading.masked(self.estimator.sensor_count());
                self.last_reading = reading;
                Some(reading)
            }
            Err(e) => {
                log::warn!("sensor read failed: {:?}", e);
                None
            }
        }
    }

    fn mirror_sensors(&mut self) {
        let count = (self.estimator.sensor_count() as usize).min(self.leds.len());
        for i in 0..count {
            let color = if self.last_reading.is_active(i as u8) {
                self.config.led_on
            } else {
                self.config.led_off
            };
            self.leds.set_pixel(i, color);
        }
        if let Err(e) = self.leds.push_frame() {
            log::debug!("led update failed: {:?}", e);
        }
    }
}

/// Time left in a tick of `tick_ms` that started at `start_ms`.
pub fn remaining_ms(tick_ms: u32, start_ms: u32, now_ms: u32) -> u32 {
    tick_ms.saturating_sub(now_ms.wrapping_sub(start_ms))
}
