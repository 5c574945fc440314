//! Mock collaborators for driving the control loop on the host.
//!
//! The sensor replays a script of readings and the tick does not block. The fan records every
//! duty it is given.

#![allow(dead_code)]

use core::convert::Infallible;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use rtic_fan::{
    config::Config, Actuator, ControlLoop, PidController, PwmOutput, Sampler, Thermometer,
};

/// Replays readings in order, repeating the last one once the script runs out.
pub struct ScriptedSensor {
    readings: Vec<Option<f32>>,
    next: usize,
    pub conversions: usize,
}

impl ScriptedSensor {
    /// `None` entries make the read fail.
    pub fn new(readings: Vec<Option<f32>>) -> Self {
        assert!(!readings.is_empty());
        Self {
            readings,
            next: 0,
            conversions: 0,
        }
    }

    pub fn constant(temp: f32) -> Self {
        Self::new(vec![Some(temp)])
    }

    pub fn from_temps(temps: &[f32]) -> Self {
        Self::new(temps.iter().copied().map(Some).collect())
    }
}

impl Thermometer for ScriptedSensor {
    type Error = ();

    fn request_conversion<D: DelayUs<u32>>(&mut self, _delay: &mut D) -> Result<(), ()> {
        self.conversions += 1;
        Ok(())
    }

    fn read_celsius<D: DelayUs<u32>>(&mut self, _index: usize, _delay: &mut D) -> Result<f32, ()> {
        let reading = self.readings[self.next.min(self.readings.len() - 1)];
        self.next += 1;
        reading.ok_or(())
    }
}

/// Tick that returns immediately.
#[derive(Default)]
pub struct NoDelay;

impl DelayMs<u32> for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

impl DelayUs<u32> for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

#[derive(Default)]
pub struct RecordingFan {
    pub ceiling: Option<u8>,
    pub duties: Vec<u8>,
}

impl RecordingFan {
    pub fn last(&self) -> Option<u8> {
        self.duties.last().copied()
    }
}

impl PwmOutput for RecordingFan {
    type Error = Infallible;

    fn configure(&mut self, ceiling: u8, initial: u8) -> Result<(), Infallible> {
        self.ceiling = Some(ceiling);
        self.duties.push(initial);
        Ok(())
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), Infallible> {
        self.duties.push(duty);
        Ok(())
    }
}

pub type TestLoop = ControlLoop<ScriptedSensor, NoDelay, PidController, RecordingFan>;

pub fn fan_loop(sensor: ScriptedSensor, config: &Config) -> TestLoop {
    let sampler = Sampler::new(sensor, NoDelay, config.sampler);
    let pid = PidController::new(config.pid);
    let mut actuator = Actuator::new(RecordingFan::default(), config.actuator);
    actuator
        .configure(config.pwm.initial_duty)
        .unwrap_or_else(|e| match e {});

    ControlLoop::new(
        sampler,
        pid,
        actuator,
        pid.initial_state(),
        config.fault_policy,
    )
}

/// Run `ticks` iterations and return the duty of each.
pub fn run(fan_loop: &mut TestLoop, ticks: usize) -> Vec<u8> {
    (0..ticks)
        .map(|_| match fan_loop.step() {
            Ok(duty) => duty,
            Err(e) => match e {},
        })
        .collect()
}
