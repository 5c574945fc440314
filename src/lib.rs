//! Temperature regulated PWM fan controller.
//!
//! A DS18B20 on a 1-Wire bus is sampled once per second, a PID controller with a slow
//! integral/derivative cadence turns the reading into a correction, and the correction is
//! clamped into a duty cycle for a PWM fan output.
//!
//! Everything in this crate is hardware agnostic and runs on the host for testing. The
//! STM32F042 firmware lives in `src/main.rs` behind the `firmware` feature.
#![cfg_attr(not(test), no_std)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

pub mod actuator;
pub mod config;
pub mod control_loop;
pub mod controller;
pub mod ds18b20;
pub mod fan;
pub mod onewire;
pub mod sampler;
pub mod state;
pub mod thermometer;

pub use self::{
    actuator::Actuator,
    config::{Config, FaultPolicy},
    control_loop::ControlLoop,
    controller::{pid::PidController, Controller},
    fan::{PwmFan, PwmOutput},
    sampler::Sampler,
    state::ControlState,
    thermometer::Thermometer,
};
