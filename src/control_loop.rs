//! Fan control loop: sample, compute, actuate, forever.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::{
    actuator::Actuator,
    config::FaultPolicy,
    controller::Controller,
    fan::PwmOutput,
    sampler::{self, Sampler},
    state::ControlState,
    thermometer::Thermometer,
};

pub struct ControlLoop<S, D, C, P> {
    sampler: Sampler<S, D>,
    controller: C,
    actuator: Actuator<P>,
    state: ControlState,
    fault_policy: FaultPolicy,
}

impl<S, D, C, P> ControlLoop<S, D, C, P>
where
    S: Thermometer,
    D: DelayMs<u32> + DelayUs<u32>,
    C: Controller,
    P: PwmOutput,
{
    pub const fn new(
        sampler: Sampler<S, D>,
        controller: C,
        actuator: Actuator<P>,
        state: ControlState,
        fault_policy: FaultPolicy,
    ) -> Self {
        Self {
            sampler,
            controller,
            actuator,
            state,
            fault_policy,
        }
    }

    pub const fn state(&self) -> &ControlState {
        &self.state
    }

    pub const fn sampler(&self) -> &Sampler<S, D> {
        &self.sampler
    }

    pub const fn actuator(&self) -> &Actuator<P> {
        &self.actuator
    }

    /// Run a single iteration and return the duty written.
    ///
    /// Blocks for the sampler's settle time.
    #[cfg_attr(feature = "sizing", inline(never))]
    pub fn step(&mut self) -> Result<u8, P::Error> {
        let temp = self.sampler.sample();

        if self.fault_policy == FaultPolicy::FanOff && sampler::is_fault(temp) {
            warn!("Sensor fault ({=f32}), fan off", temp);
            self.state.duty_cycle = self.actuator.off()?;
            return Ok(self.state.duty_cycle);
        }

        let output = self.controller.run(&mut self.state, temp);
        self.state.duty_cycle = self.actuator.actuate(output)?;

        debug!(
            "Temperature: {=f32}, Output: {=f32}, Duty: {=u8}",
            temp,
            output,
            self.state.duty_cycle
        );

        Ok(self.state.duty_cycle)
    }

    /// Run a single iteration, logging a failed PWM write instead of returning it.
    ///
    /// On failure the state keeps the last duty that was written successfully.
    pub fn tick(&mut self) -> Option<u8> {
        match self.step() {
            Ok(duty) => Some(duty),
            Err(e) => {
                error!("Failed to write fan duty: {}", e);
                None
            }
        }
    }

    /// Run the loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
        }
    }
}
