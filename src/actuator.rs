//! Maps controller output onto the fan.

use num_traits::float::FloatCore;

use crate::{config::ActuatorConfig, fan::PwmOutput};

/// Duty cycle for a controller output.
///
/// Below `low_threshold` the fan is off, above `high_threshold` it is at `max_duty`. The band in
/// between is closed on both ends and truncated towards zero. A NaN output turns the fan off.
pub fn duty_for(output: f32, config: &ActuatorConfig) -> u8 {
    if output < config.low_threshold {
        0
    } else if output > config.high_threshold {
        config.max_duty
    } else {
        // `as` saturates, so NaN lands on 0 and anything in the band is already <= max_duty
        (FloatCore::floor(output) as u8).min(config.max_duty)
    }
}

pub struct Actuator<P> {
    output: P,
    config: ActuatorConfig,
}

impl<P: PwmOutput> Actuator<P> {
    pub const fn new(output: P, config: ActuatorConfig) -> Self {
        Self { output, config }
    }

    /// Configure the PWM output with the duty ceiling and an initial duty.
    pub fn configure(&mut self, initial_duty: u8) -> Result<(), P::Error> {
        self.output.configure(self.config.max_duty, initial_duty)
    }

    /// Write the duty for `output` and return it.
    pub fn actuate(&mut self, output: f32) -> Result<u8, P::Error> {
        let duty = duty_for(output, &self.config);
        self.output.set_duty(duty)?;
        Ok(duty)
    }

    /// Turn the fan off regardless of controller output.
    pub fn off(&mut self) -> Result<u8, P::Error> {
        self.output.set_duty(0)?;
        Ok(0)
    }

    pub const fn output(&self) -> &P {
        &self.output
    }
}
