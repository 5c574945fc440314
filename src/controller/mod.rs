//! Controller to turn a temperature into a fan correction.

use crate::state::ControlState;

pub mod pid;

pub trait Controller {
    /// Run the controller for a single fast tick
    ///
    /// Updates `state` and returns the raw correction. Larger means more cooling; the actuator
    /// decides how that maps onto a duty cycle.
    fn run(&self, state: &mut ControlState, temperature: f32) -> f32;
}
