//! Mutable state of the control loop.

/// Everything the loop remembers between ticks.
///
/// Owned by [`ControlLoop`](crate::ControlLoop) and handed to the controller by `&mut` each
/// tick. Nothing survives a power cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    /// Latest sample in °C
    pub temperature: f32,
    /// `temperature - setpoint_low`
    pub error: f32,
    /// Accumulated error above the high setpoint. Never above the integrator ceiling.
    pub integrator: f32,
    /// Error snapshot taken at the last slow update
    pub derivator: f32,
    /// Fast ticks since the last slow update
    pub tick_counter: u8,
    /// Last duty written to the fan
    pub duty_cycle: u8,
}

impl ControlState {
    /// Initial state.
    ///
    /// The tick counter starts full so the very first tick also runs a slow update.
    pub const fn new(slow_update_period: u8) -> Self {
        Self {
            temperature: 0.0,
            error: 0.0,
            integrator: 0.0,
            derivator: 0.0,
            tick_counter: slow_update_period,
            duty_cycle: 0,
        }
    }
}
