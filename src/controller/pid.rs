use crate::{config::PidConfig, state::ControlState};

/// PID controller with a slow integral/derivative cadence.
///
/// Proportional action is computed every tick against `setpoint_low`. The integrator and the
/// derivative snapshot are only refreshed once the tick counter exceeds `slow_update_period`,
/// and the integrator only winds up above `setpoint_high` (or while unwinding a positive sum).
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidController {
    config: PidConfig,
}

impl PidController {
    pub const fn new(config: PidConfig) -> Self {
        Self { config }
    }

    /// State to start the loop with.
    pub const fn initial_state(&self) -> ControlState {
        ControlState::new(self.config.slow_update_period)
    }

    fn slow_update(&self, state: &mut ControlState, temperature: f32) {
        let cfg = &self.config;

        let delta = temperature - cfg.setpoint_high;
        if delta > 0.0 || state.integrator > 0.0 {
            state.integrator += delta;
        }
        // Prevent stall
        state.integrator = state.integrator.min(cfg.integrator_ceiling);

        state.derivator = temperature - cfg.setpoint_low;
        state.tick_counter = 0;

        trace!(
            "slow update: integrator={=f32} derivator={=f32}",
            state.integrator,
            state.derivator
        );
    }
}

impl super::Controller for PidController {
    #[cfg_attr(feature = "sizing", inline(never))]
    fn run(&self, state: &mut ControlState, temperature: f32) -> f32 {
        let cfg = &self.config;

        state.temperature = temperature;
        state.error = temperature - cfg.setpoint_low;

        let output = cfg.kp * state.error
            + cfg.ki * state.integrator
            + cfg.kd * (state.error - state.derivator);

        state.tick_counter = state.tick_counter.saturating_add(1);
        if state.tick_counter > cfg.slow_update_period {
            self.slow_update(state, temperature);
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, controller::Controller};

    fn pid() -> PidController {
        PidController::new(Config::DEFAULT.pid)
    }

    /// State right after a slow update, so the next ticks are all fast ones.
    fn settled(integrator: f32, derivator: f32) -> ControlState {
        ControlState {
            integrator,
            derivator,
            tick_counter: 0,
            ..ControlState::new(4)
        }
    }

    #[test]
    fn first_tick_runs_slow_update() {
        let pid = pid();
        let mut state = pid.initial_state();

        let out = pid.run(&mut state, 30.0);

        // Output uses the pre-update memory: 2.2*10 + 0 + 2.6*10
        assert!((out - 48.0).abs() < 1e-4);
        assert_eq!(state.tick_counter, 0);
        assert!((state.integrator - 2.0).abs() < 1e-6);
        assert!((state.derivator - 10.0).abs() < 1e-6);
    }

    #[test]
    fn proportional_only_when_error_matches_snapshot() {
        let pid = pid();
        let mut state = settled(0.0, 5.0);

        let out = pid.run(&mut state, 25.0);

        assert!((out - 11.0).abs() < 1e-4);
        assert!((state.error - 5.0).abs() < 1e-6);
    }

    #[test]
    fn derivative_uses_slow_snapshot() {
        let pid = pid();
        let mut state = settled(0.0, 0.0);

        // 2.2*5 + 2.6*(5 - 0)
        let out = pid.run(&mut state, 25.0);
        assert!((out - 24.0).abs() < 1e-4);

        // Snapshot is still 0 on the next fast tick, so the derivative term does not decay.
        let out = pid.run(&mut state, 25.0);
        assert!((out - 24.0).abs() < 1e-4);
        assert_eq!(state.derivator, 0.0);
    }

    #[test]
    fn memory_only_changes_on_slow_ticks() {
        let pid = pid();
        let mut state = settled(3.0, 1.0);

        for tick in 1..=4 {
            pid.run(&mut state, 35.0);
            assert_eq!(state.tick_counter, tick);
            assert_eq!(state.integrator, 3.0);
            assert_eq!(state.derivator, 1.0);
        }

        pid.run(&mut state, 35.0);
        assert_eq!(state.tick_counter, 0);
        assert!((state.integrator - 10.0).abs() < 1e-6);
        assert!((state.derivator - 15.0).abs() < 1e-6);
    }

    #[test]
    fn longest_valid_period_still_updates() {
        let mut cfg = Config::DEFAULT.pid;
        cfg.slow_update_period = u8::MAX - 1;
        let pid = PidController::new(cfg);
        let mut state = pid.initial_state();

        pid.run(&mut state, 40.0);
        assert_eq!(state.tick_counter, 0);
        assert!((state.integrator - 12.0).abs() < 1e-6);

        for _ in 0..u8::MAX - 1 {
            pid.run(&mut state, 40.0);
        }
        assert_eq!(state.tick_counter, u8::MAX - 1);
        assert!((state.integrator - 12.0).abs() < 1e-6);

        pid.run(&mut state, 40.0);
        assert_eq!(state.tick_counter, 0);
        assert!((state.integrator - 24.0).abs() < 1e-6);
    }

    #[test]
    fn integrator_clamped_to_ceiling() {
        let pid = pid();
        let mut state = settled(58.0, 0.0);
        state.tick_counter = 4;

        pid.run(&mut state, 40.0);

        assert_eq!(state.integrator, 60.0);
    }

    #[test]
    fn integrator_gated_below_high_setpoint() {
        let pid = pid();
        let mut state = pid.initial_state();

        pid.run(&mut state, 27.0);

        assert_eq!(state.integrator, 0.0);
        assert_eq!(state.tick_counter, 0);
    }

    #[test]
    fn positive_integrator_unwinds_below_high_setpoint() {
        let pid = pid();
        let mut state = settled(5.0, 0.0);
        state.tick_counter = 4;

        pid.run(&mut state, 26.0);
        assert!((state.integrator - 3.0).abs() < 1e-6);

        // Unwinding may overshoot into negative; it then stays put until the
        // temperature climbs above the high setpoint again.
        state.tick_counter = 4;
        pid.run(&mut state, 20.0);
        assert!((state.integrator + 5.0).abs() < 1e-6);

        state.tick_counter = 4;
        pid.run(&mut state, 20.0);
        assert!((state.integrator + 5.0).abs() < 1e-6);
    }

    #[test]
    fn nan_reading_keeps_integrator_under_ceiling() {
        let pid = pid();
        let mut state = settled(10.0, 0.0);
        state.tick_counter = 4;

        let out = pid.run(&mut state, f32::NAN);

        assert!(out.is_nan());
        assert!(state.integrator <= 60.0);
    }
}
