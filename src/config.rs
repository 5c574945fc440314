//! Compile-time configuration of the control loop and its hardware.
//!
//! The loop is not reconfigurable at runtime: one [`Config`] is built at startup (normally
//! [`Config::DEFAULT`]) and handed to the components that need it.

use fugit::{HertzU32, MillisDurationU32};
use static_assertions::const_assert;

/// PID tuning and the two reference temperatures.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Turn-on reference in °C. Error and derivative are measured against this.
    pub setpoint_low: f32,
    /// Integral reference in °C. The integrator only winds up above this.
    pub setpoint_high: f32,
    /// Anti-stall ceiling for the integrator.
    pub integrator_ceiling: f32,
    /// Fast ticks between slow updates of the integrator and derivator.
    pub slow_update_period: u8,
}

/// Mapping from controller output to duty cycle.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActuatorConfig {
    /// Outputs below this turn the fan off.
    pub low_threshold: f32,
    /// Outputs above this run the fan at [`ActuatorConfig::max_duty`].
    pub high_threshold: f32,
    /// Duty value for 100%, also the PWM compare ceiling.
    pub max_duty: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    /// Wait between triggering a conversion and reading it back. Also the loop period.
    pub settle: MillisDurationU32,
    /// Index of the sensor on the bus, in ROM search order.
    pub sensor_index: usize,
}

/// One-time PWM peripheral setup.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    pub frequency: HertzU32,
    /// Duty written at configuration, before the first sample.
    pub initial_duty: u8,
}

/// What to do with a reading the sensor cannot have produced.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultPolicy {
    /// Feed every reading to the controller, including the disconnect sentinel.
    #[default]
    Ignore,
    /// Stop the fan and leave the controller state alone for that tick.
    FanOff,
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub pid: PidConfig,
    pub actuator: ActuatorConfig,
    pub sampler: SamplerConfig,
    pub pwm: PwmConfig,
    pub fault_policy: FaultPolicy,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A gain, setpoint, threshold or ceiling is NaN or infinite
    NotFinite,
    /// `setpoint_low` must not exceed `setpoint_high`
    SetpointOrder,
    /// Thresholds must satisfy `0 <= low <= high <= max_duty`
    ThresholdOrder,
    MaxDutyZero,
    SlowUpdatePeriodZero,
    /// The tick counter saturates at `u8::MAX`, so the period must stay below it
    SlowUpdatePeriodMax,
    /// The initial duty is above `max_duty`
    InitialDutyRange,
}

impl ConfigError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFinite => "Non-finite parameter",
            Self::SetpointOrder => "Setpoints out of order",
            Self::ThresholdOrder => "Thresholds out of order",
            Self::MaxDutyZero => "Max duty is zero",
            Self::SlowUpdatePeriodZero => "Slow update period is zero",
            Self::SlowUpdatePeriodMax => "Slow update period too long",
            Self::InitialDutyRange => "Initial duty out of range",
        }
    }
}

impl Config {
    pub const DEFAULT: Self = Self {
        pid: PidConfig {
            kp: 2.2,
            ki: 1.4,
            kd: 2.6,
            setpoint_low: 20.0,
            setpoint_high: 28.0,
            integrator_ceiling: 60.0,
            slow_update_period: 4,
        },
        actuator: ActuatorConfig {
            low_threshold: 5.0,
            high_threshold: 60.0,
            max_duty: 80,
        },
        sampler: SamplerConfig {
            settle: MillisDurationU32::millis(1000),
            sensor_index: 0,
        },
        pwm: PwmConfig {
            frequency: HertzU32::kHz(25),
            initial_duty: 10,
        },
        fault_policy: FaultPolicy::Ignore,
    };

    /// Check the invariants the controller and actuator rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pid = &self.pid;
        let act = &self.actuator;

        let finite = [
            pid.kp,
            pid.ki,
            pid.kd,
            pid.setpoint_low,
            pid.setpoint_high,
            pid.integrator_ceiling,
            act.low_threshold,
            act.high_threshold,
        ];
        if !finite.iter().all(|x| x.is_finite()) {
            return Err(ConfigError::NotFinite);
        }
        if pid.setpoint_low > pid.setpoint_high {
            return Err(ConfigError::SetpointOrder);
        }
        if pid.slow_update_period == 0 {
            return Err(ConfigError::SlowUpdatePeriodZero);
        }
        if pid.slow_update_period == u8::MAX {
            return Err(ConfigError::SlowUpdatePeriodMax);
        }
        if act.max_duty == 0 {
            return Err(ConfigError::MaxDutyZero);
        }
        if act.low_threshold < 0.0
            || act.low_threshold > act.high_threshold
            || act.high_threshold > f32::from(act.max_duty)
        {
            return Err(ConfigError::ThresholdOrder);
        }
        if self.pwm.initial_duty > act.max_duty {
            return Err(ConfigError::InitialDutyRange);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const_assert!(Config::DEFAULT.pid.slow_update_period > 0);
const_assert!(Config::DEFAULT.pid.slow_update_period < u8::MAX);
const_assert!(Config::DEFAULT.actuator.max_duty > 0);
const_assert!(Config::DEFAULT.pwm.initial_duty <= Config::DEFAULT.actuator.max_duty);
const_assert!(Config::DEFAULT.actuator.low_threshold >= 0.0);
const_assert!(Config::DEFAULT.actuator.low_threshold <= Config::DEFAULT.actuator.high_threshold);
const_assert!(Config::DEFAULT.actuator.high_threshold <= Config::DEFAULT.actuator.max_duty as f32);
