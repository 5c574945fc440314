//! One temperature reading per control loop tick.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::{config::SamplerConfig, thermometer::Thermometer};

/// Reported in place of a reading the sensor could not deliver.
pub const DISCONNECTED_C: f32 = -127.0;

/// Measurable range of the DS18B20.
pub const VALID_RANGE_C: core::ops::RangeInclusive<f32> = -55.0..=125.0;

/// Whether a sample can only have come from a failed or absent sensor.
pub fn is_fault(temperature: f32) -> bool {
    !VALID_RANGE_C.contains(&temperature)
}

/// Drives the conversion cycle of a [`Thermometer`].
///
/// The settle wait in [`Sampler::sample`] is the only place the control loop blocks, so it
/// also sets the loop period.
pub struct Sampler<S, D> {
    sensor: S,
    delay: D,
    config: SamplerConfig,
}

impl<S, D> Sampler<S, D>
where
    S: Thermometer,
    D: DelayMs<u32> + DelayUs<u32>,
{
    pub const fn new(sensor: S, delay: D, config: SamplerConfig) -> Self {
        Self {
            sensor,
            delay,
            config,
        }
    }

    /// Trigger a conversion, wait for it to settle, then read it back.
    ///
    /// Never fails: a sensor error is logged and reported as [`DISCONNECTED_C`].
    #[cfg_attr(feature = "sizing", inline(never))]
    pub fn sample(&mut self) -> f32 {
        if self.sensor.request_conversion(&mut self.delay).is_err() {
            warn!("Failed to start temperature conversion");
        }

        self.delay.delay_ms(self.config.settle.to_millis());

        match self
            .sensor
            .read_celsius(self.config.sensor_index, &mut self.delay)
        {
            Ok(temp) => temp,
            Err(_) => {
                error!(
                    "Failed to read sensor {=usize}",
                    self.config.sensor_index
                );
                DISCONNECTED_C
            }
        }
    }

    pub const fn sensor(&self) -> &S {
        &self.sensor
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::config::Config;

    #[derive(Debug, PartialEq)]
    enum Event {
        Convert,
        Wait(u32),
        Read(usize),
    }

    #[derive(Default)]
    struct Log(Vec<Event>);

    /// Sensor and delay share the log so the call order is visible.
    struct Probe<'a> {
        log: &'a RefCell<Log>,
        reading: Result<f32, ()>,
    }

    struct Tick<'a>(&'a RefCell<Log>);

    impl DelayMs<u32> for Tick<'_> {
        fn delay_ms(&mut self, ms: u32) {
            self.0.borrow_mut().0.push(Event::Wait(ms));
        }
    }

    impl DelayUs<u32> for Tick<'_> {
        fn delay_us(&mut self, _us: u32) {}
    }

    impl Thermometer for Probe<'_> {
        type Error = ();

        fn request_conversion<D: DelayUs<u32>>(&mut self, _: &mut D) -> Result<(), ()> {
            self.log.borrow_mut().0.push(Event::Convert);
            Ok(())
        }

        fn read_celsius<D: DelayUs<u32>>(&mut self, index: usize, _: &mut D) -> Result<f32, ()> {
            self.log.borrow_mut().0.push(Event::Read(index));
            self.reading
        }
    }

    #[test]
    fn convert_wait_read() {
        let log = RefCell::new(Log::default());
        let mut sampler = Sampler::new(
            Probe {
                log: &log,
                reading: Ok(23.5),
            },
            Tick(&log),
            Config::DEFAULT.sampler,
        );

        assert_eq!(sampler.sample(), 23.5);
        assert_eq!(
            log.borrow().0,
            [Event::Convert, Event::Wait(1000), Event::Read(0)]
        );
    }

    #[test]
    fn read_error_gives_sentinel() {
        let log = RefCell::new(Log::default());
        let mut sampler = Sampler::new(
            Probe {
                log: &log,
                reading: Err(()),
            },
            Tick(&log),
            Config::DEFAULT.sampler,
        );

        assert_eq!(sampler.sample(), DISCONNECTED_C);
    }

    #[test]
    fn fault_detection() {
        assert!(is_fault(DISCONNECTED_C));
        assert!(is_fault(f32::NAN));
        assert!(is_fault(f32::INFINITY));
        assert!(is_fault(125.5));
        assert!(!is_fault(-55.0));
        assert!(!is_fault(85.0));
        assert!(!is_fault(21.0625));
    }
}
