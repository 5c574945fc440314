//! PWM fan driver.

use core::convert::Infallible;

use embedded_hal::PwmPin;

/// A fan driven by a duty cycle in `0..=ceiling`.
pub trait PwmOutput {
    #[cfg(feature = "defmt")]
    type Error: defmt::Format;
    #[cfg(not(feature = "defmt"))]
    type Error;

    /// One-time setup before the control loop starts.
    ///
    /// `ceiling` is the duty value that means 100%. `initial` is written straight away.
    fn configure(&mut self, ceiling: u8, initial: u8) -> Result<(), Self::Error>;

    /// Write a new duty cycle. Values above the ceiling are treated as the ceiling.
    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error>;
}

/// A fan on a timer PWM channel.
///
/// The 8-bit duty is scaled from `0..=ceiling` onto the channel's `0..=get_max_duty()`.
pub struct PwmFan<PIN: PwmPin<Duty = u16>> {
    pin: PIN,
    ceiling: u8,
}

impl<PIN: PwmPin<Duty = u16>> PwmFan<PIN> {
    /// `ceiling` is the duty that means 100%, until [`PwmOutput::configure`] sets another.
    pub fn new(pin: PIN, ceiling: u8) -> Self {
        Self {
            pin,
            ceiling: ceiling.max(1),
        }
    }

    pub fn release(self) -> PIN {
        self.pin
    }

    fn scale(&self, duty: u8) -> u16 {
        let max = u32::from(self.pin.get_max_duty());
        let duty = u32::from(duty.min(self.ceiling));
        // max fits in u16 and duty <= ceiling, so the quotient does too
        (duty * max / u32::from(self.ceiling)) as u16
    }
}

impl<PIN: PwmPin<Duty = u16>> PwmOutput for PwmFan<PIN> {
    type Error = Infallible;

    fn configure(&mut self, ceiling: u8, initial: u8) -> Result<(), Self::Error> {
        self.ceiling = ceiling.max(1);
        self.pin.set_duty(self.scale(initial));
        self.pin.enable();
        Ok(())
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error> {
        let raw = self.scale(duty);
        self.pin.set_duty(raw);
        Ok(())
    }
}
