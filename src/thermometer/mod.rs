//! Temperature sensor interface

pub mod ds18b20;

use embedded_hal::blocking::delay::DelayUs;
use fixed::types::I28F4;

/// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
/// This gives us a precision of 0.0625 degrees Celsius, matching the DS18B20 at 12 bits.
pub type Temperature = I28F4;

/// A bus of temperature sensors that convert on request.
///
/// Bit timing on the bus needs a microsecond delay, which is borrowed from the caller so the
/// same timer can also pace the control loop.
pub trait Thermometer {
    type Error;

    /// Start a conversion on every sensor. Does not wait for it to finish.
    fn request_conversion<D: DelayUs<u32>>(&mut self, delay: &mut D) -> Result<(), Self::Error>;

    /// Read the last converted value of the sensor at `index`, in degrees Celsius
    fn read_celsius<D: DelayUs<u32>>(
        &mut self,
        index: usize,
        delay: &mut D,
    ) -> Result<f32, Self::Error>;
}
