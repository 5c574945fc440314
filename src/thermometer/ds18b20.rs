use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};

use crate::{
    ds18b20::{Ds18b20, Resolution, CONVERT_T, FAMILY_CODE},
    onewire::{Address, Error, OneWire},
    thermometer::Thermometer,
};

/// Every DS18B20 on one 1-Wire bus, indexed in ROM search order.
pub struct Ds18b20Thermometer<P, const N: usize> {
    wire: OneWire<P>,
    therms: heapless::Vec<Ds18b20, N>,
    resolution: Resolution,
}

impl<P, E, const N: usize> Ds18b20Thermometer<P, N>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    pub const fn new(wire: OneWire<P>, resolution: Resolution) -> Self {
        Self {
            wire,
            therms: heapless::Vec::new(),
            resolution,
        }
    }

    /// Search the bus and register every DS18B20 found, up to `N`.
    ///
    /// Devices of other families are skipped. Returns the number of sensors registered.
    pub fn discover(&mut self, delay: &mut impl DelayUs<u32>) -> Result<usize, Error<E>> {
        let mut addrs = heapless::Vec::<Address, N>::new();

        for addr in self.wire.devices(delay) {
            let addr = addr?;
            if addr.family_code() != FAMILY_CODE {
                debug!("Skipping 1-Wire device {}", addr);
                continue;
            }
            info!("Found DS18B20: {}", addr);

            if addrs.push(addr).is_err() {
                warn!("More than {=usize} sensors on the bus, ignoring the rest", N);
                break;
            }
        }

        for addr in addrs {
            self.add(addr, delay)?;
        }

        Ok(self.therms.len())
    }

    /// Register one sensor and apply the bus resolution to it.
    pub fn add(&mut self, addr: Address, delay: &mut impl DelayUs<u32>) -> Result<(), Error<E>> {
        let therm = Ds18b20::new::<E>(addr)?;
        if self.therms.contains(&therm) {
            return Ok(());
        }

        therm.set_resolution(&mut self.wire, delay, self.resolution)?;
        if self.therms.push(therm).is_err() {
            warn!("Sensor table full, dropping {}", addr);
        }
        Ok(())
    }
}

impl<P, E, const N: usize> Thermometer for Ds18b20Thermometer<P, N>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = Error<E>;

    fn request_conversion<D: DelayUs<u32>>(&mut self, delay: &mut D) -> Result<(), Self::Error> {
        // Skip ROM starts all sensors at once
        self.wire.send_command(None, CONVERT_T, delay)
    }

    fn read_celsius<D: DelayUs<u32>>(
        &mut self,
        index: usize,
        delay: &mut D,
    ) -> Result<f32, Self::Error> {
        let therm = self.therms.get(index).ok_or(Error::<E>::NoDevice)?;
        let temp = therm.read_data(&mut self.wire, delay)?;
        Ok(temp.to_num())
    }
}
