//! Bit-banged 1-Wire bus master.
//!
//! The data line must be an open-drain output with an external pull-up, readable while
//! released. Slot timings follow the standard speed values from the DS18B20 datasheet.

mod address;
pub mod commands;
pub mod crc;
mod error;

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};

pub use self::{address::Address, error::*};

pub struct OneWire<P> {
    pin: P,
}

impl<P, E> OneWire<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }

    /// Perform a reset and wait for a presence pulse
    pub fn reset(&mut self, delay: &mut impl DelayUs<u32>) -> Result<(), E> {
        // Give the pull-up up to 250us to bring the line high
        let mut retries = 125;
        while self.pin.is_low()? {
            if retries == 0 {
                return Err(Error::BusNotHigh);
            }
            retries -= 1;
            delay.delay_us(2);
        }

        self.pin.set_low()?;
        delay.delay_us(480);
        self.pin.set_high()?;
        delay.delay_us(70);

        // Devices answer by holding the line low
        let present = self.pin.is_low()?;
        delay.delay_us(410);

        if present {
            Ok(())
        } else {
            Err(Error::UnexpectedResponse)
        }
    }

    pub fn write_bit(&mut self, bit: bool, delay: &mut impl DelayUs<u32>) -> Result<(), E> {
        // A 1 is a short low pulse, a 0 holds the line low for most of the slot
        let (low, recovery) = if bit { (10, 55) } else { (65, 5) };

        self.pin.set_low()?;
        delay.delay_us(low);
        self.pin.set_high()?;
        delay.delay_us(recovery);

        Ok(())
    }

    pub fn read_bit(&mut self, delay: &mut impl DelayUs<u32>) -> Result<bool, E> {
        // The sample must land within 15us of the falling edge
        let bit = critical_section::with(|_| {
            self.pin.set_low()?;
            delay.delay_us(1);
            self.pin.set_high()?;
            delay.delay_us(1);
            self.pin.is_high()
        })?;

        delay.delay_us(53);

        Ok(bit)
    }

    /// Write a byte, LSB first
    pub fn write_byte(&mut self, byte: u8, delay: &mut impl DelayUs<u32>) -> Result<(), E> {
        (0..8).try_for_each(|i| self.write_bit(byte & (1 << i) != 0, delay))
    }

    pub fn write_bytes(&mut self, bytes: &[u8], delay: &mut impl DelayUs<u32>) -> Result<(), E> {
        bytes.iter().try_for_each(|b| self.write_byte(*b, delay))
    }

    /// Read a byte, LSB first
    pub fn read_byte(&mut self, delay: &mut impl DelayUs<u32>) -> Result<u8, E> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit(delay)? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    pub fn read_bytes(&mut self, bytes: &mut [u8], delay: &mut impl DelayUs<u32>) -> Result<(), E> {
        for byte in bytes {
            *byte = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Address the next command to a single device, or to all of them with `None`
    pub fn select(
        &mut self,
        address: Option<&Address>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), E> {
        match address {
            Some(address) => {
                self.write_byte(commands::MATCH_ROM, delay)?;
                self.write_bytes(&address.to_bytes(), delay)
            }
            None => self.write_byte(commands::SKIP_ROM, delay),
        }
    }

    /// Reset the bus, select `address` (or skip ROM for `None`) and write `command`
    pub fn send_command(
        &mut self,
        address: Option<&Address>,
        command: u8,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), E> {
        self.reset(delay)?;
        self.select(address, delay)?;
        self.write_byte(command, delay)
    }

    /// Iterate over the ROM codes of all devices on the bus
    pub fn devices<'a, 'd, D: DelayUs<u32>>(
        &'a mut self,
        delay: &'d mut D,
    ) -> DeviceSearch<'a, 'd, P, D> {
        DeviceSearch {
            wire: self,
            delay,
            rom: 0,
            last_discrepancy: 0,
            done: false,
        }
    }
}

/// ROM search (Maxim application note 187).
///
/// Each pass walks the 64 ROM bits. Where devices disagree on a bit, the pass takes the branch
/// chosen by `last_discrepancy`, which moves one branch further each pass until none are left.
pub struct DeviceSearch<'a, 'd, P, D> {
    wire: &'a mut OneWire<P>,
    delay: &'d mut D,
    rom: u64,
    /// 1-based position of the last bit where the 0 branch was taken
    last_discrepancy: u8,
    done: bool,
}

impl<P, E, D> DeviceSearch<'_, '_, P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u32>,
{
    fn next_address(&mut self) -> Result<Option<Address>, E> {
        if self.done {
            return Ok(None);
        }

        self.wire.reset(self.delay)?;
        self.wire.write_byte(commands::SEARCH_ROM, self.delay)?;

        let mut last_zero = 0;
        for position in 1..=64u8 {
            let mask = 1u64 << (position - 1);
            let bit = self.wire.read_bit(self.delay)?;
            let complement = self.wire.read_bit(self.delay)?;

            let branch = match (bit, complement) {
                // Nobody answered
                (true, true) => return Err(Error::UnexpectedResponse),
                // All remaining devices agree
                (true, false) => true,
                (false, true) => false,
                // Conflict
                (false, false) => {
                    let branch = match position.cmp(&self.last_discrepancy) {
                        core::cmp::Ordering::Less => self.rom & mask != 0,
                        core::cmp::Ordering::Equal => true,
                        core::cmp::Ordering::Greater => false,
                    };
                    if !branch {
                        last_zero = position;
                    }
                    branch
                }
            };

            if branch {
                self.rom |= mask;
            } else {
                self.rom &= !mask;
            }
            self.wire.write_bit(branch, self.delay)?;
        }

        self.last_discrepancy = last_zero;
        self.done = last_zero == 0;

        let address = Address(self.rom);
        address.check_crc::<E>()?;
        Ok(Some(address))
    }
}

impl<P, E, D> Iterator for DeviceSearch<'_, '_, P, D>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
    D: DelayUs<u32>,
{
    type Item = Result<Address, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.next_address();
        if next.is_err() {
            // A failed pass leaves no usable discrepancy to resume from
            self.done = true;
        }
        next.transpose()
    }
}
