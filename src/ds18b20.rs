//! Implementation for the DS18B20 temperature sensor.

use embedded_hal::{
    blocking::delay::DelayUs,
    digital::v2::{InputPin, OutputPin},
};

use crate::{
    onewire::{crc::check_crc8, Address, Error, OneWire},
    thermometer::Temperature,
};

pub const FAMILY_CODE: u8 = 0x28;

pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;
pub const WRITE_SCRATCHPAD: u8 = 0x4E;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ds18b20 {
    addr: Address,
}

impl Ds18b20 {
    /// Wraps a ROM code, rejecting devices of other families.
    pub const fn new<E>(addr: Address) -> Result<Self, Error<E>> {
        if addr.family_code() == FAMILY_CODE {
            Ok(Self { addr })
        } else {
            Err(Error::FamilyCodeMismatch)
        }
    }

    fn read_scratchpad<P, E>(
        &self,
        wire: &mut OneWire<P>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<[u8; 9], Error<E>>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
    {
        wire.send_command(Some(&self.addr), READ_SCRATCHPAD, delay)?;

        let mut buf = [0u8; 9];
        wire.read_bytes(&mut buf, delay)?;
        check_crc8::<E>(&buf)?;

        Ok(buf)
    }

    /// Sets the resolution of the sensor
    ///
    /// The alarm registers are written back unchanged.
    pub fn set_resolution<P, E>(
        &self,
        wire: &mut OneWire<P>,
        delay: &mut impl DelayUs<u32>,
        res: Resolution,
    ) -> Result<(), Error<E>>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
    {
        let buf = self.read_scratchpad(wire, delay)?;

        wire.send_command(Some(&self.addr), WRITE_SCRATCHPAD, delay)?;
        wire.write_bytes(&[buf[2], buf[3], res.to_config_register()], delay)?;
        wire.reset(delay)
    }

    /// Reads the last converted temperature
    pub fn read_data<P, E>(
        &self,
        wire: &mut OneWire<P>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<Temperature, Error<E>>
    where
        P: InputPin<Error = E> + OutputPin<Error = E>,
    {
        let buf = self.read_scratchpad(wire, delay)?;
        decode_scratchpad(&buf)
    }
}

/// Temperature from a CRC-checked scratchpad.
///
/// Undefined low bits are masked according to the configured resolution.
pub fn decode_scratchpad<E>(buf: &[u8; 9]) -> Result<Temperature, Error<E>> {
    let resolution =
        Resolution::from_config_register(buf[4]).ok_or(Error::<E>::UnexpectedResponse)?;

    let lsb = buf[0] & resolution.mask();
    let value = i16::from_le_bytes([lsb, buf[1]]);
    Ok(Temperature::from_bits(i32::from(value)))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Resolution {
    const fn from_config_register(reg: u8) -> Option<Self> {
        match reg {
            0b0001_1111 => Some(Self::Bits9),
            0b0011_1111 => Some(Self::Bits10),
            0b0101_1111 => Some(Self::Bits11),
            0b0111_1111 => Some(Self::Bits12),
            _ => None,
        }
    }

    pub const fn to_config_register(self) -> u8 {
        match self {
            Self::Bits9 => 0b0001_1111,
            Self::Bits10 => 0b0011_1111,
            Self::Bits11 => 0b0101_1111,
            Self::Bits12 => 0b0111_1111,
        }
    }

    /// Bits of the temperature LSB that hold data at this resolution
    const fn mask(self) -> u8 {
        match self {
            Self::Bits9 => 0b1111_1000,
            Self::Bits10 => 0b1111_1100,
            Self::Bits11 => 0b1111_1110,
            Self::Bits12 => 0b1111_1111,
        }
    }

    /// Returns the maximum conversion time in milliseconds
    pub const fn conversion_time(self) -> u16 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }
}
