use super::{crc::check_crc8, Error};

/// A 64-bit ROM code. Byte 0 is the family code, bytes 1..7 the serial number and byte 7 the
/// CRC of the rest.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Address(pub u64);

impl Address {
    pub const fn family_code(self) -> u8 {
        self.0.to_le_bytes()[0]
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    /// Checks the CRC byte of the ROM code.
    pub fn check_crc<E>(self) -> Result<(), Error<E>> {
        check_crc8(&self.to_bytes())
    }
}

impl core::fmt::Debug for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(f, "{:016X?}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{=u64:016X}", self.0);
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    #[test]
    fn family_code_is_low_byte() {
        let addr = Address(0x05_00_00_0F_83_FB_60_28);
        assert_eq!(addr.family_code(), 0x28);
    }

    #[test]
    fn crc_checked_over_rom() {
        let good = Address(u64::from_le_bytes([0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00, 0xA2]));
        assert!(good.check_crc::<Infallible>().is_ok());

        let bad = Address(good.0 ^ (1 << 40));
        assert!(bad.check_crc::<Infallible>().is_err());
    }
}
