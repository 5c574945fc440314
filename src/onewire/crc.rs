//! Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, LSB first).

use super::Error;

/// CRC-8 of `data`.
pub const fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    let mut i = 0;
    while i < data.len() {
        let mut byte = data[i];
        let mut bit = 0;
        while bit < 8 {
            let mix = (crc ^ byte) & 1;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
            bit += 1;
        }
        i += 1;
    }
    crc
}

/// Checks a block whose last byte is the CRC of the bytes before it.
pub fn check_crc8<E>(data: &[u8]) -> Result<(), Error<E>> {
    // Running the CRC over data plus its own CRC yields zero
    if crc8(data) == 0 {
        Ok(())
    } else {
        Err(Error::CrcMismatch)
    }
}
