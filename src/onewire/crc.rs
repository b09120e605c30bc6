//! Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected).

use super::{Error, Result};

pub const fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    let mut i = 0;
    while i < data.len() {
        let mut byte = data[i];
        let mut bit = 0;
        while bit < 8 {
            let mix = (crc ^ byte) & 0x01;
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

/// Checks a buffer whose last byte is the CRC of the bytes before it
pub fn check_crc8<E>(data: &[u8]) -> Result<(), E> {
    match data.split_last() {
        Some((&crc, payload)) if crc8(payload) == crc => Ok(()),
        _ => Err(Error::CrcMismatch),
    }
}
