//! Temperature representation

use fixed::types::I28F4;

/// I28F4 is a fixed point number with 4 fractional bits and 28 integer bits.
/// This gives us a precision of 0.0625 degrees Celsius & a range of (-2^27, 2^27 - 0.0625).
pub type Temperature = I28F4;

/// Decodes the sensor's 16-bit two's-complement reading, 1/16 °C per LSB.
///
/// Both formats keep 4 fractional bits, so this is a sign extension and nothing is rounded.
#[inline]
#[allow(clippy::cast_possible_wrap)]
pub fn decode(raw: u16) -> Temperature {
    Temperature::from_bits(i32::from(raw as i16))
}
