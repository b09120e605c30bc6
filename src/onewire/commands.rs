//! ROM-level command bytes. Function commands live with the device driver.

pub const READ_ROM: u8 = 0x33;
pub const SKIP_ROM: u8 = 0xCC;
