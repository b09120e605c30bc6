//! One-wire bus master for a single permanently attached slave.

mod address;
pub mod commands;
pub mod crc;
mod error;
mod line;

use embedded_hal::blocking::delay::DelayUs;

pub use self::{
    address::Address,
    error::*,
    line::{Line, LineRole, OpenDrainLine},
};

/// Line held low to reset every slave
const RESET_LOW_US: u32 = 480;
/// Gap between releasing the line and looking for the presence pulse
const PRESENCE_SAMPLE_US: u32 = 40;
/// Gap between the presence sample and checking the slave let go again
const PRESENCE_RELEASE_US: u32 = 300;
/// Whole receive window after the reset pulse
const PRESENCE_WINDOW_US: u32 = 480;

const WRITE_ONE_LOW_US: u32 = 5;
const WRITE_ONE_RELEASE_US: u32 = 56;
const WRITE_ZERO_LOW_US: u32 = 60;
const WRITE_ZERO_RELEASE_US: u32 = 1;

const READ_LOW_US: u32 = 5;
const READ_SAMPLE_US: u32 = 10;
const READ_RECOVERY_US: u32 = 46;

/// Outcome of a reset / presence sequence
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Presence {
    /// The line never went low: nothing answered
    NoResponse,
    /// A slave pulled the line low and released it again
    Present,
    /// The line went low and stayed low
    LineStuck,
}

impl Presence {
    /// Turns anything but [`Presence::Present`] into the matching error
    pub const fn ok<E>(self) -> Result<(), E> {
        match self {
            Presence::Present => Ok(()),
            Presence::NoResponse => Err(Error::NoResponse),
            Presence::LineStuck => Err(Error::LineStuck),
        }
    }
}

pub struct OneWire<L> {
    line: L,
    role: LineRole,
}

impl<L: Line> OneWire<L> {
    /// Takes the line and releases it, which is the bus idle state
    pub fn new(line: L) -> Result<Self, L::Error> {
        let mut wire = Self {
            line,
            role: LineRole::Released,
        };
        wire.set_role(LineRole::Released)?;
        Ok(wire)
    }

    pub fn into_inner(self) -> L {
        self.line
    }

    /// The role the master last put the line in
    pub const fn role(&self) -> LineRole {
        self.role
    }

    fn set_role(&mut self, role: LineRole) -> Result<(), L::Error> {
        self.line.set_role(role)?;
        self.role = role;
        Ok(())
    }

    /// Perform a reset initialization sequence
    ///
    /// The line is sampled twice: once inside the presence pulse, where a slave must be holding
    /// it low, and once after it, where the slave must have let go. This tells an empty bus
    /// apart from a shorted one.
    pub fn reset(&mut self, delay: &mut impl DelayUs<u32>) -> Result<Presence, L::Error> {
        self.set_role(LineRole::DriveLow)?;
        delay.delay_us(RESET_LOW_US);

        let answered = critical_section::with(|_| -> Result<bool, L::Error> {
            self.set_role(LineRole::Released)?;
            delay.delay_us(PRESENCE_SAMPLE_US);
            Ok(!self.line.is_high()?)
        })?;
        if !answered {
            delay.delay_us(PRESENCE_WINDOW_US - PRESENCE_SAMPLE_US);
            return Ok(Presence::NoResponse);
        }

        delay.delay_us(PRESENCE_RELEASE_US);
        if !self.line.is_high()? {
            return Ok(Presence::LineStuck);
        }

        // Sit out the rest of the window so the next slot doesn't land on the slave's recovery
        delay.delay_us(PRESENCE_WINDOW_US - PRESENCE_SAMPLE_US - PRESENCE_RELEASE_US);
        Ok(Presence::Present)
    }

    /// Write a single bit to the bus
    pub fn write_bit(
        &mut self,
        bit: bool,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), L::Error> {
        let (low, release) = if bit {
            (WRITE_ONE_LOW_US, WRITE_ONE_RELEASE_US)
        } else {
            (WRITE_ZERO_LOW_US, WRITE_ZERO_RELEASE_US)
        };

        critical_section::with(|_| {
            self.set_role(LineRole::DriveLow)?;
            delay.delay_us(low);
            self.set_role(LineRole::Released)?;
            delay.delay_us(release);
            Ok(())
        })
    }

    /// Read a single bit from the bus
    pub fn read_bit(&mut self, delay: &mut impl DelayUs<u32>) -> Result<bool, L::Error> {
        critical_section::with(|_| {
            self.set_role(LineRole::DriveLow)?;
            delay.delay_us(READ_LOW_US);
            self.set_role(LineRole::Released)?;

            // Slaves signal a 0 by holding the line low through this window
            delay.delay_us(READ_SAMPLE_US);
            let bit = self.line.is_high()?;

            delay.delay_us(READ_RECOVERY_US);
            Ok(bit)
        })
    }

    /// Write a single byte to the bus, LSB first
    pub fn write_byte(
        &mut self,
        byte: u8,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), L::Error> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1, delay)?;
        }
        Ok(())
    }

    /// Write multiple bytes to the bus
    pub fn write_bytes(
        &mut self,
        bytes: &[u8],
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), L::Error> {
        for byte in bytes {
            self.write_byte(*byte, delay)?;
        }
        Ok(())
    }

    /// Read a single byte from the bus, LSB first
    pub fn read_byte(&mut self, delay: &mut impl DelayUs<u32>) -> Result<u8, L::Error> {
        let mut ret = 0;
        for i in 0..8 {
            if self.read_bit(delay)? {
                ret |= 1 << i;
            }
        }
        Ok(ret)
    }

    /// Read multiple bytes from the bus
    pub fn read_bytes(
        &mut self,
        bytes: &mut [u8],
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), L::Error> {
        for byte in bytes {
            *byte = self.read_byte(delay)?;
        }
        Ok(())
    }

    /// Address the only slave without naming it
    pub fn skip_rom(&mut self, delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        self.write_byte(commands::SKIP_ROM, delay)
    }

    /// Drive the line high so a parasite-powered slave can draw conversion current.
    ///
    /// The next [`OneWire::reset`] takes the line back.
    pub fn strong_pullup(&mut self) -> Result<(), L::Error> {
        self.set_role(LineRole::DriveHigh)
    }

    /// Reset the bus and fail unless a slave answered
    pub fn reset_present(&mut self, delay: &mut impl DelayUs<u32>) -> Result<(), L::Error> {
        self.reset(delay)?.ok()
    }

    /// Read the ROM code of the single slave on the bus
    pub fn read_rom(&mut self, delay: &mut impl DelayUs<u32>) -> Result<Address, L::Error> {
        self.reset_present(delay)?;
        self.write_byte(commands::READ_ROM, delay)?;

        let mut rom = [0u8; 8];
        self.read_bytes(&mut rom, delay)?;
        crc::check_crc8(&rom)?;

        Ok(Address(u64::from_le_bytes(rom)))
    }

    /// Send a command to the bus
    ///
    /// Does the following sequence:
    /// 1. Reset the bus, failing if no slave answers
    /// 2. Skip ROM selection
    /// 3. Write the command byte
    pub fn send_command(
        &mut self,
        command: u8,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), L::Error> {
        self.reset_present(delay)?;
        self.skip_rom(delay)?;
        self.write_byte(command, delay)?;
        Ok(())
    }
}
