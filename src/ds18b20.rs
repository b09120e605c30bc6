//! Implementation for the DS18B20 temperature sensor.
//!
//! The sensor is the only slave on its bus, so every command goes out with skip ROM.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::{
    onewire::{crc::check_crc8, Error, Line, OneWire},
    thermometer::{self, Temperature},
};

pub const CONVERT_T: u8 = 0x44;
pub const READ_SCRATCHPAD: u8 = 0xBE;
pub const WRITE_SCRATCHPAD: u8 = 0x4E;
pub const READ_POWER_SUPPLY: u8 = 0xB4;

pub type Scratchpad = [u8; 9];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ds18b20 {
    resolution: Resolution,
    parasite: bool,
}

impl Ds18b20 {
    /// A sensor at its power-on resolution, assumed externally powered
    #[inline]
    pub const fn new() -> Self {
        Self {
            resolution: Resolution::Bits12,
            parasite: false,
        }
    }

    /// The resolution readings are decoded and waited for with
    #[inline]
    pub const fn configured_resolution(&self) -> Resolution {
        self.resolution
    }

    #[inline]
    pub const fn is_parasite_powered(&self) -> bool {
        self.parasite
    }

    /// Asks the sensor whether it draws power from the data line.
    ///
    /// Parasite-powered sensors get a strong pull-up during conversions.
    pub fn detect_power<L: Line>(
        &mut self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<bool, Error<L::Error>> {
        wire.send_command(READ_POWER_SUPPLY, delay)?;
        self.parasite = !wire.read_bit(delay)?;
        Ok(self.parasite)
    }

    /// Reads all nine scratchpad bytes and checks their CRC
    pub fn read_scratchpad<L: Line>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<Scratchpad, Error<L::Error>> {
        wire.send_command(READ_SCRATCHPAD, delay)?;

        let mut buf = [0u8; 9];
        wire.read_bytes(&mut buf, delay)?;

        check_crc8(&buf)?;

        Ok(buf)
    }

    fn write_scratchpad<L: Line>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
        data: [u8; 3],
    ) -> Result<(), Error<L::Error>> {
        wire.send_command(WRITE_SCRATCHPAD, delay)?;
        wire.write_bytes(&data, delay)?;
        wire.reset(delay)?.ok()
    }

    /// Retrieves the resolution stored in the sensor
    pub fn resolution<L: Line>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<Resolution, Error<L::Error>> {
        let buf = self.read_scratchpad(wire, delay)?;
        Resolution::from_config_register(buf[4]).ok_or(Error::UnexpectedResponse)
    }

    /// Sets the resolution of the sensor, keeping its alarm registers
    pub fn set_resolution<L: Line>(
        &mut self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
        res: Resolution,
    ) -> Result<(), Error<L::Error>> {
        let buf = self.read_scratchpad(wire, delay)?;
        self.write_scratchpad(wire, delay, [buf[2], buf[3], res.to_config_register()])?;
        self.resolution = res;
        Ok(())
    }

    /// Starts a temperature conversion
    ///
    /// This will take [`Resolution::conversion_time`] milliseconds; the line stays driven high
    /// for a parasite-powered sensor until the next reset.
    ///
    /// Call [`Ds18b20::read_temperature`] to read the result after the conversion is done.
    pub fn start_conversion<L: Line>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<(), Error<L::Error>> {
        wire.send_command(CONVERT_T, delay)?;
        if self.parasite {
            wire.strong_pullup()?;
        }
        Ok(())
    }

    /// Reads the two temperature bytes off the scratchpad
    ///
    /// Bits the configured resolution leaves undefined are cleared.
    pub fn read_temperature<L: Line>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut impl DelayUs<u32>,
    ) -> Result<Temperature, Error<L::Error>> {
        wire.send_command(READ_SCRATCHPAD, delay)?;

        let mut buf = [0u8; 2];
        wire.read_bytes(&mut buf, delay)?;

        let raw = u16::from_le_bytes(buf) & self.resolution.mask();
        Ok(thermometer::decode(raw))
    }

    /// Measures the temperature, blocking through the conversion
    pub fn acquire<L, D>(
        &self,
        wire: &mut OneWire<L>,
        delay: &mut D,
    ) -> Result<Temperature, Error<L::Error>>
    where
        L: Line,
        D: DelayUs<u32> + DelayMs<u32>,
    {
        self.start_conversion(wire, delay)?;
        delay.delay_ms(u32::from(self.resolution.conversion_time()));
        self.read_temperature(wire, delay)
    }
}

impl Default for Ds18b20 {
    fn default() -> Self {
        Self::new()
    }
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
    pub const fn from_config_register(reg: u8) -> Option<Self> {
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

    /// Returns the minimum conversion time in milliseconds
    pub const fn conversion_time(self) -> u16 {
        match self {
            Self::Bits9 => 94,
            Self::Bits10 => 188,
            Self::Bits11 => 375,
            Self::Bits12 => 750,
        }
    }

    /// Mask of the raw reading bits that are defined at this resolution
    const fn mask(self) -> u16 {
        match self {
            Self::Bits9 => 0xFFF8,
            Self::Bits10 => 0xFFFC,
            Self::Bits11 => 0xFFFE,
            Self::Bits12 => 0xFFFF,
        }
    }
}
