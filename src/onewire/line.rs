use embedded_hal::digital::v2::{InputPin, OutputPin};

/// What the master is doing to the line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineRole {
    /// Actively pulling the line to ground
    DriveLow,
    /// Actively driving the line high (strong pull-up for parasite power)
    DriveHigh,
    /// Input; the pull-up resistor or a slave decides the level
    Released,
}

/// A one-wire data line the master can switch between roles and sample.
pub trait Line {
    type Error;

    fn set_role(&mut self, role: LineRole) -> Result<(), Self::Error>;

    fn is_high(&mut self) -> Result<bool, Self::Error>;
}

/// Adapts an open-drain output that can read back its pad level.
///
/// Open-drain can't source current, so [`LineRole::DriveHigh`] degrades to releasing the line
/// and relying on the pull-up.
pub struct OpenDrainLine<P> {
    pin: P,
}

impl<P> OpenDrainLine<P> {
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P, E> Line for OpenDrainLine<P>
where
    P: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = E;

    fn set_role(&mut self, role: LineRole) -> Result<(), E> {
        match role {
            LineRole::DriveLow => self.pin.set_low(),
            LineRole::DriveHigh | LineRole::Released => self.pin.set_high(),
        }
    }

    fn is_high(&mut self) -> Result<bool, E> {
        self.pin.is_high()
    }
}
