pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The line never went low after a reset: nothing is attached, or the slave is dead
    NoResponse,

    /// The line was still low at the end of the presence window. Either the bus is shorted or
    /// the pull-up is missing
    LineStuck,

    /// Pin Error
    Pin(E),

    /// A CRC-protected read didn't check out
    CrcMismatch,

    /// The slave answered with something that can't be interpreted, such as an unknown
    /// configuration register value
    UnexpectedResponse,
}

impl<E> Error<E> {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::NoResponse => "No response",
            Error::LineStuck => "Line stuck low",
            Error::Pin(_) => "Pin error",
            Error::CrcMismatch => "CRC mismatch",
            Error::UnexpectedResponse => "Unexpected response",
        }
    }

    /// Whether the error means no slave answered the reset at all
    pub const fn is_no_device(&self) -> bool {
        matches!(self, Error::NoResponse | Error::LineStuck)
    }
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}
