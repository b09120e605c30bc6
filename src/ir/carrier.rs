use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::{blocking::delay::DelayUs, digital::v2::OutputPin};

/// Transmit flag handed from the framing timer to the carrier loop.
///
/// The beat handler is the only writer and the main loop the only reader, so plain loads and
/// stores are enough (and all thumbv6 offers).
#[derive(Debug, Default)]
pub struct CarrierGate {
    on: AtomicBool,
}

impl CarrierGate {
    pub const fn new() -> Self {
        Self {
            on: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::Relaxed)
    }

    /// Runs one half period of the carrier: toggles the emitter while the gate is open, and
    /// parks it off when closed.
    pub fn step<P: OutputPin>(
        &self,
        emitter: &mut P,
        level: &mut bool,
        delay: &mut impl DelayUs<u32>,
        half_period_us: u32,
    ) -> Result<(), P::Error> {
        if self.is_on() {
            *level = !*level;
            if *level {
                emitter.set_high()?;
            } else {
                emitter.set_low()?;
            }
            delay.delay_us(half_period_us);
        } else if *level {
            *level = false;
            emitter.set_low()?;
        }
        Ok(())
    }
}
