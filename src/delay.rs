//! Calibrated busy-wait delay.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use fugit::HertzU32;

/// Busy-waits by burning core cycles.
///
/// Unlike a timer-backed delay this can't be preempted into lateness by its own interrupt, which
/// is what the one-wire slots need. The calibration comes from the system clock handed to
/// [`CycleDelay::new`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub const fn new(sysclk: HertzU32) -> Self {
        // Round up so a delay never comes out short
        let cycles_per_us = sysclk.raw().div_ceil(1_000_000);
        Self {
            cycles_per_us: if cycles_per_us == 0 { 1 } else { cycles_per_us },
        }
    }

    #[inline]
    pub const fn cycles_per_us(self) -> u32 {
        self.cycles_per_us
    }
}

impl DelayUs<u32> for CycleDelay {
    #[inline]
    fn delay_us(&mut self, us: u32) {
        if us == 0 {
            return;
        }

        cortex_m::asm::delay(us.saturating_mul(self.cycles_per_us));
    }
}

impl DelayMs<u32> for CycleDelay {
    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}
