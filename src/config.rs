//! Board-wide timing configuration.

use fugit::HertzU32;

/// Core clock the firmware configures. [`crate::delay::CycleDelay`] is calibrated from it.
pub const SYSCLK: HertzU32 = HertzU32::from_raw(24_000_000);

/// Timing of the infrared link, counted in beats of the framing clock.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Frequency of the framing clock. One beat is one framing slot.
    pub beat: HertzU32,
    /// Beats from one frame start to the next.
    pub frame_period: u16,
    /// Beats a button stays deaf after an honored edge.
    pub debounce_window: u16,
    /// Beats a selected or received state is held before reverting to idle.
    pub hold: u16,
    /// A peer older than this many beats is considered lost.
    pub silence_threshold: u16,
    /// Emitter modulation frequency while the transmit flag is set.
    pub carrier: HertzU32,
    /// Keep sending frames while the local state is idle.
    pub keepalive: bool,
}

impl LinkConfig {
    pub const DEFAULT: Self = Self::from_beat(HertzU32::from_raw(512));

    /// Derives every window from the beat frequency: one frame per second, a quarter second of
    /// debounce, one second of hold and two frame periods of silence.
    pub const fn from_beat(beat: HertzU32) -> Self {
        let beats = beat.raw();
        let period = if beats > u16::MAX as u32 / 2 {
            u16::MAX / 2
        } else {
            beats as u16
        };

        Self {
            beat,
            frame_period: period,
            debounce_window: period / 4,
            hold: period,
            silence_threshold: period * 2,
            carrier: HertzU32::from_raw(38_000),
            keepalive: true,
        }
    }

    /// Frequency the sampler runs at for its first, half-slot, period.
    pub const fn half_beat(&self) -> HertzU32 {
        HertzU32::from_raw(self.beat.raw().saturating_mul(2))
    }

    /// Half of one carrier period in microseconds, rounded down and never zero.
    ///
    /// A zero carrier is treated as 1 Hz.
    pub const fn carrier_half_period_us(&self) -> u32 {
        match self.carrier.raw() {
            0 => 500_000,
            hz if hz > 500_000 => 1,
            hz => 500_000 / hz,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
