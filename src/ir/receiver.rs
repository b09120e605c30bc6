use super::{FrameError, State, STATE_BITS};

/// What the receiver drives on the board: the slot sampler and the detector edge interrupt.
pub trait RxHardware {
    /// Start the sampler so it fires half a slot from now, then once per slot
    fn start_sampling(&mut self);

    fn stop_sampling(&mut self);

    fn enable_edge(&mut self);

    fn disable_edge(&mut self);
}

/// Where the receiver is within a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxPosition {
    /// Waiting for a falling edge
    Idle,
    /// Next sample lands in the middle of the start slot
    AwaitStart,
    /// Next sample is data bit `n`, counted from the MSB
    Data(u8),
    /// Next sample lands in the stop slot
    AwaitStop,
    /// Next sample lands in the slot after the stop slot, which must be quiet
    Complete,
}

/// Assembles frames from the detector, one sample per slot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Receiver {
    position: RxPosition,
    shift: u8,
}

impl Receiver {
    pub const fn new() -> Self {
        Self {
            position: RxPosition::Idle,
            shift: 0,
        }
    }

    #[inline]
    pub const fn position(&self) -> RxPosition {
        self.position
    }

    /// True once the start bit has been confirmed and until the frame ends
    #[inline]
    pub const fn is_receiving(&self) -> bool {
        matches!(
            self.position,
            RxPosition::Data(_) | RxPosition::AwaitStop | RxPosition::Complete
        )
    }

    /// Falling edge on the detector: a frame may be starting.
    ///
    /// Edges while a frame is being sampled are ignored; the edge interrupt should be off then
    /// anyway.
    pub fn on_edge(&mut self, hw: &mut impl RxHardware) {
        if self.position != RxPosition::Idle {
            return;
        }

        self.position = RxPosition::AwaitStart;
        self.shift = 0;
        hw.disable_edge();
        hw.start_sampling();
    }

    /// Sampler fired. `line_high` is the detector level, high when no carrier is seen.
    ///
    /// Returns `None` while the frame is still coming in. Every `Some` leaves the receiver idle
    /// with the sampler stopped and the edge interrupt back on.
    pub fn on_sample(
        &mut self,
        line_high: bool,
        hw: &mut impl RxHardware,
    ) -> Option<Result<State, FrameError>> {
        let active = !line_high;

        match self.position {
            RxPosition::Idle => {
                // A late sampler interrupt after the frame ended
                hw.stop_sampling();
                None
            }
            RxPosition::AwaitStart if !active => Some(self.finish(Err(FrameError::NoStart), hw)),
            RxPosition::AwaitStart => {
                self.position = RxPosition::Data(0);
                None
            }
            RxPosition::Data(n) => {
                self.shift = (self.shift << 1) | u8::from(line_high);
                self.position = if n + 1 < STATE_BITS {
                    RxPosition::Data(n + 1)
                } else {
                    RxPosition::AwaitStop
                };
                None
            }
            RxPosition::AwaitStop if !active => Some(self.finish(Err(FrameError::NoStop), hw)),
            RxPosition::AwaitStop => {
                self.position = RxPosition::Complete;
                None
            }
            RxPosition::Complete if active => Some(self.finish(Err(FrameError::NoIdle), hw)),
            RxPosition::Complete => {
                let code = self.shift;
                let result = State::from_code(code).ok_or(FrameError::BadCode(code));
                Some(self.finish(result, hw))
            }
        }
    }

    fn finish(
        &mut self,
        result: Result<State, FrameError>,
        hw: &mut impl RxHardware,
    ) -> Result<State, FrameError> {
        self.position = RxPosition::Idle;
        self.shift = 0;
        hw.stop_sampling();
        hw.enable_edge();
        result
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}
