use super::{State, STATE_BITS};
use crate::config::LinkConfig;

/// Slots in one frame: start, data bits, stop
pub const FRAME_SLOTS: u16 = 1 + STATE_BITS as u16 + 1;

const START_SLOT: u16 = 0;
const STOP_SLOT: u16 = FRAME_SLOTS - 1;

/// Carrier level of each slot of a frame carrying `state`.
///
/// Carrier on means 0 in the data slots.
pub const fn frame_slots(state: State) -> [bool; FRAME_SLOTS as usize] {
    let code = state.code();
    [
        true,
        code & 0b1000 == 0,
        code & 0b0100 == 0,
        code & 0b0010 == 0,
        code & 0b0001 == 0,
        true,
    ]
}

/// Serializes the local state, one slot per beat.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transmitter {
    /// Beat within the frame period; frames start at 0
    position: u16,
    period: u16,
    /// Local State Value, written by button edges
    state: State,
    /// Copy of `state` taken at the start slot, sent for the whole frame
    latched: State,
    hold: u16,
    hold_reload: u16,
    keepalive: bool,
    framing: bool,
}

impl Transmitter {
    pub const fn new(config: &LinkConfig) -> Self {
        // The receiver needs at least one idle slot after the stop slot
        let period = if config.frame_period > FRAME_SLOTS {
            config.frame_period
        } else {
            FRAME_SLOTS + 1
        };

        Self {
            // First beat starts a frame
            position: period - 1,
            period,
            state: State::Idle,
            latched: State::Idle,
            hold: 0,
            hold_reload: config.hold,
            keepalive: config.keepalive,
            framing: false,
        }
    }

    /// Moves to the next slot and returns whether the carrier should be on during it
    pub fn advance(&mut self) -> bool {
        self.position = (self.position + 1) % self.period;

        if self.position == START_SLOT {
            self.latched = self.state;
            self.framing = self.keepalive || !self.latched.is_idle();
        }

        match self.position {
            _ if !self.framing => false,
            START_SLOT | STOP_SLOT => true,
            slot if slot < STOP_SLOT => {
                let shift = STATE_BITS as u16 - slot;
                (self.latched.code() >> shift) & 1 == 0
            }
            _ => {
                self.framing = false;
                false
            }
        }
    }

    /// Sets the state to send and restarts the hold
    pub fn select(&mut self, state: State) {
        self.state = state;
        self.hold = self.hold_reload;
    }

    /// Counts the hold down; once it has run out the state falls back to idle
    pub fn decay_hold(&mut self) {
        if self.hold == 0 {
            self.state = State::Idle;
        } else {
            self.hold -= 1;
        }
    }

    #[inline]
    pub const fn state(&self) -> State {
        self.state
    }

    /// The state going out in the current frame
    #[inline]
    pub const fn latched(&self) -> State {
        self.latched
    }

    #[inline]
    pub const fn position(&self) -> u16 {
        self.position
    }

    /// True from the start slot through the stop slot of a frame that is being sent
    #[inline]
    pub const fn is_framing(&self) -> bool {
        self.framing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_frame(tx: &mut Transmitter) -> [bool; FRAME_SLOTS as usize] {
        let mut slots = [false; FRAME_SLOTS as usize];
        for slot in &mut slots {
            *slot = tx.advance();
        }
        slots
    }

    #[test]
    fn slots_for_three() {
        assert_eq!(
            frame_slots(State::Button3),
            [true, true, true, false, false, true]
        );
    }

    #[test]
    fn frame_matches_slots_then_goes_quiet() {
        let config = LinkConfig::DEFAULT;
        let mut tx = Transmitter::new(&config);
        tx.select(State::Button3);

        assert_eq!(collect_frame(&mut tx), frame_slots(State::Button3));
        assert!(tx.is_framing());

        for _ in FRAME_SLOTS..config.frame_period {
            assert!(!tx.advance());
            assert!(!tx.is_framing());
        }

        // Next frame starts exactly one period later
        assert!(tx.advance());
        assert_eq!(tx.position(), 0);
    }

    #[test]
    fn state_latched_for_whole_frame() {
        let mut tx = Transmitter::new(&LinkConfig::DEFAULT);
        tx.select(State::Button4);

        assert!(tx.advance());
        tx.select(State::Button1);

        let mut rest = [false; FRAME_SLOTS as usize - 1];
        for slot in &mut rest {
            *slot = tx.advance();
        }
        assert_eq!(rest, frame_slots(State::Button4)[1..]);
        assert_eq!(tx.latched(), State::Button4);
        assert_eq!(tx.state(), State::Button1);
    }

    #[test]
    fn idle_frames_keep_link_alive() {
        let mut tx = Transmitter::new(&LinkConfig::DEFAULT);
        assert_eq!(collect_frame(&mut tx), [true; FRAME_SLOTS as usize]);
    }

    #[test]
    fn idle_frames_suppressed_without_keepalive() {
        let config = LinkConfig {
            keepalive: false,
            ..LinkConfig::DEFAULT
        };
        let mut tx = Transmitter::new(&config);

        assert_eq!(collect_frame(&mut tx), [false; FRAME_SLOTS as usize]);
        assert!(!tx.is_framing());
    }

    #[test]
    fn short_period_keeps_a_gap() {
        let config = LinkConfig {
            frame_period: 3,
            ..LinkConfig::DEFAULT
        };
        let mut tx = Transmitter::new(&config);
        collect_frame(&mut tx);
        assert!(!tx.advance());
        assert!(tx.advance());
    }
}
