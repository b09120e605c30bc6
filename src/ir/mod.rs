//! Beat-clocked infrared link carrying a 4-bit button state between two nodes.
//!
//! A frame is six framing slots, one per beat: start, four data bits MSB first, stop. The
//! emitter carries the 38 kHz carrier during start and stop and during every data slot whose
//! bit is 0. The detector output is idle high and goes low while carrier is seen.
//!
//! Each interrupt source has one handler here:
//! - framing timer: [`beat`]
//! - button edge: [`press`]
//! - detector edge: [`Receiver::on_edge`]
//! - slot sampler: [`sample`]

mod carrier;
mod debounce;
mod peer;
mod receiver;
mod transmitter;

use static_assertions::assert_eq_size;

pub use self::{
    carrier::CarrierGate,
    debounce::DebounceBank,
    peer::{Peer, PeerStateHolder},
    receiver::{Receiver, RxHardware, RxPosition},
    transmitter::{frame_slots, Transmitter, FRAME_SLOTS},
};

/// Number of data bits in a frame
pub const STATE_BITS: u8 = 4;

/// Number of buttons feeding the transmitter
pub const BUTTONS: usize = 4;

/// The value a node transmits: nothing pressed, or which button was.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    #[default]
    Idle = 0,
    Button1 = 1,
    Button2 = 2,
    Button3 = 3,
    Button4 = 4,
}

// Handlers at different priorities read these; a single byte can't be observed half-written.
assert_eq_size!(State, u8);
assert_eq_size!(Peer, u8);

impl State {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Button1),
            2 => Some(Self::Button2),
            3 => Some(Self::Button3),
            4 => Some(Self::Button4),
            _ => None,
        }
    }

    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// One of the four local buttons
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    One,
    Two,
    Three,
    Four,
}

impl Button {
    /// Priority order when several edges are pending at once
    pub const ALL: [Self; BUTTONS] = [Self::One, Self::Two, Self::Three, Self::Four];

    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
            Self::Three => 2,
            Self::Four => 3,
        }
    }

    /// The state a press of this button selects
    pub const fn state(self) -> State {
        match self {
            Self::One => State::Button1,
            Self::Two => State::Button2,
            Self::Three => State::Button3,
            Self::Four => State::Button4,
        }
    }
}

/// Why the receiver dropped a frame
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// No carrier half a slot after the falling edge: a glitch, not a start bit
    NoStart,
    /// No carrier in the stop slot
    NoStop,
    /// Carrier still present after the stop slot
    NoIdle,
    /// The four data bits don't name a state
    BadCode(u8),
}

/// Framing timer handler. Returns the transmit flag for the carrier loop.
///
/// The order matters: debounce counters decay before the next button edge can be judged, and
/// the peer ages on every beat whether or not a frame is in flight.
pub fn beat(
    tx: &mut Transmitter,
    debounce: &mut DebounceBank,
    peer: &mut PeerStateHolder,
) -> bool {
    let transmit = tx.advance();
    debounce.decay();
    tx.decay_hold();
    peer.on_beat();
    transmit
}

/// Button edge handler. Returns whether the edge was honored.
pub fn press(tx: &mut Transmitter, debounce: &mut DebounceBank, button: Button) -> bool {
    if debounce.try_accept(button.index()) {
        tx.select(button.state());
        true
    } else {
        false
    }
}

/// Slot sampler handler. A completed frame goes straight to the peer holder.
pub fn sample(
    rx: &mut Receiver,
    peer: &mut PeerStateHolder,
    line_high: bool,
    hw: &mut impl RxHardware,
) -> Option<Result<State, FrameError>> {
    let outcome = rx.on_sample(line_high, hw);
    if let Some(Ok(state)) = outcome {
        peer.publish(state);
    }
    outcome
}
