use super::State;
use crate::config::LinkConfig;

/// What is known about the other node.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peer {
    /// Nothing received recently; distinct from a peer that reports [`State::Idle`]
    Lost,
    Present(State),
}

/// Keeps the last received state, ages it, and holds non-idle states on display.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerStateHolder {
    peer: Peer,
    /// Beats since the last good frame, saturating
    age: u16,
    silence_threshold: u16,
    shown: State,
    hold: u16,
    hold_reload: u16,
}

impl PeerStateHolder {
    pub const fn new(config: &LinkConfig) -> Self {
        Self {
            peer: Peer::Lost,
            age: 0,
            silence_threshold: config.silence_threshold,
            shown: State::Idle,
            hold: 0,
            hold_reload: config.hold,
        }
    }

    /// A frame arrived
    pub fn publish(&mut self, state: State) {
        self.peer = Peer::Present(state);
        self.age = 0;
    }

    /// One beat passed
    pub fn on_beat(&mut self) {
        self.age = self.age.saturating_add(1);
        if self.age > self.silence_threshold {
            self.peer = Peer::Lost;
        }

        match self.peer {
            Peer::Present(state) if !state.is_idle() => {
                self.shown = state;
                self.hold = self.hold_reload;
            }
            _ if self.hold == 0 => self.shown = State::Idle,
            _ => self.hold -= 1,
        }
    }

    #[inline]
    pub const fn peer(&self) -> Peer {
        self.peer
    }

    #[inline]
    pub const fn age(&self) -> u16 {
        self.age
    }

    /// The state the display should show, held for a while after the peer went idle or quiet
    #[inline]
    pub const fn shown(&self) -> State {
        self.shown
    }

    /// 0-4 for the display driver
    #[inline]
    pub const fn display_code(&self) -> u8 {
        self.shown.code()
    }
}
