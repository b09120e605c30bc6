use super::BUTTONS;
use crate::config::LinkConfig;

/// One countdown per button. An edge only counts while its button's counter reads zero.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceBank {
    counters: [u16; BUTTONS],
    window: u16,
}

impl DebounceBank {
    pub const fn new(config: &LinkConfig) -> Self {
        Self {
            counters: [0; BUTTONS],
            window: config.debounce_window,
        }
    }

    /// One beat passed
    pub fn decay(&mut self) {
        for counter in &mut self.counters {
            *counter = counter.saturating_sub(1);
        }
    }

    /// Honors an edge on `button` if it is not being debounced, and starts a new window
    ///
    /// Out of range buttons are never honored.
    pub fn try_accept(&mut self, button: usize) -> bool {
        match self.counters.get_mut(button) {
            Some(counter) if *counter == 0 => {
                *counter = self.window;
                true
            }
            _ => false,
        }
    }

    pub fn remaining(&self, button: usize) -> u16 {
        self.counters.get(button).copied().unwrap_or(0)
    }
}
