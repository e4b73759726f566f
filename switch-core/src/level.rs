//! Output polarity shared by the indicator and the power line.

use embedded_hal::digital::PinState;

/// Electrical level that means "on" for a given output line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

impl ActiveLevel {
    /// Pin state that switches the line on.
    #[must_use]
    pub const fn asserted(self) -> PinState {
        match self {
            ActiveLevel::High => PinState::High,
            ActiveLevel::Low => PinState::Low,
        }
    }

    /// Pin state that switches the line off.
    #[must_use]
    pub const fn released(self) -> PinState {
        match self {
            ActiveLevel::High => PinState::Low,
            ActiveLevel::Low => PinState::High,
        }
    }

    /// Pin state for the requested logical condition.
    #[must_use]
    pub const fn level_for(self, on: bool) -> PinState {
        if on { self.asserted() } else { self.released() }
    }

    /// Returns `true` when `state` switches the line on.
    #[must_use]
    pub fn is_asserted(self, state: PinState) -> bool {
        state == self.asserted()
    }
}
