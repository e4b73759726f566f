//! Countdown timer that owns the controlled power line.
//!
//! The switch holds the power output active while time remains and cuts it
//! once the countdown reaches zero. Cutting power is final: the switch parks
//! the CPU in a loop that keeps re-asserting the inactive level and feeding
//! the watchdog, so nothing scheduled afterwards can turn the load back on.
//! Only a power cycle (or an explicit [`CountdownSwitch::start`] before the
//! cutoff is reached) brings the output back.

use embedded_hal::digital::OutputPin;

use crate::level::ActiveLevel;
use crate::time::{Clock, Millis, Watchdog};

/// Length of one countdown step.
pub const TICK_MS: Millis = 1_000;

/// Observable phase of a [`CountdownSwitch`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SwitchState {
    /// Time remains and the countdown is running.
    Armed,
    /// Time remains but a grace window holds the countdown.
    Frozen,
    /// Time is up; the next update cuts power for good.
    Terminal,
}

/// What a single [`CountdownSwitch::update`] call consumed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tick {
    /// Less than a full second passed; nothing changed.
    Idle,
    /// One second was taken off the countdown.
    Countdown { remaining: i32 },
    /// One second was taken off the grace window instead.
    Grace { remaining: u32 },
}

/// Countdown timer driving the power output.
pub struct CountdownSwitch<P, C> {
    pin: P,
    polarity: ActiveLevel,
    clock: C,
    remaining: i32,
    ticked_at: Millis,
    frozen: u32,
}

impl<P, C> CountdownSwitch<P, C>
where
    P: OutputPin,
    C: Clock,
{
    /// Claims `pin` and holds the load off until [`CountdownSwitch::start`].
    pub fn new(mut pin: P, polarity: ActiveLevel, clock: C) -> Result<Self, P::Error> {
        pin.set_state(polarity.released())?;
        let ticked_at = clock.now();

        Ok(Self {
            pin,
            polarity,
            clock,
            remaining: 0,
            ticked_at,
            frozen: 0,
        })
    }

    /// Arms the countdown with `seconds` and switches the load on.
    ///
    /// Valid from any state; a pending grace window is left as is.
    pub fn start(&mut self, seconds: i32) -> Result<(), P::Error> {
        self.remaining = seconds;
        self.ticked_at = self.clock.now();
        self.pin.set_state(self.polarity.asserted())
    }

    /// Holds the countdown for the next `seconds` ticks.
    ///
    /// Replaces any grace window that is still running.
    pub fn freeze(&mut self, seconds: u32) {
        self.frozen = seconds;
    }

    /// Seconds left before the power is cut.
    #[must_use]
    pub const fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Seconds left in the current grace window.
    #[must_use]
    pub const fn frozen_for(&self) -> u32 {
        self.frozen
    }

    /// Current phase.
    #[must_use]
    pub const fn state(&self) -> SwitchState {
        if self.remaining <= 0 {
            SwitchState::Terminal
        } else if self.frozen > 0 {
            SwitchState::Frozen
        } else {
            SwitchState::Armed
        }
    }

    /// Returns `true` once the countdown has run out.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining <= 0
    }

    /// Advances the countdown by at most one second.
    ///
    /// # Never returns after expiry
    ///
    /// When no time remains this call performs the terminal cutoff and does
    /// not return; see [`CountdownSwitch::cut_off`].
    pub fn update<W>(&mut self, watchdog: &mut W) -> Tick
    where
        W: Watchdog + ?Sized,
    {
        if self.is_expired() {
            self.cut_off(watchdog);
        }

        if self.clock.since(self.ticked_at) < TICK_MS {
            return Tick::Idle;
        }

        self.ticked_at = self.clock.now();
        if self.frozen > 0 {
            self.frozen -= 1;
            Tick::Grace {
                remaining: self.frozen,
            }
        } else {
            self.remaining -= 1;
            Tick::Countdown {
                remaining: self.remaining,
            }
        }
    }

    /// Cuts the power line and holds it off forever.
    ///
    /// Each pass re-drives the inactive level and feeds the watchdog, so the
    /// board neither resets nor lets the output drift back on.
    pub fn cut_off<W>(&mut self, watchdog: &mut W) -> !
    where
        W: Watchdog + ?Sized,
    {
        let off = self.polarity.released();
        loop {
            // There is nobody left to report a write failure to; retry on the next pass.
            let _ = self.pin.set_state(off);
            watchdog.feed();
        }
    }
}
