//! Clock and watchdog capabilities consumed by the scheduler.
//!
//! The device counts milliseconds since boot in a `u32` that wraps after
//! roughly 49 days. Every timing decision in this crate is expressed as a
//! wrapping difference between two readings, never as a comparison of
//! absolute timestamps, so the wrap is invisible to the state machines.

/// Milliseconds since boot, wrapping at `u32::MAX`.
pub type Millis = u32;

/// Monotonic millisecond clock.
pub trait Clock {
    /// Returns the current reading.
    fn now(&self) -> Millis;

    /// Milliseconds elapsed since `mark`.
    fn since(&self, mark: Millis) -> Millis {
        elapsed(self.now(), mark)
    }
}

impl<T> Clock for &T
where
    T: Clock + ?Sized,
{
    fn now(&self) -> Millis {
        (**self).now()
    }
}

/// Wrapping difference between two clock readings.
#[must_use]
pub const fn elapsed(now: Millis, mark: Millis) -> Millis {
    now.wrapping_sub(mark)
}

/// Hardware watchdog that resets the device unless fed in time.
pub trait Watchdog {
    /// Restarts the watchdog countdown.
    fn feed(&mut self);
}

impl<W> Watchdog for &mut W
where
    W: Watchdog + ?Sized,
{
    fn feed(&mut self) {
        (**self).feed();
    }
}

/// Watchdog that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopWatchdog;

impl NoopWatchdog {
    /// Creates a new no-op watchdog.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Watchdog for NoopWatchdog {
    fn feed(&mut self) {}
}
