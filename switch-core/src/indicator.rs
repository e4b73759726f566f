//! Status LED with steady and blinking modes.

use embedded_hal::digital::{OutputPin, PinState};

use crate::level::ActiveLevel;
use crate::time::{Clock, Millis};

/// Operating mode of an [`IndicatorLight`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndicatorMode {
    Off,
    On,
    Blink,
}

/// Single-line indicator driven from the cooperative loop.
///
/// In [`IndicatorMode::Blink`] the line toggles every `blink_interval`
/// milliseconds, measured from the previous toggle, whenever
/// [`IndicatorLight::update`] is polled.
pub struct IndicatorLight<P, C> {
    pin: P,
    polarity: ActiveLevel,
    clock: C,
    mode: IndicatorMode,
    shining: bool,
    blink_interval: Millis,
    toggled_at: Millis,
}

impl<P, C> IndicatorLight<P, C>
where
    P: OutputPin,
    C: Clock,
{
    /// Claims `pin` and drives it to `initial`.
    ///
    /// The starting mode is [`IndicatorMode::On`] when `initial` matches the
    /// active level and [`IndicatorMode::Off`] otherwise.
    pub fn new(
        mut pin: P,
        polarity: ActiveLevel,
        initial: PinState,
        clock: C,
    ) -> Result<Self, P::Error> {
        pin.set_state(initial)?;
        let shining = polarity.is_asserted(initial);
        let toggled_at = clock.now();

        Ok(Self {
            pin,
            polarity,
            clock,
            mode: if shining {
                IndicatorMode::On
            } else {
                IndicatorMode::Off
            },
            shining,
            blink_interval: 0,
            toggled_at,
        })
    }

    /// Steady on.
    pub fn on(&mut self) -> Result<(), P::Error> {
        self.drive(true)?;
        self.mode = IndicatorMode::On;
        Ok(())
    }

    /// Steady off.
    pub fn off(&mut self) -> Result<(), P::Error> {
        self.drive(false)?;
        self.mode = IndicatorMode::Off;
        Ok(())
    }

    /// Starts blinking with the given half-period, lit first.
    pub fn blink(&mut self, interval: Millis) -> Result<(), P::Error> {
        let now = self.clock.now();
        self.drive(true)?;
        self.toggled_at = now;
        self.blink_interval = interval;
        self.mode = IndicatorMode::Blink;
        Ok(())
    }

    /// Advances the blink schedule. Does nothing outside blink mode.
    pub fn update(&mut self) -> Result<(), P::Error> {
        if self.mode != IndicatorMode::Blink {
            return Ok(());
        }

        if self.clock.since(self.toggled_at) > self.blink_interval {
            let now = self.clock.now();
            self.drive(!self.shining)?;
            self.toggled_at = now;
        }
        Ok(())
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> IndicatorMode {
        self.mode
    }

    /// Returns `true` while the line sits at its active level.
    #[must_use]
    pub const fn is_shining(&self) -> bool {
        self.shining
    }

    /// Half-period used by the most recent [`IndicatorLight::blink`] call.
    #[must_use]
    pub const fn blink_interval(&self) -> Millis {
        self.blink_interval
    }

    fn drive(&mut self, on: bool) -> Result<(), P::Error> {
        self.pin.set_state(self.polarity.level_for(on))?;
        self.shining = on;
        Ok(())
    }
}
