//! Cooperative update loop tying the state machines together.
//!
//! [`SwitchController`] owns every component of the device and advances them
//! in a fixed order from [`SwitchController::run_once`]: countdown first, so
//! an expiry is acted on before anything else, then the indicator, then the
//! display. The watchdog is fed at the end of every pass. The integrator's
//! main loop does nothing but call `run_once` and react to operator input.
//!
//! Values the display needs are published into a [`StatusBoard`] before each
//! refresh; the display pulls them back out through [`StatusSource`].

use core::cell::Cell;
use core::fmt;

use embedded_hal::digital::OutputPin;

use crate::config::{ControllerConfig, INTERVAL_SLOTS};
use crate::countdown::{CountdownSwitch, SwitchState, Tick};
use crate::display::{Refresh, RenderTarget, StatusDisplay, StatusSource};
use crate::indicator::{IndicatorLight, IndicatorMode};
use crate::selector::BoundedSelector;
use crate::telemetry::{TelemetryEvent, TelemetryLog};
use crate::time::{Clock, Watchdog};

/// Selector over the available countdown intervals, in minutes.
pub type IntervalSelector = BoundedSelector<u16, INTERVAL_SLOTS>;

/// Hardware failure surfaced by the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControllerError {
    /// Writing the power line failed.
    PowerLine,
    /// Writing the indicator line failed.
    Indicator,
    /// The render target rejected a frame.
    Display,
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::PowerLine => f.write_str("power line write failed"),
            ControllerError::Indicator => f.write_str("indicator write failed"),
            ControllerError::Display => f.write_str("display refresh failed"),
        }
    }
}

/// Single-context mailbox the display reads its values from.
#[derive(Debug, Default)]
pub struct StatusBoard {
    remaining: Cell<i32>,
    selected: Cell<usize>,
    interval: Cell<u16>,
}

impl StatusBoard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: Cell::new(0),
            selected: Cell::new(0),
            interval: Cell::new(0),
        }
    }

    /// Replaces every published value.
    pub fn publish(&self, remaining: i32, selected: usize, interval: u16) {
        self.remaining.set(remaining);
        self.selected.set(selected);
        self.interval.set(interval);
    }
}

impl StatusSource for StatusBoard {
    fn remaining_seconds(&self) -> i32 {
        self.remaining.get()
    }

    fn selected_index(&self) -> usize {
        self.selected.get()
    }

    fn interval_minutes(&self) -> u16 {
        self.interval.get()
    }
}

/// Components handed to [`SwitchController::new`].
pub struct ControllerParts<SP, LP, C, R, W> {
    pub power: CountdownSwitch<SP, C>,
    pub indicator: IndicatorLight<LP, C>,
    pub target: R,
    pub intervals: IntervalSelector,
    pub watchdog: W,
}

/// Point-in-time view of the controller for status reporting.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerSnapshot {
    pub remaining: i32,
    pub state: SwitchState,
    pub grace: u32,
    pub indicator: IndicatorMode,
    pub shining: bool,
    pub interval_index: usize,
    pub interval_minutes: u16,
    pub overlay: bool,
}

impl fmt::Display for ControllerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            SwitchState::Armed => "armed",
            SwitchState::Frozen => "frozen",
            SwitchState::Terminal => "terminal",
        };
        let indicator = match self.indicator {
            IndicatorMode::Off => "off",
            IndicatorMode::On => "on",
            IndicatorMode::Blink => "blink",
        };
        let seconds = self.remaining.max(0);
        write!(
            f,
            "remaining={:02}:{:02} state={state} grace={}s indicator={indicator}{} interval=#{} {}min overlay={}",
            seconds / 60,
            seconds % 60,
            self.grace,
            if self.shining { "(lit)" } else { "" },
            self.interval_index,
            self.interval_minutes,
            if self.overlay { "yes" } else { "no" },
        )
    }
}

/// Owner of the countdown, indicator and display schedules.
pub struct SwitchController<'b, SP, LP, C, R, W> {
    power: CountdownSwitch<SP, C>,
    indicator: IndicatorLight<LP, C>,
    display: StatusDisplay<C, R, &'b StatusBoard>,
    intervals: IntervalSelector,
    watchdog: W,
    board: &'b StatusBoard,
    clock: C,
    config: ControllerConfig,
    telemetry: TelemetryLog,
    warning: bool,
}

impl<'b, SP, LP, C, R, W> SwitchController<'b, SP, LP, C, R, W>
where
    SP: OutputPin,
    LP: OutputPin,
    C: Clock + Clone,
    R: RenderTarget,
    W: Watchdog,
{
    /// Assembles a controller; the display reads from `board`.
    #[must_use]
    pub fn new(
        parts: ControllerParts<SP, LP, C, R, W>,
        clock: C,
        board: &'b StatusBoard,
        config: ControllerConfig,
    ) -> Self {
        let ControllerParts {
            power,
            indicator,
            target,
            intervals,
            watchdog,
        } = parts;

        let controller = Self {
            power,
            indicator,
            display: StatusDisplay::with_refresh_period(
                clock.clone(),
                target,
                board,
                config.display_refresh_ms,
            ),
            intervals,
            watchdog,
            board,
            clock,
            config,
            telemetry: TelemetryLog::new(),
            warning: false,
        };
        controller.publish();
        controller
    }

    /// Starts the countdown from the selected interval.
    pub fn arm(&mut self) -> Result<(), ControllerError> {
        self.arm_for(self.interval_seconds())
    }

    /// Starts the countdown with an explicit duration.
    pub fn arm_for(&mut self, seconds: i32) -> Result<(), ControllerError> {
        self.rearm(seconds)?;
        self.display
            .print_time_screen()
            .map_err(|_| ControllerError::Display)
    }

    /// Adds the selected interval to the remaining time.
    ///
    /// Also re-arms a countdown that has run out but not yet been cut off.
    pub fn extend(&mut self) -> Result<(), ControllerError> {
        let seconds = self
            .power
            .remaining()
            .max(0)
            .saturating_add(self.interval_seconds());
        self.rearm(seconds)?;
        self.overlay_interval()
    }

    /// Holds the countdown for the next `seconds` ticks.
    pub fn freeze(&mut self, seconds: u32) {
        self.power.freeze(seconds);
        self.record(TelemetryEvent::GraceStarted { seconds });
    }

    /// Steps to the neighbouring interval, wrapping at either end.
    ///
    /// Opens the settings grace window so the countdown does not run while
    /// the operator is choosing.
    pub fn cycle_interval(&mut self, forward: bool) -> Result<(), ControllerError> {
        if forward {
            self.intervals.next(true);
        } else {
            self.intervals.prev(true);
        }
        self.interval_changed()
    }

    /// Selects an interval slot directly.
    ///
    /// Returns `Ok(false)` without side effects when `index` is out of range.
    pub fn select_interval(&mut self, index: usize) -> Result<bool, ControllerError> {
        if !self.intervals.set_index(index) {
            return Ok(false);
        }
        self.interval_changed()?;
        Ok(true)
    }

    /// Shows `text` as an overlay for the configured duration.
    pub fn show_message(&mut self, text: &str) -> Result<(), ControllerError> {
        self.display
            .print_text(text)
            .map_err(|_| ControllerError::Display)?;
        self.start_overlay();
        Ok(())
    }

    /// Shows `text` and blocks until the overlay has expired.
    ///
    /// The countdown does not advance while this call blocks.
    pub fn confirm(&mut self, text: &str) -> Result<(), ControllerError> {
        self.show_message(text)?;
        self.display
            .do_freeze(&mut self.watchdog)
            .map_err(|_| ControllerError::Display)?;
        self.record(TelemetryEvent::OverlayExpired);
        Ok(())
    }

    /// One pass of the cooperative loop.
    ///
    /// # Never returns after expiry
    ///
    /// Once the countdown has reached zero this call cuts the power line and
    /// parks in the watchdog-fed hold loop.
    pub fn run_once(&mut self) -> Result<(), ControllerError> {
        let result = self.service();
        self.watchdog.feed();
        if let Err(error) = result {
            self.record(TelemetryEvent::Fault(error));
        }
        result
    }

    /// Returns `true` once the countdown has run out.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.power.is_expired()
    }

    /// Point-in-time status.
    #[must_use]
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            remaining: self.power.remaining(),
            state: self.power.state(),
            grace: self.power.frozen_for(),
            indicator: self.indicator.mode(),
            shining: self.indicator.is_shining(),
            interval_index: self.intervals.current_index(),
            interval_minutes: *self.intervals.current(),
            overlay: self.display.is_overlay_active(),
        }
    }

    #[must_use]
    pub fn countdown(&self) -> &CountdownSwitch<SP, C> {
        &self.power
    }

    #[must_use]
    pub fn indicator(&self) -> &IndicatorLight<LP, C> {
        &self.indicator
    }

    #[must_use]
    pub fn display(&self) -> &StatusDisplay<C, R, &'b StatusBoard> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut StatusDisplay<C, R, &'b StatusBoard> {
        &mut self.display
    }

    #[must_use]
    pub fn intervals(&self) -> &IntervalSelector {
        &self.intervals
    }

    #[must_use]
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn service(&mut self) -> Result<(), ControllerError> {
        match self.power.update(&mut self.watchdog) {
            Tick::Idle => {}
            Tick::Countdown { remaining } => {
                self.record(TelemetryEvent::CountdownTick { remaining });
            }
            Tick::Grace { remaining } => self.record(TelemetryEvent::GraceTick { remaining }),
        }

        self.apply_warning()?;
        self.indicator
            .update()
            .map_err(|_| ControllerError::Indicator)?;

        self.publish();
        let refresh = self
            .display
            .update()
            .map_err(|_| ControllerError::Display)?;
        if refresh == Refresh::OverlayExpired {
            self.record(TelemetryEvent::OverlayExpired);
        }
        Ok(())
    }

    fn apply_warning(&mut self) -> Result<(), ControllerError> {
        let remaining = self.power.remaining();
        if self.warning || !self.config.in_warning_band(remaining) {
            return Ok(());
        }

        self.indicator
            .blink(self.config.warning_blink_ms)
            .map_err(|_| ControllerError::Indicator)?;
        self.warning = true;
        self.record(TelemetryEvent::WarningStarted { remaining });
        Ok(())
    }

    fn rearm(&mut self, seconds: i32) -> Result<(), ControllerError> {
        self.power
            .start(seconds)
            .map_err(|_| ControllerError::PowerLine)?;
        self.warning = false;
        self.indicator
            .on()
            .map_err(|_| ControllerError::Indicator)?;
        self.record(TelemetryEvent::CountdownArmed { seconds });
        self.publish();
        Ok(())
    }

    fn interval_changed(&mut self) -> Result<(), ControllerError> {
        self.freeze(self.config.settings_grace_s);
        self.record(TelemetryEvent::IntervalSelected {
            index: self.intervals.current_index(),
            minutes: *self.intervals.current(),
        });
        self.publish();
        self.overlay_interval()
    }

    fn overlay_interval(&mut self) -> Result<(), ControllerError> {
        self.display
            .print_interval()
            .map_err(|_| ControllerError::Display)?;
        self.start_overlay();
        Ok(())
    }

    fn start_overlay(&mut self) {
        let duration = self.config.overlay_ms;
        self.display.freeze(duration);
        self.record(TelemetryEvent::OverlayStarted { duration });
    }

    fn interval_seconds(&self) -> i32 {
        i32::from(*self.intervals.current()) * 60
    }

    fn publish(&self) {
        self.board.publish(
            self.power.remaining(),
            self.intervals.current_index(),
            *self.intervals.current(),
        );
    }

    fn record(&mut self, event: TelemetryEvent) {
        let now = self.clock.now();
        self.telemetry.record(now, event);
    }
}
