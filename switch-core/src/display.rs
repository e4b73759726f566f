//! Status screen refresh scheduler.
//!
//! The steady-state screen shows the remaining time as `MM:SS` next to a
//! circled digit naming the selected interval slot. Callers can replace it
//! with another screen (interval summary, free text) for a bounded overlay
//! window; once the window runs out the scheduler falls back to the time
//! screen on its own.
//!
//! Drawing goes through [`RenderTarget`], a thin buffered-canvas interface
//! the firmware implements on top of its OLED driver. The values shown are
//! pulled from a [`StatusSource`] on every redraw.

use core::fmt::Write;

use heapless::String;

use crate::config::DISPLAY_REFRESH_MS;
use crate::time::{Clock, Millis, Watchdog};

/// Baseline origin for the large text line.
pub const TEXT_ORIGIN: (i32, i32) = (5, 30);
/// Origin of the selected-slot glyph in the top-right corner.
pub const GLYPH_ORIGIN: (i32, i32) = (112, 15);
/// Code point preceding DINGBAT CIRCLED SANS-SERIF DIGIT ONE (U+2780).
pub const GLYPH_BASE: u32 = 0x277F;

const LINE_CAPACITY: usize = 16;

/// Fonts the status screens use.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Font {
    /// Tall numeric/text font filling the screen height.
    Large,
    /// Symbol font holding the circled-digit glyphs.
    Symbols,
}

/// Buffered drawing surface.
///
/// Drawing calls only touch the frame buffer; nothing reaches the panel
/// until [`RenderTarget::present`].
pub trait RenderTarget {
    /// Driver-specific failure.
    type Error;

    /// Blanks the frame buffer.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Selects the font used by subsequent text and glyph calls.
    fn select_font(&mut self, font: Font);

    /// Draws `text` with its baseline starting at (`x`, `y`).
    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), Self::Error>;

    /// Draws a single glyph identified by its Unicode code point.
    fn draw_glyph(&mut self, x: i32, y: i32, codepoint: u32) -> Result<(), Self::Error>;

    /// Pushes the frame buffer to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Values shown on the status screens.
pub trait StatusSource {
    /// Seconds left on the countdown.
    fn remaining_seconds(&self) -> i32;

    /// Index of the selected interval slot.
    fn selected_index(&self) -> usize;

    /// Length of the selected interval in minutes.
    fn interval_minutes(&self) -> u16;
}

impl<T> StatusSource for &T
where
    T: StatusSource + ?Sized,
{
    fn remaining_seconds(&self) -> i32 {
        (**self).remaining_seconds()
    }

    fn selected_index(&self) -> usize {
        (**self).selected_index()
    }

    fn interval_minutes(&self) -> u16 {
        (**self).interval_minutes()
    }
}

/// [`StatusSource`] assembled from three accessor closures.
pub struct FnSource<T, I, V> {
    time: T,
    index: I,
    interval: V,
}

impl<T, I, V> FnSource<T, I, V>
where
    T: Fn() -> i32,
    I: Fn() -> usize,
    V: Fn() -> u16,
{
    #[must_use]
    pub const fn new(time: T, index: I, interval: V) -> Self {
        Self {
            time,
            index,
            interval,
        }
    }
}

impl<T, I, V> StatusSource for FnSource<T, I, V>
where
    T: Fn() -> i32,
    I: Fn() -> usize,
    V: Fn() -> u16,
{
    fn remaining_seconds(&self) -> i32 {
        (self.time)()
    }

    fn selected_index(&self) -> usize {
        (self.index)()
    }

    fn interval_minutes(&self) -> u16 {
        (self.interval)()
    }
}

/// Result of a [`StatusDisplay::update`] poll.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Refresh {
    /// Nothing was drawn.
    Idle,
    /// The time screen was redrawn on schedule.
    Redrawn,
    /// An overlay ran out and the time screen took over again.
    OverlayExpired,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Overlay {
    started_at: Millis,
    duration: Millis,
}

/// Refresh scheduler for the status screen.
pub struct StatusDisplay<C, R, S> {
    clock: C,
    target: R,
    source: S,
    refresh_period: Millis,
    refreshed_at: Option<Millis>,
    overlay: Option<Overlay>,
}

impl<C, R, S> StatusDisplay<C, R, S>
where
    C: Clock,
    R: RenderTarget,
    S: StatusSource,
{
    /// Creates a scheduler refreshing every [`DISPLAY_REFRESH_MS`].
    #[must_use]
    pub const fn new(clock: C, target: R, source: S) -> Self {
        Self::with_refresh_period(clock, target, source, DISPLAY_REFRESH_MS)
    }

    /// Creates a scheduler with a custom refresh period.
    #[must_use]
    pub const fn with_refresh_period(
        clock: C,
        target: R,
        source: S,
        refresh_period: Millis,
    ) -> Self {
        Self {
            clock,
            target,
            source,
            refresh_period,
            refreshed_at: None,
            overlay: None,
        }
    }

    /// Draws the countdown and the selected-slot glyph.
    ///
    /// Restarts the refresh period.
    pub fn print_time_screen(&mut self) -> Result<(), R::Error> {
        self.refreshed_at = Some(self.clock.now());

        let seconds = self.source.remaining_seconds().max(0);
        let mut line: String<LINE_CAPACITY> = String::new();
        // Capacity covers the widest i32 minute count.
        let _ = write!(line, "{:02}:{:02}", seconds / 60, seconds % 60);

        let (x, y) = TEXT_ORIGIN;
        let (glyph_x, glyph_y) = GLYPH_ORIGIN;
        self.target.clear()?;
        self.target.select_font(Font::Large);
        self.target.draw_text(x, y, &line)?;
        self.target.select_font(Font::Symbols);
        self.target
            .draw_glyph(glyph_x, glyph_y, slot_glyph(self.source.selected_index()))?;
        self.target.present()
    }

    /// Draws the `+<n> min` interval summary.
    pub fn print_interval(&mut self) -> Result<(), R::Error> {
        let mut line: String<LINE_CAPACITY> = String::new();
        let _ = write!(line, "+{} min", self.source.interval_minutes());
        self.render_line(&line)
    }

    /// Draws a free-form line of text.
    pub fn print_text(&mut self, text: &str) -> Result<(), R::Error> {
        self.render_line(text)
    }

    /// Keeps the current screen up for `duration` milliseconds.
    ///
    /// A zero duration cancels any pending overlay.
    pub fn freeze(&mut self, duration: Millis) {
        self.overlay = (duration > 0).then(|| Overlay {
            started_at: self.clock.now(),
            duration,
        });
    }

    /// Redraws the time screen when due.
    ///
    /// Polls closer together than the refresh period are ignored. While an
    /// overlay is pending the time screen stays hidden; the first due poll
    /// after the overlay runs out drops it and redraws exactly once.
    pub fn update(&mut self) -> Result<Refresh, R::Error> {
        if let Some(at) = self.refreshed_at
            && self.clock.since(at) < self.refresh_period
        {
            return Ok(Refresh::Idle);
        }

        if let Some(overlay) = self.overlay {
            if self.clock.since(overlay.started_at) <= overlay.duration {
                return Ok(Refresh::Idle);
            }
            self.overlay = None;
            self.print_time_screen()?;
            return Ok(Refresh::OverlayExpired);
        }

        self.print_time_screen()?;
        Ok(Refresh::Redrawn)
    }

    /// Blocks until the pending overlay expires.
    ///
    /// Returns after at most the overlay duration plus one refresh period,
    /// feeding `watchdog` on every pass. Returns immediately when no overlay
    /// is pending.
    pub fn do_freeze<W>(&mut self, watchdog: &mut W) -> Result<(), R::Error>
    where
        W: Watchdog + ?Sized,
    {
        while self.overlay.is_some() {
            watchdog.feed();
            self.update()?;
        }
        Ok(())
    }

    /// Returns `true` while an overlay hides the time screen.
    #[must_use]
    pub const fn is_overlay_active(&self) -> bool {
        self.overlay.is_some()
    }

    /// Configured refresh period.
    #[must_use]
    pub const fn refresh_period(&self) -> Millis {
        self.refresh_period
    }

    /// Underlying render target.
    #[must_use]
    pub const fn target(&self) -> &R {
        &self.target
    }

    /// Mutable access to the render target.
    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    fn render_line(&mut self, text: &str) -> Result<(), R::Error> {
        let (x, y) = TEXT_ORIGIN;
        self.target.clear()?;
        self.target.select_font(Font::Large);
        self.target.draw_text(x, y, text)?;
        self.target.present()
    }
}

/// Circled-digit code point for a zero-based slot index.
#[must_use]
pub fn slot_glyph(index: usize) -> u32 {
    let offset = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
    GLYPH_BASE.saturating_add(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;

    struct TestClock(Cell<Millis>);

    impl Clock for TestClock {
        fn now(&self) -> Millis {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct Canvas {
        presents: u32,
        font: Option<Font>,
        text: String<LINE_CAPACITY>,
        glyph: Option<u32>,
    }

    impl RenderTarget for Canvas {
        type Error = Infallible;

        fn clear(&mut self) -> Result<(), Self::Error> {
            self.text.clear();
            self.glyph = None;
            Ok(())
        }

        fn select_font(&mut self, font: Font) {
            self.font = Some(font);
        }

        fn draw_text(&mut self, _: i32, _: i32, text: &str) -> Result<(), Self::Error> {
            assert_eq!(self.font, Some(Font::Large));
            self.text.clear();
            let _ = self.text.push_str(text);
            Ok(())
        }

        fn draw_glyph(&mut self, _: i32, _: i32, codepoint: u32) -> Result<(), Self::Error> {
            assert_eq!(self.font, Some(Font::Symbols));
            self.glyph = Some(codepoint);
            Ok(())
        }

        fn present(&mut self) -> Result<(), Self::Error> {
            self.presents += 1;
            Ok(())
        }
    }

    fn source(seconds: i32) -> FnSource<impl Fn() -> i32, impl Fn() -> usize, impl Fn() -> u16> {
        FnSource::new(move || seconds, || 2, || 45)
    }

    #[test]
    fn time_screen_formats_minutes_and_seconds() {
        let clock = TestClock(Cell::new(0));
        let mut display = StatusDisplay::new(&clock, Canvas::default(), source(754));

        display.print_time_screen().unwrap();
        assert_eq!(display.target().text.as_str(), "12:34");
        assert_eq!(display.target().glyph, Some(0x2782));
        assert_eq!(display.target().presents, 1);
    }

    #[test]
    fn negative_time_renders_as_zero() {
        let clock = TestClock(Cell::new(0));
        let mut display = StatusDisplay::new(&clock, Canvas::default(), source(-3));

        display.print_time_screen().unwrap();
        assert_eq!(display.target().text.as_str(), "00:00");
    }

    #[test]
    fn interval_and_text_screens_skip_the_glyph() {
        let clock = TestClock(Cell::new(0));
        let mut display = StatusDisplay::new(&clock, Canvas::default(), source(60));

        display.print_interval().unwrap();
        assert_eq!(display.target().text.as_str(), "+45 min");
        assert_eq!(display.target().glyph, None);

        display.print_text("SET").unwrap();
        assert_eq!(display.target().text.as_str(), "SET");
        assert_eq!(display.target().presents, 2);
    }

    #[test]
    fn first_update_draws_immediately() {
        let clock = TestClock(Cell::new(5_000));
        let mut display = StatusDisplay::new(&clock, Canvas::default(), source(60));

        assert_eq!(display.update().unwrap(), Refresh::Redrawn);
        clock.0.set(5_199);
        assert_eq!(display.update().unwrap(), Refresh::Idle);
        clock.0.set(5_200);
        assert_eq!(display.update().unwrap(), Refresh::Redrawn);
        assert_eq!(display.target().presents, 2);
    }

    #[test]
    fn zero_length_freeze_cancels_overlay() {
        let clock = TestClock(Cell::new(0));
        let mut display = StatusDisplay::new(&clock, Canvas::default(), source(60));

        display.freeze(1_000);
        assert!(display.is_overlay_active());
        display.freeze(0);
        assert!(!display.is_overlay_active());
    }

    #[test]
    fn glyph_offsets_start_at_circled_one() {
        assert_eq!(slot_glyph(0), 0x2780);
        assert_eq!(slot_glyph(3), 0x2783);
    }
}
