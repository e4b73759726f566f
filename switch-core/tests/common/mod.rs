#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin, PinState};
use switch_core::display::{Font, RenderTarget};
use switch_core::time::{Clock, Millis, Watchdog};

/// Clock the test moves by hand.
#[derive(Default)]
pub struct MockClock {
    now: Cell<Millis>,
}

impl MockClock {
    pub fn at(now: Millis) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    pub fn advance(&self, delta: Millis) {
        self.now.set(self.now.get().wrapping_add(delta));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// Clock that moves forward by a fixed step on every reading.
pub struct SteppingClock {
    now: Cell<Millis>,
    step: Millis,
}

impl SteppingClock {
    pub fn new(start: Millis, step: Millis) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    pub fn peek(&self) -> Millis {
        self.now.get()
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Millis {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}

/// Output line whose level is observable from the test.
pub struct MockPin<'a> {
    level: &'a Cell<PinState>,
    writes: &'a Cell<u32>,
}

impl<'a> MockPin<'a> {
    pub fn new(level: &'a Cell<PinState>, writes: &'a Cell<u32>) -> Self {
        Self { level, writes }
    }
}

impl ErrorType for MockPin<'_> {
    type Error = Infallible;
}

impl OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::Low);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::High);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Debug)]
pub struct PinFault;

impl Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output line that starts failing once `armed` is set.
pub struct FlakyPin<'a> {
    pub armed: &'a Cell<bool>,
}

impl ErrorType for FlakyPin<'_> {
    type Error = PinFault;
}

impl OutputPin for FlakyPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.armed.get() { Err(PinFault) } else { Ok(()) }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.armed.get() { Err(PinFault) } else { Ok(()) }
    }
}

/// Render target that keeps the text of every presented frame.
#[derive(Default)]
pub struct FrameLog {
    pending: String,
    glyph: Option<u32>,
    font: Option<Font>,
    pub frames: Vec<(String, Option<u32>)>,
    pub fail_present: bool,
}

impl FrameLog {
    pub fn last_text(&self) -> Option<&str> {
        self.frames.last().map(|(text, _)| text.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct PanelFault;

impl RenderTarget for FrameLog {
    type Error = PanelFault;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.pending.clear();
        self.glyph = None;
        Ok(())
    }

    fn select_font(&mut self, font: Font) {
        self.font = Some(font);
    }

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) -> Result<(), Self::Error> {
        self.pending.push_str(text);
        Ok(())
    }

    fn draw_glyph(&mut self, _x: i32, _y: i32, codepoint: u32) -> Result<(), Self::Error> {
        assert_eq!(self.font, Some(Font::Symbols), "glyphs need the symbol font");
        self.glyph = Some(codepoint);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        if self.fail_present {
            return Err(PanelFault);
        }
        self.frames.push((self.pending.clone(), self.glyph));
        Ok(())
    }
}

/// Watchdog that counts feeds.
#[derive(Default)]
pub struct CountingWatchdog {
    pub feeds: u32,
}

impl Watchdog for CountingWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Watchdog that checks the power line on every feed and bails out after
/// `limit` feeds so a diverging hold loop can be observed from a test.
pub struct HoldProbe<'a> {
    pub line: &'a Cell<PinState>,
    pub released: PinState,
    pub limit: u32,
    pub feeds: &'a RefCell<u32>,
}

impl Watchdog for HoldProbe<'_> {
    fn feed(&mut self) {
        assert_eq!(self.line.get(), self.released, "power line left active");
        let mut feeds = self.feeds.borrow_mut();
        *feeds += 1;
        if *feeds >= self.limit {
            panic!("power held off for {} feeds", *feeds);
        }
    }
}

/// Watchdog that lets passes through while the power line is on and bails
/// out after `limit` feeds with the line released.
pub struct CutoffWatch<'a> {
    pub line: &'a Cell<PinState>,
    pub released: PinState,
    pub limit: u32,
    pub held: u32,
}

impl Watchdog for CutoffWatch<'_> {
    fn feed(&mut self) {
        if self.line.get() != self.released {
            assert_eq!(self.held, 0, "power line re-asserted after cutoff");
            return;
        }
        self.held += 1;
        if self.held >= self.limit {
            panic!("power held off for {} feeds", self.held);
        }
    }
}
