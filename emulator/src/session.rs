use std::cell::Cell;
use std::convert::Infallible;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant as HostInstant};

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use switch_core::config::{ControllerConfig, DEFAULT_INTERVALS_MIN};
use switch_core::console::{Command, Keyword, parse_command};
use switch_core::controller::{ControllerParts, IntervalSelector, StatusBoard, SwitchController};
use switch_core::countdown::CountdownSwitch;
use switch_core::display::{Font, RenderTarget};
use switch_core::indicator::IndicatorLight;
use switch_core::level::ActiveLevel;
use switch_core::telemetry::EventId;
use switch_core::time::{Clock, Millis, Watchdog};

/// Pause between two passes of the update loop during `wait`.
const POLL_INTERVAL_MS: Millis = 10;

/// Time source the session runs on.
pub trait SessionClock: Clock + Clone {
    /// Lets `millis` pass between two loop passes.
    fn pause(&self, millis: Millis);
}

/// Wall clock measured from session start.
#[derive(Copy, Clone, Debug)]
pub struct HostClock {
    origin: HostInstant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            origin: HostInstant::now(),
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostClock {
    // The core's millisecond counter wraps at `u32::MAX` by contract.
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

impl SessionClock for HostClock {
    fn pause(&self, millis: Millis) {
        thread::sleep(Duration::from_millis(u64::from(millis)));
    }
}

/// Simulated clock: every reading costs one millisecond and pauses jump
/// ahead instantly.
#[derive(Clone, Debug, Default)]
pub struct SimClock {
    now: Rc<Cell<Millis>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Millis {
        let now = self.now.get();
        self.now.set(now.wrapping_add(1));
        now
    }
}

impl SessionClock for SimClock {
    fn pause(&self, millis: Millis) {
        self.now.set(self.now.get().wrapping_add(millis));
    }
}

/// Output line whose level the session can inspect.
#[derive(Clone, Debug)]
pub struct HostPin {
    level: Rc<Cell<PinState>>,
}

impl HostPin {
    fn new() -> Self {
        Self {
            level: Rc::new(Cell::new(PinState::Low)),
        }
    }

    fn is_high(&self) -> bool {
        self.level.get() == PinState::High
    }
}

impl ErrorType for HostPin {
    type Error = Infallible;
}

impl OutputPin for HostPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(PinState::High);
        Ok(())
    }
}

/// Render target that turns every presented frame into one line of text.
#[derive(Debug, Default)]
pub struct TextPanel {
    text: String,
    glyph: Option<char>,
    frames: Vec<String>,
}

impl TextPanel {
    fn take_frames(&mut self) -> Vec<String> {
        std::mem::take(&mut self.frames)
    }
}

impl RenderTarget for TextPanel {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.text.clear();
        self.glyph = None;
        Ok(())
    }

    fn select_font(&mut self, _font: Font) {}

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) -> Result<(), Self::Error> {
        self.text.push_str(text);
        Ok(())
    }

    fn draw_glyph(&mut self, _x: i32, _y: i32, codepoint: u32) -> Result<(), Self::Error> {
        self.glyph = Some(char::from_u32(codepoint).unwrap_or('?'));
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        let frame = match self.glyph {
            Some(glyph) => format!("{:<8} {glyph}", self.text),
            None => self.text.clone(),
        };
        self.frames.push(frame);
        Ok(())
    }
}

/// Watchdog stand-in that only counts feeds.
#[derive(Debug, Default)]
pub struct CountingWatchdog {
    feeds: u64,
}

impl Watchdog for CountingWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Launch options taken from the command line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionOptions {
    pub interval: usize,
    pub transcript: Option<PathBuf>,
    pub simulated: bool,
}

type HostController<'b, C> =
    SwitchController<'b, HostPin, HostPin, C, TextPanel, CountingWatchdog>;

pub struct Session<'b, C: SessionClock> {
    controller: HostController<'b, C>,
    clock: C,
    power_line: HostPin,
    indicator_line: HostPin,
    transcript: Option<TranscriptLogger>,
    started_at: HostInstant,
    last_event: Option<EventId>,
    closed: bool,
}

impl<'b, C: SessionClock> Session<'b, C> {
    /// Builds the device model with the chosen interval slot selected.
    pub fn new(board: &'b StatusBoard, clock: C, options: &SessionOptions) -> io::Result<Self> {
        let transcript = options
            .transcript
            .as_deref()
            .map(TranscriptLogger::new)
            .transpose()?;

        let power_line = HostPin::new();
        let indicator_line = HostPin::new();
        let Ok(power) = CountdownSwitch::new(power_line.clone(), ActiveLevel::High, clock.clone());
        let Ok(indicator) = IndicatorLight::new(
            indicator_line.clone(),
            ActiveLevel::High,
            PinState::Low,
            clock.clone(),
        );

        let mut intervals = IntervalSelector::from_values(DEFAULT_INTERVALS_MIN);
        if !intervals.set_index(options.interval) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "interval slot {} out of range (0..{})",
                    options.interval,
                    intervals.capacity()
                ),
            ));
        }

        let parts = ControllerParts {
            power,
            indicator,
            target: TextPanel::default(),
            intervals,
            watchdog: CountingWatchdog::default(),
        };
        let controller = SwitchController::new(parts, clock.clone(), board, ControllerConfig::new());

        Ok(Self {
            controller,
            clock,
            power_line,
            indicator_line,
            transcript,
            started_at: HostInstant::now(),
            last_event: None,
            closed: false,
        })
    }

    /// Arms the countdown the way the device does at power-up.
    pub fn boot(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        let minutes = *self.controller.intervals().current();
        match self.controller.arm() {
            Ok(()) => lines.push(format!("OK armed for {minutes} min")),
            Err(error) => lines.push(format!("ERR {error}")),
        }
        self.collect_output(&mut lines);
        self.record_output(&lines)?;
        Ok(lines)
    }

    /// Runs one console line and returns the lines to print.
    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append_line(self.started_at.elapsed(), TranscriptRole::Host, trimmed)?;
        }

        let mut lines = match parse_command(trimmed) {
            Ok(command) => self.execute(command),
            Err(error) => vec![format!("ERR {error}")],
        };
        self.collect_output(&mut lines);
        self.record_output(&lines)?;
        Ok(lines)
    }

    /// Returns `true` once the countdown has cut the power.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn execute(&mut self, command: Command<'_>) -> Vec<String> {
        if self.closed {
            return vec!["ERR power is cut; restart the emulator".to_string()];
        }

        let result = match command {
            Command::Start(seconds) => match i32::try_from(seconds) {
                Ok(seconds) => self
                    .controller
                    .arm_for(seconds)
                    .map(|()| format!("OK armed for {seconds} s")),
                Err(_) => return vec![format!("ERR {seconds} s does not fit the countdown")],
            },
            Command::Arm => {
                let minutes = *self.controller.intervals().current();
                self.controller
                    .arm()
                    .map(|()| format!("OK armed for {minutes} min"))
            }
            Command::Freeze(seconds) => {
                self.controller.freeze(seconds);
                Ok(format!("OK countdown held for {seconds} s"))
            }
            Command::Extend => self
                .controller
                .extend()
                .map(|()| format!("OK {} s left", self.controller.countdown().remaining())),
            Command::Next => self.controller.cycle_interval(true).map(|()| self.selected()),
            Command::Prev => self
                .controller
                .cycle_interval(false)
                .map(|()| self.selected()),
            Command::Select(index) => match self.controller.select_interval(index) {
                Ok(true) => Ok(self.selected()),
                Ok(false) => return vec![format!("ERR no interval slot {index}")],
                Err(error) => Err(error),
            },
            Command::Text(text) => self
                .controller
                .show_message(text)
                .map(|()| "OK".to_string()),
            Command::Confirm(text) => self
                .controller
                .confirm(text)
                .map(|()| "OK confirmed".to_string()),
            Command::Wait(millis) => return self.wait(millis),
            Command::Status => return vec![self.status()],
            Command::Log => return self.telemetry_dump(),
            Command::Help => return help_lines(),
        };

        vec![match result {
            Ok(line) => line,
            Err(error) => format!("ERR {error}"),
        }]
    }

    fn wait(&mut self, millis: Millis) -> Vec<String> {
        let mut lines = Vec::new();
        let started = self.clock.now();
        while self.clock.since(started) < millis {
            if self.controller.is_expired() {
                break;
            }
            if let Err(error) = self.controller.run_once() {
                lines.push(format!("ERR {error}"));
            }
            self.clock.pause(POLL_INTERVAL_MS);
        }

        if self.controller.is_expired() {
            self.closed = true;
            lines.push("countdown expired: power line cut, device parked".to_string());
        } else {
            lines.push(format!(
                "OK waited {millis} ms, {} s left",
                self.controller.countdown().remaining()
            ));
        }
        lines
    }

    fn selected(&self) -> String {
        let intervals = self.controller.intervals();
        format!(
            "OK interval #{} = {} min",
            intervals.current_index(),
            intervals.current()
        )
    }

    fn status(&self) -> String {
        let config = self.controller.config();
        format!(
            "{} power={} led={} feeds={} refresh={}ms",
            self.controller.snapshot(),
            on_off(self.power_line.is_high()),
            on_off(self.indicator_line.is_high()),
            self.controller.watchdog().feeds,
            config.display_refresh_ms,
        )
    }

    fn telemetry_dump(&self) -> Vec<String> {
        let telemetry = self.controller.telemetry();
        if telemetry.is_empty() {
            return vec!["no telemetry recorded".to_string()];
        }
        telemetry
            .oldest_first()
            .map(|record| format!("log   | {record}"))
            .collect()
    }

    fn collect_output(&mut self, lines: &mut Vec<String>) {
        for frame in self.controller.display_mut().target_mut().take_frames() {
            lines.push(format!("frame | {frame}"));
        }
        for record in self.controller.telemetry().after(self.last_event) {
            lines.push(format!("event | {record}"));
            self.last_event = Some(record.id);
        }
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let elapsed = self.started_at.elapsed();
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(elapsed, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn on_off(high: bool) -> &'static str {
    if high { "on" } else { "off" }
}

fn help_lines() -> Vec<String> {
    Keyword::ALL
        .iter()
        .map(|keyword| keyword.usage().to_string())
        .chain(["exit | quit         - leave the emulator".to_string()])
        .collect()
}

struct TranscriptLogger {
    writer: BufWriter<fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Countdown switch emulator transcript")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
