//! Line grammar for the operator console.
//!
//! The emulator (and any future serial console) feeds one line at a time
//! through [`parse_command`]. Keywords are matched case-insensitively and
//! numeric arguments are plain unsigned decimals; `winnow` does the
//! tokenizing so the parser stays allocation-free.

use core::fmt;

use winnow::ascii::{Uint, dec_uint, space0, space1};
use winnow::combinator::{eof, preceded, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{rest, take_while};

/// Parsed console command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    /// `start <seconds>`: arm for an explicit duration.
    Start(u32),
    /// `arm`: arm from the selected interval.
    Arm,
    /// `freeze <seconds>`: open a grace window.
    Freeze(u32),
    /// `extend`: add the selected interval.
    Extend,
    /// `next`: select the following interval.
    Next,
    /// `prev`: select the preceding interval.
    Prev,
    /// `select <index>`: select an interval slot.
    Select(usize),
    /// `text <message>`: overlay a message.
    Text(&'a str),
    /// `confirm <message>`: overlay a message and wait for it to expire.
    Confirm(&'a str),
    /// `wait <ms>`: keep the loop running for a while.
    Wait(u32),
    /// `status`: print a snapshot.
    Status,
    /// `log`: print retained telemetry.
    Log,
    /// `help`: list commands.
    Help,
}

/// Console keywords.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Keyword {
    Start,
    Arm,
    Freeze,
    Extend,
    Next,
    Prev,
    Select,
    Text,
    Confirm,
    Wait,
    Status,
    Log,
    Help,
}

impl Keyword {
    /// Every keyword, in help order.
    pub const ALL: [Keyword; 13] = [
        Keyword::Start,
        Keyword::Arm,
        Keyword::Freeze,
        Keyword::Extend,
        Keyword::Next,
        Keyword::Prev,
        Keyword::Select,
        Keyword::Text,
        Keyword::Confirm,
        Keyword::Wait,
        Keyword::Status,
        Keyword::Log,
        Keyword::Help,
    ];

    /// Keyword as typed.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Keyword::Start => "start",
            Keyword::Arm => "arm",
            Keyword::Freeze => "freeze",
            Keyword::Extend => "extend",
            Keyword::Next => "next",
            Keyword::Prev => "prev",
            Keyword::Select => "select",
            Keyword::Text => "text",
            Keyword::Confirm => "confirm",
            Keyword::Wait => "wait",
            Keyword::Status => "status",
            Keyword::Log => "log",
            Keyword::Help => "help",
        }
    }

    /// One-line usage summary.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Keyword::Start => "start <seconds>    - arm the countdown for an explicit duration",
            Keyword::Arm => "arm                - arm the countdown from the selected interval",
            Keyword::Freeze => "freeze <seconds>   - hold the countdown for a grace window",
            Keyword::Extend => "extend             - add the selected interval to the countdown",
            Keyword::Next => "next               - select the next interval",
            Keyword::Prev => "prev               - select the previous interval",
            Keyword::Select => "select <index>     - select an interval slot",
            Keyword::Text => "text <message>     - show a message overlay",
            Keyword::Confirm => "confirm <message>  - show a message and wait for it to clear",
            Keyword::Wait => "wait <ms>          - run the update loop for a while",
            Keyword::Status => "status             - print controller state",
            Keyword::Log => "log                - print retained telemetry",
            Keyword::Help => "help               - list commands",
        }
    }

    fn lookup(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|keyword| keyword.name().eq_ignore_ascii_case(word))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reasons a console line was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConsoleError<'a> {
    /// The line held nothing but whitespace.
    Empty,
    /// The first word is not a known keyword.
    UnknownCommand(&'a str),
    /// The keyword's argument was missing or malformed.
    InvalidArgument(Keyword),
}

impl fmt::Display for ConsoleError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Empty => f.write_str("empty command"),
            ConsoleError::UnknownCommand(word) => write!(f, "unknown command `{word}`"),
            ConsoleError::InvalidArgument(keyword) => {
                write!(f, "invalid argument, usage: {}", keyword.usage())
            }
        }
    }
}

/// Parses one console line.
pub fn parse_command(line: &str) -> Result<Command<'_>, ConsoleError<'_>> {
    let mut input = line.trim();
    if input.is_empty() {
        return Err(ConsoleError::Empty);
    }

    let head = word
        .parse_next(&mut input)
        .map_err(|_| ConsoleError::UnknownCommand(input))?;
    let keyword = Keyword::lookup(head).ok_or(ConsoleError::UnknownCommand(head))?;

    let parsed = match keyword {
        Keyword::Start => number.map(Command::Start).parse(input),
        Keyword::Freeze => number.map(Command::Freeze).parse(input),
        Keyword::Wait => number.map(Command::Wait).parse(input),
        Keyword::Select => number.map(Command::Select).parse(input),
        Keyword::Text => message.map(Command::Text).parse(input),
        Keyword::Confirm => message.map(Command::Confirm).parse(input),
        Keyword::Arm => bare(Command::Arm).parse(input),
        Keyword::Extend => bare(Command::Extend).parse(input),
        Keyword::Next => bare(Command::Next).parse(input),
        Keyword::Prev => bare(Command::Prev).parse(input),
        Keyword::Status => bare(Command::Status).parse(input),
        Keyword::Log => bare(Command::Log).parse(input),
        Keyword::Help => bare(Command::Help).parse(input),
    };

    parsed.map_err(|_| ConsoleError::InvalidArgument(keyword))
}

fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)
}

fn number<N: Uint>(input: &mut &str) -> ModalResult<N> {
    terminated(preceded(space1, dec_uint), (space0, eof)).parse_next(input)
}

fn message<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(space1, rest)
        .verify(|text: &str| !text.trim().is_empty())
        .map(str::trim)
        .parse_next(input)
}

fn bare<'a>(command: Command<'a>) -> impl Parser<&'a str, Command<'a>, ErrMode<ContextError>> {
    (space0, eof).value(command)
}
