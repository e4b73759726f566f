mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use session::{HostClock, Session, SessionClock, SessionOptions, SimClock};
use switch_core::controller::StatusBoard;

const USAGE: &str =
    "Usage: switch-emulator [--interval <index>] [--transcript <path>] [--simulated]";

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let board = StatusBoard::new();
    if options.simulated {
        run(Session::new(&board, SimClock::new(), &options)?)
    } else {
        run(Session::new(&board, HostClock::new(), &options)?)
    }
}

fn run<C: SessionClock>(mut session: Session<'_, C>) -> io::Result<()> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Countdown switch emulator ready. Type `help` for commands or `exit` to quit."
    )?;
    for response in session.boot()? {
        writeln!(writer, "{response}")?;
    }

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed)? {
            writeln!(writer, "{response}")?;
        }

        if session.is_closed() {
            writeln!(writer, "Session closed.")?;
            break;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options(args: impl IntoIterator<Item = String>) -> Result<SessionOptions, String> {
    let mut options = SessionOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };

        match flag.as_str() {
            "--interval" => {
                let value = inline
                    .or_else(|| args.next())
                    .ok_or("Expected value after --interval")?;
                options.interval = value
                    .parse()
                    .map_err(|_| format!("Invalid interval slot `{value}`"))?;
            }
            "--transcript" => {
                let value = inline
                    .or_else(|| args.next())
                    .ok_or("Expected value after --transcript")?;
                options.transcript = Some(PathBuf::from(value));
            }
            "--simulated" => options.simulated = true,
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn options_accept_split_and_inline_values() {
        let options =
            parse_options(args(&["--interval", "2", "--transcript=out/run.log"])).unwrap();
        assert_eq!(options.interval, 2);
        assert_eq!(options.transcript, Some(PathBuf::from("out/run.log")));
        assert!(!options.simulated);
    }

    #[test]
    fn options_reject_unknown_flags() {
        assert!(parse_options(args(&["--profile", "x"])).is_err());
        assert!(parse_options(args(&["--interval"])).is_err());
        assert!(parse_options(args(&["--interval", "two"])).is_err());
    }
}
