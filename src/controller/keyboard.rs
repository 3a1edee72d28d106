// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level as TraceLevel};

use super::Event;

const RECORD: &str = "rec";
const STOP: &str = "stop";
const SAVE: &str = "save";
const PLAY: &str = "play";
const LOOP: &str = "loop";
const PAUSE: &str = "pause";
const LIST: &str = "list";
const DELETE: &str = "delete";
const STATUS: &str = "status";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unrecognized command {0:?}")]
    Unrecognized(String),

    #[error("{command}: bad argument {argument:?}")]
    BadArgument {
        command: &'static str,
        argument: String,
    },

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),
}

/// Parses a line of keyboard input. Blank lines parse to None.
pub fn parse_command(input: &str) -> Result<Option<Event>, CommandError> {
    let lowered = input.trim().to_lowercase();
    let mut words = lowered.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    let extra = words.next().is_some();

    let (name, event) = match command {
        RECORD => (
            RECORD,
            Event::Record(argument.map(|a| parse_arg(RECORD, a)).transpose()?),
        ),
        STOP => (STOP, Event::Stop),
        SAVE => (SAVE, Event::Save),
        PLAY => (
            PLAY,
            Event::Play(argument.map(|a| parse_arg(PLAY, a)).transpose()?),
        ),
        LOOP => (LOOP, Event::Loop),
        PAUSE => (
            PAUSE,
            Event::Pause(parse_arg(
                PAUSE,
                argument.ok_or(CommandError::MissingArgument(PAUSE))?,
            )?),
        ),
        LIST => (LIST, Event::List),
        DELETE => (
            DELETE,
            Event::Delete(parse_arg(
                DELETE,
                argument.ok_or(CommandError::MissingArgument(DELETE))?,
            )?),
        ),
        STATUS => (STATUS, Event::Status),
        _ => return Err(CommandError::Unrecognized(command.to_string())),
    };

    let takes_argument = matches!(name, RECORD | PLAY | PAUSE | DELETE);
    if extra || (!takes_argument && argument.is_some()) {
        return Err(CommandError::TooManyArguments(name));
    }
    Ok(Some(event))
}

fn parse_arg<T: std::str::FromStr>(command: &'static str, argument: &str) -> Result<T, CommandError> {
    argument.parse().map_err(|_| CommandError::BadArgument {
        command,
        argument: argument.to_string(),
    })
}

/// A driver that reads recorder commands from the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Prompts for and handles one line of input. Returns false once the input is exhausted.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} [high|low], {}, {}, {} [N], {}, {} <ms>, {}, {} <N>, {}): ",
            RECORD, STOP, SAVE, PLAY, LOOP, PAUSE, LIST, DELETE, STATUS,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        match parse_command(&input) {
            Ok(Some(event)) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            Ok(None) => {}
            Err(CommandError::Unrecognized(command)) => {
                warn!(input = command, "Unrecognized input");
            }
            Err(e) => {
                writeln!(writer, "{}", e)?;
                warn!(err = %e, "Bad command");
            }
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(TraceLevel::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            info!("Keyboard input closed.");
            Ok(())
        })
    }
}
