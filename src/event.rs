use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

mod entities;
mod level;

pub use entities::{EventException, LogEvent};
pub use level::{LogLevel, UnknownLevel};

/// Errors raised while reading log events
#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("Failed to read events from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid event on line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a JSON-lines file into a vector of LogEvent structs
///
/// Blank lines are skipped; any other line must hold one JSON event object.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<LogEvent>, EventParseError> {
    let path = path.as_ref();
    let io_error = |source| EventParseError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let reader = BufReader::new(file);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_error)?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(parse_event_line(&line, index + 1)?);
    }

    Ok(events)
}

/// Parses a single JSON event (1-indexed line number used for error reporting)
pub fn parse_event_line(line: &str, line_number: usize) -> Result<LogEvent, EventParseError> {
    serde_json::from_str(line).map_err(|source| EventParseError::InvalidLine {
        line: line_number,
        source,
    })
}
