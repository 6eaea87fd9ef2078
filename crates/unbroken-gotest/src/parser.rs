// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Line parser for `go test -json` output
//!
//! The input is split on `\n` and every line is decoded as one [`Event`].
//! A single bad line fails the whole input. The empty segment after a
//! final newline is not a line, so a stream ending in `\n` (or an empty
//! stream) parses cleanly, while blank lines in the middle do not.
//!
//! # Example
//!
//! ```
//! use unbroken_gotest::parser::{EventReader, parse_events};
//!
//! let output = b"{\"Action\":\"run\",\"Test\":\"TestA\"}\n{\"Action\":\"pass\",\"Test\":\"TestA\"}\n";
//!
//! // Materialize everything
//! let events = parse_events(&output[..]).unwrap();
//! assert_eq!(events.len(), 2);
//!
//! // Or pull events one at a time
//! let mut reader = EventReader::new(&output[..]);
//! assert!(reader.next().unwrap().is_ok());
//! ```

use std::io::BufRead;

use tracing::debug;

use crate::error::GoTestError;
use crate::event::Event;

/// Parse a complete `go test -json` stream
///
/// # Errors
///
/// Returns `GoTestError::Decode` for the first line that is not a valid
/// event, or `GoTestError::Io` if the reader fails.
pub fn parse_events<R: BufRead>(reader: R) -> Result<Vec<Event>, GoTestError> {
    let events = EventReader::new(reader).collect::<Result<Vec<_>, _>>()?;
    debug!(events = events.len(), "parsed go test output");
    Ok(events)
}

/// Parse a single line of `go test -json` output
///
/// # Errors
///
/// Returns `GoTestError::Decode` if the line is not a valid event.
pub fn parse_line(line: &[u8], line_number: usize) -> Result<Event, GoTestError> {
    serde_json::from_slice(line).map_err(|source| GoTestError::Decode {
        line: line_number,
        source,
    })
}

/// Lazy iterator over the events of a `go test -json` stream
///
/// Yields at most one error, after which it is exhausted.
pub struct EventReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    done: bool,
}

impl<R: BufRead> EventReader<R> {
    /// Create a reader over a buffered stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.line
    }

    fn fail(&mut self, err: GoTestError) -> Option<Result<Event, GoTestError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event, GoTestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(read) => read,
            Err(err) => return self.fail(err.into()),
        };

        // Nothing after the last newline
        if read == 0 {
            self.done = true;
            return None;
        }

        self.line += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }

        match parse_line(&self.buf, self.line) {
            Ok(event) => Some(Ok(event)),
            Err(err) => self.fail(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Action;
    use similar_asserts::assert_eq;

    #[test]
    fn test_parse_trailing_newline() {
        let output = "{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"TestA\"}\n\
                      {\"Action\":\"pass\",\"Package\":\"p\",\"Test\":\"TestA\"}\n";
        let events = parse_events(output.as_bytes()).expect("Should parse");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, Action::Run);
        assert_eq!(events[1].action, Action::Pass);
    }

    #[test]
    fn test_parse_without_trailing_newline() {
        let output = "{\"Action\":\"run\"}\n{\"Action\":\"pass\"}";
        let events = parse_events(output.as_bytes()).expect("Should parse");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_parse_empty_output() {
        let events = parse_events(&b""[..]).expect("Should parse empty");
        assert!(events.is_empty());
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let output = "{\"Action\":\"run\"}\r\n{\"Action\":\"pass\"}\r\n";
        let events = parse_events(output.as_bytes()).expect("Should parse");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_events(&b"not json"[..]);
        assert!(matches!(result, Err(GoTestError::Decode { line: 1, .. })));
    }

    #[test]
    fn test_parse_invalid_line_in_middle() {
        let output = "{\"Action\":\"run\"}\n{\"Action\":\n{\"Action\":\"pass\"}\n";
        let err = parse_events(output.as_bytes()).expect_err("Should fail");
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_parse_blank_line_in_middle() {
        let output = "{\"Action\":\"run\"}\n\n{\"Action\":\"pass\"}\n";
        let err = parse_events(output.as_bytes()).expect_err("Should fail");
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_parse_double_trailing_newline() {
        let output = "{\"Action\":\"run\"}\n\n";
        let err = parse_events(output.as_bytes()).expect_err("Should fail");
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let output: &[u8] = b"{\"Action\":\"\xff\"}\n";
        assert!(parse_events(output).is_err());
    }

    #[test]
    fn test_reader_stops_after_error() {
        let output = "garbage\n{\"Action\":\"pass\"}\n";
        let mut reader = EventReader::new(output.as_bytes());

        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
        assert_eq!(reader.lines_read(), 1);
    }

    #[test]
    fn test_reader_is_lazy() {
        let output = "{\"Action\":\"run\"}\n{\"Action\":\"pass\"}\nbroken";
        let mut reader = EventReader::new(output.as_bytes());

        let first = reader.next().expect("Should yield").expect("Should parse");
        assert_eq!(first.action, Action::Run);
        assert_eq!(reader.lines_read(), 1);
    }
}
