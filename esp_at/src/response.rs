use heapless::Vec;

use crate::{helpers::SliceExt, Error};

/// Longest line kept from a reply. Longer lines are truncated by the
/// transport.
pub const MAX_LINE_LEN: usize = 128;

/// Maximum number of lines collected for one invocation.
pub const MAX_LINES: usize = 64;

/// A single reply line with its line ending stripped.
pub type Line = Vec<u8, MAX_LINE_LEN>;

/// The lines collected for one invocation, in arrival order.
pub type Lines = Vec<Line, MAX_LINES>;

/// Exact, case sensitive terminal tokens ending a wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminals {
    pub ok: &'static [u8],
    pub error: &'static [u8],
    pub fail: &'static [u8],
}

impl Terminals {
    /// `OK` / `ERROR` / `FAIL`, as used by every command reply.
    pub const COMMAND: Self = Self {
        ok: b"OK",
        error: b"ERROR",
        fail: b"FAIL",
    };

    /// Outcome of a data payload written after an `AT+CIPSEND` prompt.
    pub const SEND: Self = Self {
        ok: b"SEND OK",
        error: b"ERROR",
        fail: b"SEND FAIL",
    };

    pub(crate) fn classify(&self, line: &[u8]) -> Option<Terminal> {
        let line = line.trim(crate::helpers::WHITESPACE);
        if line == self.ok {
            Some(Terminal::Ok)
        } else if line == self.error {
            Some(Terminal::Error)
        } else if line == self.fail {
            Some(Terminal::Fail)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminal {
    Ok,
    Error,
    Fail,
}

/// Echo line plus status line.
const MIN_REPLY_LINES: usize = 2;

fn check_len(lines: &[Line]) -> Result<(), Error> {
    if lines.len() < MIN_REPLY_LINES {
        return Err(Error::ResponseTooShort {
            expected: MIN_REPLY_LINES,
            received: lines.len(),
        });
    }
    Ok(())
}

/// The line carrying a queried value, sandwiched between the echo and the
/// status line.
pub fn value_line(lines: &[Line]) -> Result<&Line, Error> {
    check_len(lines)?;
    Ok(&lines[1])
}

/// Everything but the echo line and the trailing blank and status lines.
///
/// Replies of two or three lines have an empty body.
pub fn body(lines: &[Line]) -> Result<&[Line], Error> {
    check_len(lines)?;
    let end = (lines.len() - 2).max(1);
    Ok(&lines[1..end])
}

/// Copy `lines` into a fresh collection.
pub(crate) fn to_owned(lines: &[Line]) -> Lines {
    lines.iter().cloned().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn lines(raw: &[&str]) -> Lines {
        raw.iter()
            .map(|l| Line::from_slice(l.as_bytes()).unwrap())
            .collect()
    }

    #[test]
    fn terminal_tokens_are_exact() {
        let t = Terminals::COMMAND;
        assert_eq!(t.classify(b"OK\r\n"), Some(Terminal::Ok));
        assert_eq!(t.classify(b"ERROR"), Some(Terminal::Error));
        assert_eq!(t.classify(b"FAIL\n"), Some(Terminal::Fail));
        assert_eq!(t.classify(b"ok"), None);
        assert_eq!(t.classify(b"SEND OK"), None);
        assert_eq!(Terminals::SEND.classify(b"SEND OK\r\n"), Some(Terminal::Ok));
        assert_eq!(Terminals::SEND.classify(b"OK"), None);
    }

    #[test]
    fn value_line_is_second_line() {
        let reply = lines(&["AT+CWMODE?", "+CWMODE:1", "", "OK"]);
        assert_eq!(value_line(&reply).unwrap().as_slice(), b"+CWMODE:1");
    }

    #[test]
    fn short_replies_are_typed_errors() {
        let empty = Lines::new();
        assert_eq!(
            value_line(&empty),
            Err(Error::ResponseTooShort {
                expected: 2,
                received: 0
            })
        );
        assert_eq!(
            body(&lines(&["AT"])),
            Err(Error::ResponseTooShort {
                expected: 2,
                received: 1
            })
        );
    }

    #[test]
    fn body_strips_echo_and_status() {
        let reply = lines(&["AT+CWLAP", "+CWLAP:(0,\"a\",-1,\"m\",1)", "", "OK"]);
        assert_eq!(body(&reply).unwrap().len(), 1);
        assert!(body(&lines(&["AT", "OK"])).unwrap().is_empty());
        assert!(body(&lines(&["AT", "", "OK"])).unwrap().is_empty());
    }
}
