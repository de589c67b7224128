use core::fmt::Write as _;

use embassy_time::Duration;
use heapless::{String, Vec};

use crate::{config::OkCutoff, CommandError, Error};

/// Longest command line, including its arguments and the line terminator.
pub const MAX_CMD_LEN: usize = 256;

/// Line terminator every AT command must end with.
pub const LINE_TERM: &[u8] = b"\r\n";

/// A single argument of a set type command.
///
/// Text is sent inside double quotes, integers as plain decimal digits. The
/// module's parser does not accept whitespace outside of quoted strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Text(&'a str),
    Int(i64),
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Text(s)
    }
}

macro_rules! int_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg<'_> {
                fn from(v: $t) -> Self {
                    Arg::Int(i64::from(v))
                }
            }
        )*
    };
}

int_arg!(u8, u16, u32, i8, i16, i32, i64);

/// Join `args` the way set type commands expect them, e.g.
/// `"myssid",10`.
pub fn join_args<const N: usize>(args: &[Arg<'_>]) -> Result<String<N>, Error> {
    let mut out = String::new();
    write_args(&mut out, args)?;
    Ok(out)
}

fn write_args<const N: usize>(out: &mut String<N>, args: &[Arg<'_>]) -> Result<(), Error> {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(',').map_err(|_| Error::Overflow)?;
        }
        let written = match arg {
            Arg::Text(s) => write!(out, "\"{}\"", s),
            Arg::Int(v) => write!(out, "{}", v),
        };
        written.map_err(|_| Error::Overflow)?;
    }
    Ok(())
}

/// How a command is invoked, which decides its suffix on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind<'a> {
    /// Bare command, e.g. `AT`
    Test,
    /// `cmd?`
    Query,
    /// `cmd=arg,arg,...`
    Set(&'a [Arg<'a>]),
    /// Bare command expecting multi-line output, e.g. `AT+CWLAP`
    Execute,
}

/// A command together with how and how long to wait for its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub cmd: &'a str,
    pub kind: Kind<'a>,
    /// Escalated wait for replies without a quick `OK`. `None` or zero
    /// uses the configured default.
    pub timeout: Option<Duration>,
    /// Overrides [`Config::ok_cutoff`](crate::Config::ok_cutoff) for this
    /// invocation.
    pub ok_cutoff: Option<OkCutoff>,
}

impl<'a> Invocation<'a> {
    pub const fn new(cmd: &'a str, kind: Kind<'a>) -> Self {
        Self {
            cmd,
            kind,
            timeout: None,
            ok_cutoff: None,
        }
    }

    pub const fn test(cmd: &'a str) -> Self {
        Self::new(cmd, Kind::Test)
    }

    pub const fn query(cmd: &'a str) -> Self {
        Self::new(cmd, Kind::Query)
    }

    pub const fn set(cmd: &'a str, args: &'a [Arg<'a>]) -> Self {
        Self::new(cmd, Kind::Set(args))
    }

    pub const fn execute(cmd: &'a str) -> Self {
        Self::new(cmd, Kind::Execute)
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn ok_cutoff(mut self, cutoff: OkCutoff) -> Self {
        self.ok_cutoff = Some(cutoff);
        self
    }

    /// The complete command line, terminator included.
    pub fn encode(&self) -> Result<Vec<u8, MAX_CMD_LEN>, Error> {
        if self.cmd.is_empty() {
            return Err(CommandError::Empty.into());
        }

        let mut line: String<MAX_CMD_LEN> = String::new();
        line.push_str(self.cmd).map_err(|_| Error::Overflow)?;
        match self.kind {
            Kind::Test | Kind::Execute => {}
            Kind::Query => line.push('?').map_err(|_| Error::Overflow)?,
            Kind::Set(args) => {
                line.push('=').map_err(|_| Error::Overflow)?;
                write_args(&mut line, args)?;
            }
        }

        let mut bytes = Vec::new();
        bytes
            .extend_from_slice(line.as_bytes())
            .map_err(|_| Error::Overflow)?;
        bytes
            .extend_from_slice(LINE_TERM)
            .map_err(|_| Error::Overflow)?;
        Ok(bytes)
    }
}
