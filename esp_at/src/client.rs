use embassy_time::{Duration, Instant};

use crate::{
    command::{Arg, Invocation},
    config::OkCutoff,
    helpers::{LossyStr, SliceExt, WHITESPACE},
    response::{self, Line, Lines, Terminal, Terminals, MAX_LINES},
    timer::{Clock, Ticker},
    CommandError, Config, Error, Failure, Transport,
};

/// What a single exchange waits for.
#[derive(Debug, Clone, Copy)]
struct Policy {
    terminals: Terminals,
    timeout: Option<Duration>,
    ok_cutoff: OkCutoff,
}

/// Lines collected for one exchange, and what they said so far.
struct Reply {
    lines: Lines,
    okay: bool,
    received: usize,
    last: Option<Terminal>,
    overflowed: bool,
}

impl Reply {
    fn new() -> Self {
        Self {
            lines: Lines::new(),
            okay: false,
            received: 0,
            last: None,
            overflowed: false,
        }
    }
}

/// Client responsible for sending commands to the module and collecting
/// its reply lines, one command at a time.
///
/// Every reply is read in two phases. A first, short window catches the
/// quick acknowledgement of control commands. Commands that produced output
/// but no `OK` within that window (scans, joins) get an escalated wait
/// that ends on `OK`, `FAIL` or the caller's timeout.
pub struct Client<T, C> {
    transport: T,
    clock: C,
    config: Config,
}

impl<T, C> Client<T, C>
where
    T: Transport,
    C: Clock,
{
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Release the transport and clock.
    pub fn release(self) -> (T, C) {
        (self.transport, self.clock)
    }

    /// Send a bare command. Returns whether the module acknowledged it with
    /// `OK`.
    pub fn test(&mut self, cmd: &str) -> Result<bool, Error> {
        Ok(self.invoke(&Invocation::test(cmd))?.okay)
    }

    /// Send `cmd` and return its output without the echo and status lines.
    pub fn execute(&mut self, cmd: &str, timeout: Option<Duration>) -> Result<Lines, Error> {
        let reply = self.invoke(&Invocation::execute(cmd).timeout(timeout))?;
        Ok(response::to_owned(response::body(&reply.lines)?))
    }

    /// Send `cmd?` and return the line carrying the queried value.
    pub fn query(&mut self, cmd: &str, timeout: Option<Duration>) -> Result<Line, Error> {
        let reply = self.invoke(&Invocation::query(cmd).timeout(timeout))?;
        Ok(response::value_line(&reply.lines)?.clone())
    }

    /// Send `cmd=<args>` and return the informational body of the reply.
    pub fn set(
        &mut self,
        cmd: &str,
        args: &[Arg<'_>],
        timeout: Option<Duration>,
    ) -> Result<Lines, Error> {
        let reply = self.invoke(&Invocation::set(cmd, args).timeout(timeout))?;
        Ok(response::to_owned(response::body(&reply.lines)?))
    }

    /// Send an invocation and return every line collected for it, echo and
    /// status lines included.
    pub fn send(&mut self, invocation: &Invocation<'_>) -> Result<Lines, Error> {
        Ok(self.invoke(invocation)?.lines)
    }

    /// Write a raw data payload, as requested by an `AT+CIPSEND` prompt,
    /// and wait for `SEND OK`.
    pub fn transmit(&mut self, payload: &[u8], timeout: Option<Duration>) -> Result<Lines, Error> {
        let policy = Policy {
            terminals: Terminals::SEND,
            timeout,
            ok_cutoff: self.config.ok_cutoff,
        };
        Ok(self.exchange(payload, policy)?.lines)
    }

    fn invoke(&mut self, invocation: &Invocation<'_>) -> Result<Reply, Error> {
        let cmd = invocation.encode()?;
        self.discard_stale()?;

        let policy = Policy {
            terminals: Terminals::COMMAND,
            timeout: invocation.timeout,
            ok_cutoff: invocation.ok_cutoff.unwrap_or(self.config.ok_cutoff),
        };
        self.exchange(&cmd, policy)
    }

    /// Throw away lines nobody asked for, e.g. leftovers of a command that
    /// timed out or unsolicited status messages.
    fn discard_stale(&mut self) -> Result<(), Error> {
        for _ in 0..MAX_LINES {
            if !self.transport.data_available()? {
                break;
            }
            let line = self.transport.read_line()?;
            debug!("Discarding stale line: {:?}", LossyStr(line.trim_end(WHITESPACE)));
        }
        Ok(())
    }

    fn exchange(&mut self, bytes: &[u8], policy: Policy) -> Result<Reply, Error> {
        let start = self.clock.now();
        if bytes.len() < 50 {
            debug!(
                "{} us - TX: {:?}",
                self.elapsed_us(start),
                LossyStr(bytes.trim_end(WHITESPACE))
            );
        } else {
            debug!(
                "{} us - TX: long payload ({} bytes)",
                self.elapsed_us(start),
                bytes.len()
            );
        }
        self.transport.write(bytes)?;

        let mut reply = Reply::new();

        let mut ticker = Ticker::new(self.config.response_polls, self.config.poll_interval);
        loop {
            let received = self.receive_available(&mut reply, &policy, start)?;
            if reply.okay && received == 0 && policy.ok_cutoff == OkCutoff::Quiet {
                ticker.cancel();
            }
            if !ticker.wait(&mut self.clock) {
                break;
            }
        }
        self.receive_available(&mut reply, &policy, start)?;

        if reply.received == 0 {
            warn!(
                "{} us - RX timeout of answer after sending AT command!",
                self.elapsed_us(start)
            );
            return Ok(reply);
        }

        let last = reply.last;
        match last {
            Some(Terminal::Error) => return Err(CommandError::Rejected.into()),
            Some(Terminal::Fail) => return Err(Failure::Module.into()),
            Some(Terminal::Ok) => reply.okay = true,
            None if !reply.okay => self.escalate(&mut reply, &policy, start)?,
            None => {}
        }

        if reply.overflowed {
            return Err(Error::Overflow);
        }
        Ok(reply)
    }

    /// Wait for commands that yield output without a quick `OK` and only
    /// resolve later.
    fn escalate(&mut self, reply: &mut Reply, policy: &Policy, start: Instant) -> Result<(), Error> {
        let polls = self.config.escalated_polls_for(policy.timeout);
        debug!(
            "{} us - No 'OK' yet, waiting up to {} more polls",
            self.elapsed_us(start),
            polls
        );

        let mut ticker = Ticker::new(polls, self.config.poll_interval);
        while ticker.wait(&mut self.clock) {
            for _ in 0..MAX_LINES {
                if !self.transport.data_available()? {
                    break;
                }
                match self.receive_line(reply, policy, start)? {
                    Some(Terminal::Ok) => return Ok(()),
                    Some(Terminal::Fail) => return Err(Failure::Module.into()),
                    Some(Terminal::Error) => return Err(CommandError::Rejected.into()),
                    None => {}
                }
            }
        }

        warn!(
            "{} us - RX timeout occured and no 'OK' received!",
            self.elapsed_us(start)
        );
        Ok(())
    }

    /// Read every line that is available right now. Returns the number of
    /// lines read.
    fn receive_available(
        &mut self,
        reply: &mut Reply,
        policy: &Policy,
        start: Instant,
    ) -> Result<usize, Error> {
        let mut received = 0;
        while received < MAX_LINES && self.transport.data_available()? {
            self.receive_line(reply, policy, start)?;
            received += 1;
        }
        Ok(received)
    }

    fn receive_line(
        &mut self,
        reply: &mut Reply,
        policy: &Policy,
        start: Instant,
    ) -> Result<Option<Terminal>, Error> {
        let raw = self.transport.read_line()?;
        let content = raw.trim_end(WHITESPACE);
        debug!("{} us - RX: {:?}", self.elapsed_us(start), LossyStr(content));

        let terminal = policy.terminals.classify(content);
        if terminal == Some(Terminal::Ok) {
            debug!("{} us - 'OK' received!", self.elapsed_us(start));
            reply.okay = true;
        }
        reply.last = terminal;
        reply.received += 1;

        let line = Line::from_slice(content).map_err(|_| Error::Overflow)?;
        if reply.lines.push(line).is_err() && !reply.overflowed {
            error!("Response exceeds {} lines, dropping the rest", MAX_LINES);
            reply.overflowed = true;
        }
        Ok(terminal)
    }

    fn elapsed_us(&self, start: Instant) -> u64 {
        self.clock
            .now()
            .as_micros()
            .saturating_sub(start.as_micros())
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }
}
