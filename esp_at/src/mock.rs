//! Scripted transport, virtual clock and serial port for unit tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::String;
use std::sync::Once;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embedded_io::ErrorType;

use crate::{
    response::{Line, MAX_LINE_LEN},
    Client, Clock, Config, Error, Transport,
};

static INIT: Once = Once::new();

pub fn setup_log() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .is_test(true)
            .init();
    });
}

/// Virtual clock, only moved forward by sleeping.
#[derive(Clone, Default)]
pub struct MockClock {
    now_us: Rc<Cell<u64>>,
    sleeps: Rc<Cell<u32>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now_us.get())
    }

    fn sleep(&mut self, duration: Duration) {
        self.now_us.set(self.now_us.get() + duration.as_micros());
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

type Script = Vec<(u64, Vec<u8>)>;

fn terminated(line: &str) -> Vec<u8> {
    let mut bytes = line.as_bytes().to_vec();
    bytes.extend_from_slice(b"\r\n");
    bytes
}

/// Transport replaying one script of reply lines per write.
///
/// Lines of a script become available at their offset, in milliseconds of
/// virtual time, after the write that consumed the script.
pub struct MockTransport {
    clock: MockClock,
    scripts: Rc<RefCell<VecDeque<Script>>>,
    pending: Rc<RefCell<VecDeque<(u64, Vec<u8>)>>>,
    written: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.written.borrow_mut().push(bytes.to_vec());
        let now = self.clock.now().as_micros();
        if let Some(script) = self.scripts.borrow_mut().pop_front() {
            let mut pending = self.pending.borrow_mut();
            for (offset_ms, line) in script {
                pending.push_back((now + offset_ms * 1000, line));
            }
        }
        Ok(())
    }

    fn data_available(&mut self) -> Result<bool, Error> {
        let now = self.clock.now().as_micros();
        Ok(self
            .pending
            .borrow()
            .front()
            .map_or(false, |(due, _)| *due <= now))
    }

    fn read_line(&mut self) -> Result<Line, Error> {
        if !self.data_available()? {
            return Ok(Line::new());
        }
        let (_, bytes) = self.pending.borrow_mut().pop_front().ok_or(Error::Read)?;
        let end = bytes.len().min(MAX_LINE_LEN);
        Line::from_slice(&bytes[..end]).map_err(|_| Error::Overflow)
    }
}

/// Test side handle of a [`MockTransport`] / [`MockClock`] pair.
#[derive(Clone)]
pub struct Probe {
    clock: MockClock,
    scripts: Rc<RefCell<VecDeque<Script>>>,
    pending: Rc<RefCell<VecDeque<(u64, Vec<u8>)>>>,
    written: Rc<RefCell<Vec<Vec<u8>>>>,
}

impl Probe {
    /// Queue the reply to the next write, as `(offset_ms, line)` pairs.
    pub fn reply(&self, script: &[(u64, &str)]) {
        let script = script
            .iter()
            .map(|(offset, line)| (*offset, terminated(line)))
            .collect();
        self.scripts.borrow_mut().push_back(script);
    }

    /// Queue a reply arriving immediately.
    pub fn reply_now(&self, lines: &[&str]) {
        let script: Vec<(u64, &str)> = lines.iter().map(|l| (0, *l)).collect();
        self.reply(&script);
    }

    /// Make a line available right now, without any write.
    pub fn unsolicited(&self, line: &str) {
        let now = self.clock.now().as_micros();
        self.pending
            .borrow_mut()
            .push_back((now, terminated(line)));
    }

    pub fn written(&self) -> Vec<String> {
        self.written
            .borrow()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.now().as_millis()
    }

    pub fn sleeps(&self) -> u32 {
        self.clock.sleeps()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

pub fn setup(config: Config) -> (Client<MockTransport, MockClock>, Probe) {
    setup_log();

    let clock = MockClock::new();
    let probe = Probe {
        clock: clock.clone(),
        scripts: Rc::default(),
        pending: Rc::default(),
        written: Rc::default(),
    };
    let transport = MockTransport {
        clock: clock.clone(),
        scripts: probe.scripts.clone(),
        pending: probe.pending.clone(),
        written: probe.written.clone(),
    };

    (Client::new(transport, clock, config), probe)
}

/// In-memory `embedded-io` serial port.
pub struct SerialMock {
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl SerialMock {
    pub fn new(rx: &[u8]) -> Self {
        Self {
            rx: Rc::new(RefCell::new(rx.iter().copied().collect())),
            tx: Rc::default(),
        }
    }

    pub fn rx_handle(&self) -> Rc<RefCell<VecDeque<u8>>> {
        self.rx.clone()
    }

    pub fn tx_handle(&self) -> Rc<RefCell<Vec<u8>>> {
        self.tx.clone()
    }
}

impl ErrorType for SerialMock {
    type Error = Infallible;
}

impl embedded_io::Read for SerialMock {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut rx = self.rx.borrow_mut();
        let n = buf.len().min(rx.len());
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for SerialMock {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.borrow().is_empty())
    }
}

impl embedded_io::Write for SerialMock {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
