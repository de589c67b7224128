use embedded_io::{Read, ReadReady, Write};
use heapless::Vec;

use crate::{
    helpers::LossyStr,
    response::{Line, MAX_LINE_LEN},
    Error,
};

/// Byte oriented serial channel the command engine talks through.
pub trait Transport {
    /// Write all of `bytes` and flush them to the module.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Whether a complete line can be read without blocking.
    fn data_available(&mut self) -> Result<bool, Error>;

    /// Read one line, including its line ending.
    ///
    /// Only ever blocks long enough to pull a line that
    /// [`data_available`](Transport::data_available) reported. Without a
    /// complete line pending, whatever partial content is buffered is
    /// returned.
    fn read_line(&mut self) -> Result<Line, Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        T::write(self, bytes)
    }

    fn data_available(&mut self) -> Result<bool, Error> {
        T::data_available(self)
    }

    fn read_line(&mut self) -> Result<Line, Error> {
        T::read_line(self)
    }
}

/// [`Transport`] over any `embedded-io` serial port, framing the byte
/// stream into `\n` terminated lines.
///
/// A line longer than [`MAX_LINE_LEN`] is handed out truncated as soon as
/// the buffer fills up, the rest follows as the next line.
pub struct SerialTransport<S> {
    serial: S,
    buf: Vec<u8, MAX_LINE_LEN>,
}

impl<S> SerialTransport<S>
where
    S: Read + Write + ReadReady,
{
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            buf: Vec::new(),
        }
    }

    /// Release the underlying serial port, dropping any buffered bytes.
    pub fn release(self) -> S {
        self.serial
    }

    /// Pull everything the port has ready, as long as it fits.
    fn fill(&mut self) -> Result<(), Error> {
        while !self.buf.is_full() && self.serial.read_ready().map_err(|_| Error::Read)? {
            let mut chunk = [0; 32];
            let room = (MAX_LINE_LEN - self.buf.len()).min(chunk.len());
            let received = self
                .serial
                .read(&mut chunk[..room])
                .map_err(|_| Error::Read)?;
            if received == 0 {
                break;
            }
            trace!("Serial RX chunk: {:?}", LossyStr(&chunk[..received]));
            self.buf
                .extend_from_slice(&chunk[..received])
                .map_err(|_| Error::Overflow)?;
        }
        Ok(())
    }

    fn line_end(&self) -> Option<usize> {
        self.buf.iter().position(|&c| c == b'\n')
    }
}

impl<S> Transport for SerialTransport<S>
where
    S: Read + Write + ReadReady,
{
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.serial.write_all(bytes).map_err(|_| Error::Write)?;
        self.serial.flush().map_err(|_| Error::Write)?;
        Ok(())
    }

    fn data_available(&mut self) -> Result<bool, Error> {
        if self.line_end().is_none() {
            self.fill()?;
        }
        Ok(self.line_end().is_some() || self.buf.is_full())
    }

    fn read_line(&mut self) -> Result<Line, Error> {
        if self.line_end().is_none() {
            self.fill()?;
        }
        let end = self.line_end().map_or(self.buf.len(), |i| i + 1);

        let line = Line::from_slice(&self.buf[..end]).map_err(|_| Error::Overflow)?;
        let rest: Vec<u8, MAX_LINE_LEN> = self.buf[end..].iter().copied().collect();
        self.buf = rest;
        Ok(line)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::SerialMock;

    #[test]
    fn frames_lines() {
        let mut transport = SerialTransport::new(SerialMock::new(b"AT\r\r\n\r\nOK\r\n"));

        assert!(transport.data_available().unwrap());
        assert_eq!(transport.read_line().unwrap().as_slice(), b"AT\r\r\n");
        assert_eq!(transport.read_line().unwrap().as_slice(), b"\r\n");
        assert!(transport.data_available().unwrap());
        assert_eq!(transport.read_line().unwrap().as_slice(), b"OK\r\n");
        assert!(!transport.data_available().unwrap());
    }

    #[test]
    fn partial_line_is_not_available() {
        let serial = SerialMock::new(b"+CWMODE:");
        let rx = serial.rx_handle();
        let mut transport = SerialTransport::new(serial);

        assert!(!transport.data_available().unwrap());

        rx.borrow_mut().extend(b"1\r\n");
        assert!(transport.data_available().unwrap());
        assert_eq!(transport.read_line().unwrap().as_slice(), b"+CWMODE:1\r\n");
    }

    #[test]
    fn prompt_merges_into_next_line() {
        let serial = SerialMock::new(b"> ");
        let rx = serial.rx_handle();
        let mut transport = SerialTransport::new(serial);

        assert!(!transport.data_available().unwrap());
        rx.borrow_mut().extend(b"\r\nRecv 5 bytes\r\n");
        assert_eq!(transport.read_line().unwrap().as_slice(), b"> \r\n");
        assert_eq!(transport.read_line().unwrap().as_slice(), b"Recv 5 bytes\r\n");
    }

    #[test]
    fn overlong_line_is_truncated() {
        let mut data = [b'x'; MAX_LINE_LEN + 10];
        data[MAX_LINE_LEN + 8] = b'\r';
        data[MAX_LINE_LEN + 9] = b'\n';
        let mut transport = SerialTransport::new(SerialMock::new(&data));

        assert!(transport.data_available().unwrap());
        assert_eq!(transport.read_line().unwrap().len(), MAX_LINE_LEN);
        assert!(transport.data_available().unwrap());
        assert_eq!(transport.read_line().unwrap().as_slice(), b"xxxxxxxx\r\n");
    }

    #[test]
    fn write_flushes_to_serial() {
        let serial = SerialMock::new(b"");
        let tx = serial.tx_handle();
        let mut transport = SerialTransport::new(serial);

        transport.write(b"AT+GMR\r\n").unwrap();
        assert_eq!(tx.borrow().as_slice(), b"AT+GMR\r\n");
    }
}
