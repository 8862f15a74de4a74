//! Blocking TCP transport on top of `std::net`.
//!
//! Useful on Linux gateways and for exercising the client against a desktop
//! broker. `available` is answered with a non-blocking `peek`, so it reports
//! at most [`PEEK_WINDOW`] bytes at a time.

use super::error::Error;
use super::{Available, Close, Connect, Connection, Read, Write};
use std::io::{ErrorKind, Read as StdRead, Write as StdWrite};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// Upper bound on what a single [`Available::available`] call reports.
pub const PEEK_WINDOW: usize = 512;

/// Opens [`TcpConnection`]s.
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    read_timeout: Option<Duration>,
}

impl TcpConnector {
    /// A connector whose connections block on read until data arrives.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every blocking read on the opened connections.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

impl Connect for TcpConnector {
    type Connection = TcpConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let stream = TcpStream::connect(remote).map_err(|e| match e.kind() {
            ErrorKind::InvalidInput => Error::InvalidAddress,
            ErrorKind::TimedOut => Error::Timeout,
            _ => Error::ConnectionRefused,
        })?;
        stream.set_nodelay(true).map_err(|_| Error::ConnectionRefused)?;
        stream
            .set_read_timeout(self.read_timeout)
            .map_err(|_| Error::ConnectionRefused)?;
        Ok(TcpConnection { stream })
    }
}

/// A connected TCP stream.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
}

impl Read for TcpConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Timeout,
            _ => Error::ReadError,
        })
    }
}

impl Write for TcpConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(|_| Error::WriteError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(|_| Error::WriteError)
    }
}

impl Available for TcpConnection {
    fn available(&mut self) -> usize {
        if self.stream.set_nonblocking(true).is_err() {
            return 0;
        }
        let mut window = [0u8; PEEK_WINDOW];
        let ready = self.stream.peek(&mut window).unwrap_or(0);
        // A failure to restore blocking mode shows up on the next read.
        let _ = self.stream.set_nonblocking(false);
        ready
    }
}

impl Close for TcpConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(_) => Err(Error::ConnectionClosed),
        }
    }
}

impl Connection for TcpConnection {}
