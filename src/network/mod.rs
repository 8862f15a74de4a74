//! A transport abstraction layer for embedded systems
//!
//! The MQTT session never talks to a socket directly. It is handed a connector
//! that opens connections, and every connection is a plain byte stream that can
//! be written, asked how many bytes are ready, read and closed. Platforms wire
//! their TCP stack (lwIP, smoltcp, `std::net`, a modem AT driver, ...) into
//! these traits.

#![deny(unsafe_code)]

/// Common error types for transport operations
pub mod error;

/// Protocol-specific client implementations
pub mod application;

/// `std::net` backed transport.
#[cfg(feature = "std")]
pub mod tcp;

/// Re-exports of common traits
pub mod prelude {
    pub use super::{Available, Close, Connect, Connection, Read, Write};
}

/// The receiving half of a byte stream.
pub trait Read {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Read data from the connection
    ///
    /// Returns the number of bytes copied into `buf`. A return of `Ok(0)`
    /// means nothing was read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// The sending half of a byte stream.
pub trait Write {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Write data to the connection
    ///
    /// May accept fewer bytes than offered; callers loop until everything
    /// has been taken.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    /// Flush the write buffer
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Reports how many received bytes can be read without blocking.
pub trait Available {
    /// Number of bytes that a subsequent [`Read::read`] can return right away.
    fn available(&mut self) -> usize;
}

/// Tears a connection down.
pub trait Close {
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Close the connection
    fn close(self) -> Result<(), Self::Error>;
}

/// A synchronous connection
pub trait Connection: Read + Write + Available + Close {}

/// A synchronous connector (client)
pub trait Connect {
    /// Associated connection type
    type Connection: Connection;
    /// Associated error type
    type Error: core::fmt::Debug;
    /// Open a connection to `remote`, given as `host:port`
    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error>;
}
