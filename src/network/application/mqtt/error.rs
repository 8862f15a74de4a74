//! Error types for the MQTT client.

use core::fmt;

use super::session::State;
use crate::network::error::Error as TransportError;

/// Errors returned by [`Session`](super::Session) operations.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The transport failed to open, write or read.
    Transport(TransportError),
    /// The broker sent something the client could not accept.
    Protocol(ProtocolError),
    /// No response arrived within the configured wait.
    Timeout,
    /// The operation is not allowed in the session's current state.
    InvalidState(State),
    /// The caller-supplied data cannot be put on the wire.
    Encoding(EncodingError),
    /// Every slot for tracking unacknowledged QoS 1 publishes is in use.
    PendingFull,
}

/// Inbound data that could not be interpreted.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProtocolError {
    /// A packet arrived that is not valid at this point of the exchange.
    UnexpectedPacket,
    /// The broker answered CONNECT with a non-zero return code.
    ConnectionRefused(u8),
    /// Fixed header flags or fixed-size body length are wrong.
    MalformedHeader,
    /// The remaining length field ran past four bytes.
    MalformedRemainingLength,
    /// A length field declared more bytes than the packet holds.
    ShortRead,
    /// A topic name was not valid UTF-8.
    InvalidTopic,
    /// A packet identifier of zero was received.
    ZeroPacketId,
    /// A packet type this client does not handle; carries the header byte.
    Unsupported(u8),
}

/// Outbound data that cannot be encoded.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EncodingError {
    /// CONNECT requires a non-empty client identifier.
    EmptyClientId,
    /// Topic names and filters must not be empty.
    EmptyTopic,
    /// Topic names used for publishing must not contain `+` or `#`.
    InvalidTopic,
    /// The packet's remaining length would not fit in a single byte.
    PacketTooLarge,
    /// A QoS 1 publish was encoded without a packet identifier.
    MissingPacketId,
    /// QoS 2 exchanges are not implemented.
    UnsupportedQoS,
}

/// Problems found while loading or validating a [`Config`](super::Config).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    Parse,
    /// The broker host is empty.
    EmptyHost,
    /// The default client identifier is empty.
    EmptyClientId,
    /// The client identifier does not fit in a single-byte CONNECT.
    ClientIdTooLong,
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        Error::Encoding(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "transport error: {e}"),
            Error::Protocol(e) => write!(f, "protocol error: {e}"),
            Error::Timeout => f.write_str("timed out waiting for the broker"),
            Error::InvalidState(state) => write!(f, "not allowed while {state}"),
            Error::Encoding(e) => write!(f, "encoding error: {e}"),
            Error::PendingFull => f.write_str("too many unacknowledged publishes"),
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnexpectedPacket => f.write_str("unexpected packet"),
            ProtocolError::ConnectionRefused(code) => {
                write!(f, "connection refused (return code {code})")
            }
            ProtocolError::MalformedHeader => f.write_str("malformed fixed header"),
            ProtocolError::MalformedRemainingLength => f.write_str("malformed remaining length"),
            ProtocolError::ShortRead => f.write_str("declared length exceeds packet"),
            ProtocolError::InvalidTopic => f.write_str("topic is not valid UTF-8"),
            ProtocolError::ZeroPacketId => f.write_str("packet identifier is zero"),
            ProtocolError::Unsupported(header) => write!(f, "unsupported packet 0x{header:02x}"),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EncodingError::EmptyClientId => "client identifier is empty",
            EncodingError::EmptyTopic => "topic is empty",
            EncodingError::InvalidTopic => "topic contains a wildcard",
            EncodingError::PacketTooLarge => "packet exceeds the single-byte remaining length",
            EncodingError::MissingPacketId => "QoS 1 publish without packet identifier",
            EncodingError::UnsupportedQoS => "QoS 2 is not supported",
        };
        f.write_str(text)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConfigError::Parse => "configuration is not valid JSON",
            ConfigError::EmptyHost => "broker host is empty",
            ConfigError::EmptyClientId => "client identifier is empty",
            ConfigError::ClientIdTooLong => "client identifier is too long",
        };
        f.write_str(text)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Transport(e) => defmt::write!(f, "Transport({})", e),
            Error::Protocol(e) => defmt::write!(f, "Protocol({})", e),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::InvalidState(state) => defmt::write!(f, "InvalidState({})", state),
            Error::Encoding(e) => defmt::write!(f, "Encoding({})", e),
            Error::PendingFull => defmt::write!(f, "PendingFull"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProtocolError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ProtocolError::UnexpectedPacket => defmt::write!(f, "UnexpectedPacket"),
            ProtocolError::ConnectionRefused(code) => {
                defmt::write!(f, "ConnectionRefused({=u8})", code)
            }
            ProtocolError::MalformedHeader => defmt::write!(f, "MalformedHeader"),
            ProtocolError::MalformedRemainingLength => defmt::write!(f, "MalformedRemainingLength"),
            ProtocolError::ShortRead => defmt::write!(f, "ShortRead"),
            ProtocolError::InvalidTopic => defmt::write!(f, "InvalidTopic"),
            ProtocolError::ZeroPacketId => defmt::write!(f, "ZeroPacketId"),
            ProtocolError::Unsupported(header) => defmt::write!(f, "Unsupported({=u8:#x})", header),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EncodingError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            EncodingError::EmptyClientId => defmt::write!(f, "EmptyClientId"),
            EncodingError::EmptyTopic => defmt::write!(f, "EmptyTopic"),
            EncodingError::InvalidTopic => defmt::write!(f, "InvalidTopic"),
            EncodingError::PacketTooLarge => defmt::write!(f, "PacketTooLarge"),
            EncodingError::MissingPacketId => defmt::write!(f, "MissingPacketId"),
            EncodingError::UnsupportedQoS => defmt::write!(f, "UnsupportedQoS"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::Parse => defmt::write!(f, "Parse"),
            ConfigError::EmptyHost => defmt::write!(f, "EmptyHost"),
            ConfigError::EmptyClientId => defmt::write!(f, "EmptyClientId"),
            ConfigError::ClientIdTooLong => defmt::write!(f, "ClientIdTooLong"),
        }
    }
}
