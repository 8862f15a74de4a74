//! MQTT 3.1.1 control packet codec.
//!
//! Pure functions that translate between packets and their wire form. Encoders
//! replace the contents of a caller-supplied [`PacketBuffer`]; the decoder works
//! on a complete frame and borrows topic and payload out of it.
//!
//! Outbound packets are limited to a single-byte remaining length
//! ([`MAX_REMAINING_LENGTH`]). Anything larger fails with
//! [`EncodingError::PacketTooLarge`] instead of being truncated. The
//! remaining-length codec itself handles the full 1 to 4 byte form, so inbound
//! frames of any size are delimited correctly.

use core::num::NonZeroU16;

use heapless::Vec;

use super::error::{EncodingError, ProtocolError};

/// MQTT CONNECT packet type identifier.
pub const CONNECT: u8 = 0x10;
/// MQTT CONNACK packet type identifier.
pub const CONNACK: u8 = 0x20;
/// MQTT PUBLISH packet type identifier.
pub const PUBLISH: u8 = 0x30;
/// MQTT PUBACK packet type identifier.
pub const PUBACK: u8 = 0x40;
/// Header byte some brokers use for PUBACK; accepted on decode.
pub const PUBACK_ALIAS: u8 = 0x50;
/// MQTT SUBSCRIBE packet type identifier, including the mandatory flags.
pub const SUBSCRIBE: u8 = 0x82;
/// MQTT SUBACK packet type identifier.
pub const SUBACK: u8 = 0x90;
/// MQTT PINGREQ packet type identifier.
pub const PINGREQ: u8 = 0xC0;
/// MQTT PINGRESP packet type identifier.
pub const PINGRESP: u8 = 0xD0;
/// MQTT DISCONNECT packet type identifier.
pub const DISCONNECT: u8 = 0xE0;

/// SUBACK return code signalling a rejected subscription.
pub const SUBACK_FAILURE: u8 = 0x80;

const PROTOCOL_NAME: &[u8] = b"MQTT";
const PROTOCOL_LEVEL: u8 = 4; // MQTT 3.1.1
const CLEAN_SESSION: u8 = 0x02;

const DUP_FLAG: u8 = 0x08;
const RETAIN_FLAG: u8 = 0x01;

/// Largest remaining length this client puts on the wire.
pub const MAX_REMAINING_LENGTH: usize = 127;
/// Fixed header byte + one remaining-length byte + body.
pub const MAX_PACKET_SIZE: usize = MAX_REMAINING_LENGTH + 2;
/// Longest client identifier that still fits a single-byte CONNECT.
pub const MAX_CLIENT_ID_LEN: usize = MAX_REMAINING_LENGTH - 12;
/// Largest value the variable-length remaining-length field can carry.
pub const MAX_VARIABLE_LENGTH: usize = 268_435_455;

/// Scratch buffer holding one encoded outbound packet.
pub type PacketBuffer = Vec<u8, MAX_PACKET_SIZE>;

/// A non-zero 16-bit packet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketId(NonZeroU16);

impl PacketId {
    /// Identifier 1, the first one a session hands out.
    pub const MIN: PacketId = PacketId(NonZeroU16::MIN);

    /// Wrap `value`, or `None` for the reserved identifier zero.
    pub const fn new(value: u16) -> Option<Self> {
        match NonZeroU16::new(value) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// The raw identifier.
    pub const fn get(self) -> u16 {
        self.0.get()
    }

    fn from_be_bytes(bytes: [u8; 2]) -> Result<Self, ProtocolError> {
        Self::new(u16::from_be_bytes(bytes)).ok_or(ProtocolError::ZeroPacketId)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PacketId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u16}", self.get())
    }
}

/// Quality of Service levels for MQTT messages.
///
/// `ExactlyOnce` exists so that inbound headers and SUBACK grants can be
/// described, but the client refuses to send anything at QoS 2.
///
/// ```rust
/// use minimqtt::network::application::mqtt::QoS;
///
/// assert_eq!(QoS::AtMostOnce as u8, 0);
/// assert_eq!(QoS::from_bits(1), Some(QoS::AtLeastOnce));
/// assert_eq!(QoS::from_bits(3), None);
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// At most once delivery.
    AtMostOnce = 0,
    /// At least once delivery.
    AtLeastOnce = 1,
    /// Exactly once delivery.
    ExactlyOnce = 2,
}

impl QoS {
    /// Parse the two QoS bits of a header or SUBSCRIBE payload.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for QoS {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "QoS{=u8}", *self as u8)
    }
}

/// A PUBLISH packet, either about to be encoded or freshly decoded.
///
/// Topic and payload are borrowed; nothing outlives the encode or decode call
/// that produced the view.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Publish<'a> {
    /// Topic name.
    pub topic: &'a str,
    /// Application payload; may contain any bytes, including NUL.
    pub payload: &'a [u8],
    /// Delivery guarantee.
    pub qos: QoS,
    /// Retain flag.
    pub retain: bool,
    /// Set on re-deliveries of a QoS 1 publish.
    pub dup: bool,
    /// Present exactly when `qos` is above `AtMostOnce`.
    pub packet_id: Option<PacketId>,
}

/// A decoded inbound packet.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Packet<'a> {
    /// Connection acknowledgement.
    ConnAck {
        /// The broker resumed an existing session.
        session_present: bool,
        /// Zero on success, 1..=5 for the defined refusal reasons.
        return_code: u8,
    },
    /// Application message.
    Publish(Publish<'a>),
    /// Acknowledgement of a QoS 1 publish.
    PubAck(PacketId),
    /// Subscription acknowledgement.
    SubAck {
        /// Identifier of the SUBSCRIBE being acknowledged.
        packet_id: PacketId,
        /// Granted QoS, or [`SUBACK_FAILURE`].
        return_code: u8,
    },
    /// Keepalive response.
    PingResp,
}

/// Where a frame's body starts and how long it is.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FrameHeader {
    /// Fixed header byte plus remaining-length bytes.
    pub header_len: usize,
    /// Length of the variable header and payload.
    pub remaining_len: usize,
}

impl FrameHeader {
    /// Total size of the frame on the wire.
    pub const fn total_len(&self) -> usize {
        self.header_len + self.remaining_len
    }
}

/// Append the variable-length encoding of `len` to `buf`.
///
/// Produces 1 to 4 bytes, seven bits each, with the high bit marking a
/// continuation.
pub fn encode_remaining_length<const N: usize>(
    mut len: usize,
    buf: &mut Vec<u8, N>,
) -> Result<(), EncodingError> {
    if len > MAX_VARIABLE_LENGTH {
        return Err(EncodingError::PacketTooLarge);
    }
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf.push(byte).map_err(|_| EncodingError::PacketTooLarge)?;
        if len == 0 {
            return Ok(());
        }
    }
}

/// Decode a remaining-length field from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied, or `None` when
/// `bytes` ends before the field does.
pub fn decode_remaining_length(bytes: &[u8]) -> Result<Option<(usize, usize)>, ProtocolError> {
    let mut value = 0usize;
    let mut multiplier = 1usize;
    for (i, &byte) in bytes.iter().take(4).enumerate() {
        value += usize::from(byte & 0x7F) * multiplier;
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
        multiplier *= 128;
    }
    if bytes.len() >= 4 {
        Err(ProtocolError::MalformedRemainingLength)
    } else {
        Ok(None)
    }
}

/// Inspect the start of `bytes` for a fixed header.
///
/// `Ok(None)` means more bytes are needed before the frame's size is known.
/// The frame itself is complete once `bytes.len() >= header.total_len()`.
pub fn frame_header(bytes: &[u8]) -> Result<Option<FrameHeader>, ProtocolError> {
    let Some(rest) = bytes.get(1..) else {
        return Ok(None);
    };
    Ok(decode_remaining_length(rest)?.map(|(remaining_len, len_bytes)| FrameHeader {
        header_len: 1 + len_bytes,
        remaining_len,
    }))
}

/// Encode a CONNECT packet with the clean-session flag set.
///
/// ```rust
/// use minimqtt::network::application::mqtt::packet::{encode_connect, PacketBuffer};
///
/// let mut buf = PacketBuffer::new();
/// encode_connect("dev", 60, &mut buf).unwrap();
/// assert_eq!(&buf[..], b"\x10\x0f\x00\x04MQTT\x04\x02\x00\x3c\x00\x03dev");
/// ```
pub fn encode_connect(
    client_id: &str,
    keep_alive_secs: u16,
    buf: &mut PacketBuffer,
) -> Result<(), EncodingError> {
    if client_id.is_empty() {
        return Err(EncodingError::EmptyClientId);
    }
    // protocol name (2 + 4), level, flags, keepalive (2), client id (2 + n)
    let remaining_len = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2 + 2 + client_id.len();
    begin(buf, CONNECT, remaining_len)?;
    put_prefixed(buf, PROTOCOL_NAME)?;
    put(buf, &[PROTOCOL_LEVEL, CLEAN_SESSION])?;
    put(buf, &keep_alive_secs.to_be_bytes())?;
    put_prefixed(buf, client_id.as_bytes())
}

/// Encode a PUBLISH packet.
///
/// The packet identifier is written only for QoS 1 and is required there.
pub fn encode_publish(message: &Publish<'_>, buf: &mut PacketBuffer) -> Result<(), EncodingError> {
    if message.topic.is_empty() {
        return Err(EncodingError::EmptyTopic);
    }
    if message.topic.contains(['+', '#']) {
        return Err(EncodingError::InvalidTopic);
    }
    let packet_id = match message.qos {
        QoS::AtMostOnce => None,
        QoS::AtLeastOnce => Some(message.packet_id.ok_or(EncodingError::MissingPacketId)?),
        QoS::ExactlyOnce => return Err(EncodingError::UnsupportedQoS),
    };

    let mut header = PUBLISH | ((message.qos as u8) << 1);
    if message.dup {
        header |= DUP_FLAG;
    }
    if message.retain {
        header |= RETAIN_FLAG;
    }

    let id_len = if packet_id.is_some() { 2 } else { 0 };
    let remaining_len = 2 + message.topic.len() + id_len + message.payload.len();
    begin(buf, header, remaining_len)?;
    put_prefixed(buf, message.topic.as_bytes())?;
    if let Some(id) = packet_id {
        put(buf, &id.get().to_be_bytes())?;
    }
    put(buf, message.payload)
}

/// Encode a SUBSCRIBE packet carrying a single topic filter.
pub fn encode_subscribe(
    packet_id: PacketId,
    topic_filter: &str,
    qos: QoS,
    buf: &mut PacketBuffer,
) -> Result<(), EncodingError> {
    if topic_filter.is_empty() {
        return Err(EncodingError::EmptyTopic);
    }
    if qos == QoS::ExactlyOnce {
        return Err(EncodingError::UnsupportedQoS);
    }
    let remaining_len = 2 + 2 + topic_filter.len() + 1;
    begin(buf, SUBSCRIBE, remaining_len)?;
    put(buf, &packet_id.get().to_be_bytes())?;
    put_prefixed(buf, topic_filter.as_bytes())?;
    put(buf, &[qos as u8])
}

/// Encode a PUBACK for an inbound QoS 1 publish.
pub fn encode_puback(packet_id: PacketId, buf: &mut PacketBuffer) -> Result<(), EncodingError> {
    begin(buf, PUBACK, 2)?;
    put(buf, &packet_id.get().to_be_bytes())
}

/// Encode the two-byte PINGREQ.
pub fn encode_pingreq(buf: &mut PacketBuffer) -> Result<(), EncodingError> {
    begin(buf, PINGREQ, 0)
}

/// Encode the two-byte DISCONNECT.
pub fn encode_disconnect(buf: &mut PacketBuffer) -> Result<(), EncodingError> {
    begin(buf, DISCONNECT, 0)
}

/// Decode one complete frame.
///
/// `frame` must start at a fixed header; bytes past the frame's declared
/// length are ignored.
pub fn decode(frame: &[u8]) -> Result<Packet<'_>, ProtocolError> {
    let header = frame_header(frame)?.ok_or(ProtocolError::ShortRead)?;
    let body = frame
        .get(header.header_len..header.total_len())
        .ok_or(ProtocolError::ShortRead)?;
    let first = frame[0];

    match first & 0xF0 {
        CONNACK => {
            let [flags, return_code] = fixed_body::<2>(first, CONNACK, body)?;
            Ok(Packet::ConnAck {
                session_present: flags & 0x01 != 0,
                return_code,
            })
        }
        PUBLISH => decode_publish(first, body).map(Packet::Publish),
        PUBACK | PUBACK_ALIAS => {
            let id = fixed_body::<2>(first, first & 0xF0, body)?;
            PacketId::from_be_bytes(id).map(Packet::PubAck)
        }
        SUBACK => {
            let [hi, lo, return_code] = fixed_body::<3>(first, SUBACK, body)?;
            Ok(Packet::SubAck {
                packet_id: PacketId::from_be_bytes([hi, lo])?,
                return_code,
            })
        }
        PINGRESP => {
            fixed_body::<0>(first, PINGRESP, body)?;
            Ok(Packet::PingResp)
        }
        _ => Err(ProtocolError::Unsupported(first)),
    }
}

fn decode_publish(first: u8, body: &[u8]) -> Result<Publish<'_>, ProtocolError> {
    let qos = QoS::from_bits((first >> 1) & 0x03).ok_or(ProtocolError::MalformedHeader)?;
    let topic_len = match body {
        [hi, lo, ..] => usize::from(u16::from_be_bytes([*hi, *lo])),
        _ => return Err(ProtocolError::ShortRead),
    };
    let mut offset = 2 + topic_len;
    let topic_bytes = body.get(2..offset).ok_or(ProtocolError::ShortRead)?;
    let topic = core::str::from_utf8(topic_bytes).map_err(|_| ProtocolError::InvalidTopic)?;

    let packet_id = if qos == QoS::AtMostOnce {
        None
    } else {
        let id = match body.get(offset..offset + 2) {
            Some(&[hi, lo]) => PacketId::from_be_bytes([hi, lo])?,
            _ => return Err(ProtocolError::ShortRead),
        };
        offset += 2;
        Some(id)
    };

    Ok(Publish {
        topic,
        payload: &body[offset..],
        qos,
        retain: first & RETAIN_FLAG != 0,
        dup: first & DUP_FLAG != 0,
        packet_id,
    })
}

/// Check the exact header byte and body size of a fixed-layout packet.
fn fixed_body<const N: usize>(first: u8, expected: u8, body: &[u8]) -> Result<[u8; N], ProtocolError> {
    if first != expected {
        return Err(ProtocolError::MalformedHeader);
    }
    body.try_into().map_err(|_| ProtocolError::MalformedHeader)
}

/// Reset `buf` and write the fixed header.
fn begin(buf: &mut PacketBuffer, header: u8, remaining_len: usize) -> Result<(), EncodingError> {
    if remaining_len > MAX_REMAINING_LENGTH {
        return Err(EncodingError::PacketTooLarge);
    }
    buf.clear();
    put(buf, &[header])?;
    encode_remaining_length(remaining_len, buf)
}

fn put(buf: &mut PacketBuffer, bytes: &[u8]) -> Result<(), EncodingError> {
    buf.extend_from_slice(bytes)
        .map_err(|_| EncodingError::PacketTooLarge)
}

fn put_prefixed(buf: &mut PacketBuffer, bytes: &[u8]) -> Result<(), EncodingError> {
    let len = u16::try_from(bytes.len()).map_err(|_| EncodingError::PacketTooLarge)?;
    put(buf, &len.to_be_bytes())?;
    put(buf, bytes)
}
