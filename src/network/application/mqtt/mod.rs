//! MQTT 3.1.1 client for small devices.
//!
//! MQTT is a publish-subscribe protocol: clients publish messages to topics
//! on a broker, and the broker forwards them to every client subscribed to a
//! matching topic filter. This client covers the subset a sensor node needs:
//!
//! - CONNECT with a clean session and a keepalive interval
//! - PUBLISH at QoS 0 and QoS 1, with retransmission of unacknowledged QoS 1
//!   messages
//! - SUBSCRIBE to a single topic filter per request
//! - inbound PUBLISH delivery to a [`MessageHandler`], acknowledging QoS 1
//! - PINGREQ/PINGRESP heartbeats and an optional reconnect when they fail
//!
//! Every packet the client sends must fit a single-byte remaining length
//! (127 bytes), so it never needs more than [`packet::MAX_PACKET_SIZE`]
//! bytes of transmit buffer. Inbound packets may use the full
//! variable-length encoding, up to the receive buffer size.
//!
//! Nothing runs in the background. The application calls [`Session::poll`]
//! from its main loop, and that is where inbound packets are handled,
//! retransmissions happen and the keepalive is driven.
//!
//! # Usage
//!
//! ```rust,no_run
//! use minimqtt::network::application::mqtt::{Config, QoS, Session, State};
//! # use minimqtt::network::{Available, Close, Connect, Connection, Read, Write};
//! # use minimqtt::system::Clock;
//! # struct Tcp;
//! # impl Read for Tcp { type Error = (); fn read(&mut self, _: &mut [u8]) -> Result<usize, ()> { Ok(0) } }
//! # impl Write for Tcp {
//! #     type Error = ();
//! #     fn write(&mut self, b: &[u8]) -> Result<usize, ()> { Ok(b.len()) }
//! #     fn flush(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! # impl Available for Tcp { fn available(&mut self) -> usize { 0 } }
//! # impl Close for Tcp { type Error = (); fn close(self) -> Result<(), ()> { Ok(()) } }
//! # impl Connection for Tcp {}
//! # struct Stack;
//! # impl Connect for Stack {
//! #     type Connection = Tcp;
//! #     type Error = ();
//! #     fn connect(&mut self, _: &str) -> Result<Tcp, ()> { Ok(Tcp) }
//! # }
//! # struct Timer;
//! # impl Clock for Timer { fn now_ms(&self) -> u64 { 0 } fn delay_ms(&mut self, _: u32) {} }
//!
//! let config = Config::from_json(r#"{"host":"broker.local","client_id":"sensor-1"}"#)
//!     .expect("valid configuration");
//! let mut session = Session::new(Stack, Timer, config);
//!
//! session.connect_default()?;
//! assert_eq!(session.state(), State::Connected);
//! session.publish("sensors/temperature", b"23.5", QoS::AtMostOnce, false)?;
//! session.poll()?;
//! session.disconnect()?;
//! # Ok::<(), minimqtt::network::application::mqtt::Error>(())
//! ```

/// Receive buffer that reassembles packets from the byte stream.
pub mod buffer;

/// Broker address, client identity and timing.
pub mod config;

/// Error types.
pub mod error;

/// Wire format: packet encoders, the decoder and remaining-length handling.
pub mod packet;

/// Packet identifiers and unacknowledged QoS 1 publishes.
pub mod pending;

/// The client session state machine.
pub mod session;

pub use config::{Config, ReconnectPolicy};
pub use error::{ConfigError, EncodingError, Error, ProtocolError};
pub use packet::{Packet, PacketId, Publish, QoS};
pub use session::{Discard, MessageHandler, Session, State};
