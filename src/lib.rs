//! # minimqtt - MQTT 3.1.1 for small devices
//!
//! A minimal MQTT client for microcontrollers that publish sensor readings
//! and react to a few command topics. It runs without an allocator and
//! without threads: every buffer has a fixed size chosen at compile time,
//! and all protocol work happens inside calls the application makes from
//! its main loop.
//!
//! ## Features
//!
//! ### MQTT session
//! - Connect, disconnect, publish at QoS 0/1, subscribe
//! - Inbound messages delivered to a callback, QoS 1 ones acknowledged
//! - Retransmission of unacknowledged QoS 1 publishes
//! - Keepalive heartbeat with a bounded wait and optional reconnect
//! - Configuration from code or from a JSON document
//!
//! ### Platform glue
//! - Transport traits any TCP stack can implement
//! - A millisecond clock trait for timeouts
//! - `std::net` and `std::time` implementations behind the `std` feature
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! minimqtt = "0.1.0"
//! ```
//!
//! ### Publishing from a button handler
//!
//! ```rust,no_run
//! # #[cfg(feature = "std")]
//! # fn main() -> Result<(), minimqtt::network::application::mqtt::Error> {
//! use minimqtt::network::application::mqtt::{Config, QoS, Session};
//! use minimqtt::network::tcp::TcpConnector;
//! use minimqtt::system::StdClock;
//!
//! let config = Config::new("192.168.45.188", "ESP32Client");
//! let mut session = Session::new(TcpConnector::new(), StdClock::new(), config)
//!     .with_handler(|topic: &str, payload: &[u8]| {
//!         println!("{topic}: {}", String::from_utf8_lossy(payload));
//!     });
//!
//! session.connect_default()?;
//! session.subscribe("test/topic", QoS::AtLeastOnce)?;
//! session.publish("test/topic", b"Button pressed", QoS::AtLeastOnce, true)?;
//! loop {
//!     session.poll()?;
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! # }
//! # #[cfg(not(feature = "std"))]
//! # fn main() {}
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, Xtensa)
//! - Linux-based IoT devices
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: `std::net` transport and `std::time` clock (default: disabled)
//! - `defmt`: log session activity through `defmt`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Transport traits and the protocol clients built on them.
///
/// The MQTT client lives in [`network::application::mqtt`].
pub mod network;

/// Platform services: time and delay.
pub mod system;
