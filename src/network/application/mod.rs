//! # Application Layer Network Protocols
//!
//! Protocol clients built on the transport traits in [`crate::network`].
//! They work with any [`Connection`](crate::network::Connection), use
//! fixed-size buffers, and never allocate.

/// MQTT client implementation.
///
/// Provides an MQTT 3.1.1 client for lightweight publish-subscribe messaging,
/// commonly used in IoT applications.
pub mod mqtt;
