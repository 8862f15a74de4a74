//! # System Utilities
//!
//! Platform services the protocol clients rely on but do not implement
//! themselves.
//!
//! ## Available Utilities
//!
//! - **[`clock`]**: monotonic millisecond time and blocking delay, used for
//!   keepalive scheduling and bounded response waits

/// Monotonic time and delay.
///
/// Provides the [`Clock`](clock::Clock) trait that the MQTT session uses to
/// schedule keepalive pings and to bound its waits for broker responses.
pub mod clock;

pub use clock::Clock;
#[cfg(feature = "std")]
pub use clock::StdClock;
