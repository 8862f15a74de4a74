//! Session configuration.

use serde::Deserialize;

use super::error::ConfigError;
use super::packet::MAX_CLIENT_ID_LEN;

/// What the session does when a keepalive ping goes unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Stay disconnected; the application decides when to reconnect.
    Never,
    /// Make exactly one reconnection attempt with the client identifier of
    /// the last successful [`connect`](super::Session::connect).
    SameClientId,
}

/// Configuration for a [`Session`](super::Session).
///
/// Strings are borrowed, so a configuration can live in flash or be parsed
/// in place from a JSON document with [`Config::from_json`].
///
/// # Examples
///
/// ```rust
/// use minimqtt::network::application::mqtt::{Config, ReconnectPolicy};
///
/// let config = Config::new("192.168.45.188", "ESP32Client")
///     .with_keep_alive(30)
///     .with_reconnect(ReconnectPolicy::Never);
///
/// assert_eq!(config.port, 1883);
/// assert_eq!(config.keep_alive_secs, 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config<'a> {
    /// Broker host name or address.
    #[serde(borrow)]
    pub host: &'a str,

    /// Broker TCP port.
    pub port: u16,

    /// Client identifier used by [`connect_default`](super::Session::connect_default).
    ///
    /// Brokers disconnect an existing client when another connects with the
    /// same identifier, so every device needs its own.
    #[serde(borrow)]
    pub client_id: &'a str,

    /// Keepalive interval in seconds; 0 disables pinging.
    pub keep_alive_secs: u16,

    /// How long `connect` waits for the CONNACK.
    pub connect_timeout_ms: u32,

    /// How long a keepalive ping waits for the PINGRESP.
    pub ping_timeout_ms: u32,

    /// Sleep between checks for data while waiting on the broker.
    pub wait_step_ms: u32,

    /// Age at which an unacknowledged QoS 1 publish is sent again; 0 turns
    /// retransmission and expiry off.
    pub retry_interval_ms: u32,

    /// Re-sends before an unacknowledged publish is given up on.
    pub max_retries: u8,

    /// Behaviour after a failed keepalive.
    pub reconnect: ReconnectPolicy,
}

impl<'a> Config<'a> {
    /// Defaults for everything except the broker host and client identifier.
    pub const fn new(host: &'a str, client_id: &'a str) -> Self {
        Self {
            host,
            port: 1883,
            client_id,
            keep_alive_secs: 60,
            connect_timeout_ms: 1_000,
            ping_timeout_ms: 1_000,
            wait_step_ms: 10,
            retry_interval_ms: 5_000,
            max_retries: 3,
            reconnect: ReconnectPolicy::SameClientId,
        }
    }

    /// Parse a JSON document; absent fields keep their defaults.
    ///
    /// ```rust
    /// use minimqtt::network::application::mqtt::Config;
    ///
    /// let json = r#"{"host":"broker.local","client_id":"node-7","keep_alive_secs":15}"#;
    /// let config = Config::from_json(json).unwrap();
    /// assert_eq!(config.host, "broker.local");
    /// assert_eq!(config.keep_alive_secs, 15);
    /// assert_eq!(config.port, 1883);
    /// ```
    pub fn from_json(json: &'a str) -> Result<Self, ConfigError> {
        let (config, _) =
            serde_json_core::from_str::<Config<'a>>(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields a session cannot work without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.client_id.is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        if self.client_id.len() > MAX_CLIENT_ID_LEN {
            return Err(ConfigError::ClientIdTooLong);
        }
        Ok(())
    }

    /// Set the broker port.
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the keepalive interval in seconds.
    pub const fn with_keep_alive(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the CONNACK and PINGRESP waits.
    pub const fn with_timeouts(mut self, connect_ms: u32, ping_ms: u32) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.ping_timeout_ms = ping_ms;
        self
    }

    /// Set the sleep between checks while waiting.
    pub const fn with_wait_step(mut self, ms: u32) -> Self {
        self.wait_step_ms = ms;
        self
    }

    /// Set the retransmission interval and budget for QoS 1 publishes.
    pub const fn with_retries(mut self, interval_ms: u32, max_retries: u8) -> Self {
        self.retry_interval_ms = interval_ms;
        self.max_retries = max_retries;
        self
    }

    /// Set the keepalive failure policy.
    pub const fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self::new("localhost", "")
    }
}
