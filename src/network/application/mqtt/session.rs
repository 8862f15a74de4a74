//! The client session: connection state, acknowledgement bookkeeping and the
//! keepalive heartbeat.
//!
//! Everything happens synchronously inside the call the application makes.
//! The only blocking spots are the bounded waits for CONNACK in
//! [`Session::connect`] and for PINGRESP in the keepalive step of
//! [`Session::poll`]; both deadlines come from [`Config`].

use core::fmt::{self, Write as _};

use heapless::String;

use super::buffer::RxBuffer;
use super::config::{Config, ReconnectPolicy};
use super::error::{EncodingError, Error, ProtocolError};
use super::packet::{self, FrameHeader, MAX_CLIENT_ID_LEN, Packet, PacketBuffer, PacketId, Publish, QoS};
use super::pending::{PacketIdAllocator, PendingPublish, PendingTable};
use crate::network::error::Error as TransportError;
use crate::network::{Available, Close, Connect, Read, Write};
use crate::system::clock::Clock;

/// Default number of QoS 1 publishes that can await acknowledgement.
pub const DEFAULT_MAX_PENDING: usize = 8;
/// Default receive buffer size in bytes.
pub const DEFAULT_RX_BUFFER: usize = 256;

const READ_CHUNK: usize = 64;
const REMOTE_LEN: usize = 128;

/// Connection state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No transport is open.
    Disconnected,
    /// The transport is open and the CONNECT handshake is in progress.
    Connecting,
    /// The broker accepted the connection.
    Connected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Disconnected => "disconnected",
            State::Connecting => "connecting",
            State::Connected => "connected",
        })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for State {
    fn format(&self, f: defmt::Formatter) {
        match self {
            State::Disconnected => defmt::write!(f, "Disconnected"),
            State::Connecting => defmt::write!(f, "Connecting"),
            State::Connected => defmt::write!(f, "Connected"),
        }
    }
}

/// Receives application messages from [`Session::poll`].
///
/// Runs on the caller's thread in the middle of `poll`, so it must return
/// promptly. Any `FnMut(&str, &[u8])` closure is a handler.
pub trait MessageHandler {
    /// Called once per inbound PUBLISH.
    fn on_message(&mut self, message: &Publish<'_>);
}

impl<F> MessageHandler for F
where
    F: FnMut(&str, &[u8]),
{
    fn on_message(&mut self, message: &Publish<'_>) {
        self(message.topic, message.payload)
    }
}

/// Handler installed by [`Session::new`]; drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl MessageHandler for Discard {
    fn on_message(&mut self, _message: &Publish<'_>) {}
}

/// An MQTT 3.1.1 client session over one transport connection.
///
/// # Type Parameters
///
/// * `N` - connector that opens the transport
/// * `K` - clock for keepalive timing and bounded waits
/// * `H` - inbound message handler
/// * `MAX_PENDING` - QoS 1 publishes that can await a PUBACK (power of two)
/// * `RX` - receive buffer size, at least [`buffer::MIN_CAPACITY`](super::buffer::MIN_CAPACITY);
///   larger inbound packets are skipped
///
/// # Examples
///
/// ```rust,no_run
/// use minimqtt::network::application::mqtt::{Config, QoS, Session};
/// # use minimqtt::network::{Available, Close, Connect, Connection, Read, Write};
/// # use minimqtt::system::Clock;
/// # struct Tcp;
/// # impl Read for Tcp { type Error = (); fn read(&mut self, _: &mut [u8]) -> Result<usize, ()> { Ok(0) } }
/// # impl Write for Tcp {
/// #     type Error = ();
/// #     fn write(&mut self, b: &[u8]) -> Result<usize, ()> { Ok(b.len()) }
/// #     fn flush(&mut self) -> Result<(), ()> { Ok(()) }
/// # }
/// # impl Available for Tcp { fn available(&mut self) -> usize { 0 } }
/// # impl Close for Tcp { type Error = (); fn close(self) -> Result<(), ()> { Ok(()) } }
/// # impl Connection for Tcp {}
/// # struct Stack;
/// # impl Connect for Stack {
/// #     type Connection = Tcp;
/// #     type Error = ();
/// #     fn connect(&mut self, _: &str) -> Result<Tcp, ()> { Ok(Tcp) }
/// # }
/// # struct Timer;
/// # impl Clock for Timer { fn now_ms(&self) -> u64 { 0 } fn delay_ms(&mut self, _: u32) {} }
///
/// let config = Config::new("192.168.45.188", "ESP32Client");
/// let mut session = Session::new(Stack, Timer, config)
///     .with_handler(|topic: &str, payload: &[u8]| {
///         // react to commands
///         let _ = (topic, payload);
///     });
///
/// session.connect("ESP32Client")?;
/// session.subscribe("test/topic", QoS::AtLeastOnce)?;
/// session.publish("test/topic", b"Button pressed", QoS::AtLeastOnce, true)?;
/// loop {
///     session.poll()?;
/// }
/// # Ok::<(), minimqtt::network::application::mqtt::Error>(())
/// ```
pub struct Session<
    'a,
    N,
    K,
    H = Discard,
    const MAX_PENDING: usize = DEFAULT_MAX_PENDING,
    const RX: usize = DEFAULT_RX_BUFFER,
> where
    N: Connect,
    K: Clock,
    H: MessageHandler,
{
    connector: N,
    connection: Option<N::Connection>,
    clock: K,
    config: Config<'a>,
    handler: H,
    state: State,
    client_id: String<MAX_CLIENT_ID_LEN>,
    packet_ids: PacketIdAllocator,
    pending: PendingTable<MAX_PENDING>,
    rx: RxBuffer<RX>,
    tx: PacketBuffer,
    last_activity_ms: u64,
    awaiting_pingresp: bool,
}

impl<'a, N, K> Session<'a, N, K>
where
    N: Connect,
    K: Clock,
{
    /// A disconnected session with default buffer sizes and no handler.
    pub fn new(connector: N, clock: K, config: Config<'a>) -> Self {
        Self::with_capacity(connector, clock, config)
    }
}

impl<'a, N, K, const MAX_PENDING: usize, const RX: usize> Session<'a, N, K, Discard, MAX_PENDING, RX>
where
    N: Connect,
    K: Clock,
{
    /// A disconnected session with explicit buffer sizes and no handler.
    pub fn with_capacity(connector: N, clock: K, config: Config<'a>) -> Self {
        Self {
            connector,
            connection: None,
            clock,
            config,
            handler: Discard,
            state: State::Disconnected,
            client_id: String::new(),
            packet_ids: PacketIdAllocator::new(),
            pending: PendingTable::new(),
            rx: RxBuffer::new(),
            tx: PacketBuffer::new(),
            last_activity_ms: 0,
            awaiting_pingresp: false,
        }
    }
}

impl<'a, N, K, H, const MAX_PENDING: usize, const RX: usize> Session<'a, N, K, H, MAX_PENDING, RX>
where
    N: Connect,
    K: Clock,
    H: MessageHandler,
{
    /// Replace the message handler, possibly with one of a different type.
    pub fn with_handler<H2: MessageHandler>(self, handler: H2) -> Session<'a, N, K, H2, MAX_PENDING, RX> {
        Session {
            connector: self.connector,
            connection: self.connection,
            clock: self.clock,
            config: self.config,
            handler,
            state: self.state,
            client_id: self.client_id,
            packet_ids: self.packet_ids,
            pending: self.pending,
            rx: self.rx,
            tx: self.tx,
            last_activity_ms: self.last_activity_ms,
            awaiting_pingresp: self.awaiting_pingresp,
        }
    }

    /// Replace the message handler in place.
    pub fn set_handler(&mut self, handler: H) {
        self.handler = handler;
    }

    /// Open the transport and perform the CONNECT/CONNACK handshake.
    ///
    /// Waits at most [`Config::connect_timeout_ms`] for the CONNACK. On any
    /// failure the transport is closed and the session is back in
    /// [`State::Disconnected`]; nothing is retried.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidState`] - the session is not disconnected
    /// * [`Error::Encoding`] - the client identifier is empty or too long
    /// * [`Error::Transport`] - the transport could not be opened or written
    /// * [`Error::Timeout`] - no CONNACK arrived in time
    /// * [`Error::Protocol`] - the broker refused or answered with something else
    pub fn connect(&mut self, client_id: &str) -> Result<(), Error> {
        if self.state != State::Disconnected {
            return Err(Error::InvalidState(self.state));
        }
        if client_id.is_empty() {
            return Err(EncodingError::EmptyClientId.into());
        }
        let candidate = String::try_from(client_id).map_err(|_| EncodingError::PacketTooLarge)?;
        let accepted = core::mem::replace(&mut self.client_id, candidate);
        let result = self.establish();
        if result.is_err() {
            self.client_id = accepted;
        }
        result
    }

    /// [`connect`](Self::connect) with [`Config::client_id`].
    pub fn connect_default(&mut self) -> Result<(), Error> {
        let client_id = self.config.client_id;
        self.connect(client_id)
    }

    /// Send DISCONNECT and close the transport.
    ///
    /// The session ends up disconnected even when writing DISCONNECT fails;
    /// that failure is still reported. Unacknowledged publishes are dropped.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        if self.state != State::Connected {
            return Err(Error::InvalidState(self.state));
        }
        let sent = packet::encode_disconnect(&mut self.tx)
            .map_err(Error::from)
            .and_then(|()| self.send());
        self.drop_connection();
        info!("disconnected from {}:{}", self.config.host, self.config.port);
        sent
    }

    /// Publish `payload` on `topic`.
    ///
    /// For QoS 1 a packet identifier is allocated and the message is tracked
    /// until its PUBACK arrives; the identifier is returned. Success means the
    /// bytes were written, not that the message was delivered.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidState`] - not connected; nothing is written
    /// * [`Error::PendingFull`] - no slot to track another QoS 1 publish
    /// * [`Error::Encoding`] - bad topic, QoS 2, or the packet exceeds the
    ///   single-byte remaining length
    /// * [`Error::Transport`] - the write failed; the session disconnects
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<Option<PacketId>, Error> {
        self.ensure_connected()?;
        let packet_id = match qos {
            QoS::AtMostOnce => None,
            QoS::AtLeastOnce => {
                if self.pending.is_full() {
                    return Err(Error::PendingFull);
                }
                Some(self.next_packet_id()?)
            }
            QoS::ExactlyOnce => return Err(EncodingError::UnsupportedQoS.into()),
        };
        let message = Publish {
            topic,
            payload,
            qos,
            retain,
            dup: false,
            packet_id,
        };
        packet::encode_publish(&message, &mut self.tx)?;
        let entry = match packet_id {
            Some(_) => Some(PendingPublish::new(&message, self.clock.now_ms())?),
            None => None,
        };
        self.transmit()?;

        if let (Some(id), Some(entry)) = (packet_id, entry) {
            self.pending.insert(id, entry).map_err(|_| Error::PendingFull)?;
        }
        debug!("published {=usize} bytes to {}", payload.len(), topic);
        Ok(packet_id)
    }

    /// Subscribe to `topic_filter`.
    ///
    /// The SUBACK is not waited for; when it arrives [`poll`](Self::poll)
    /// logs it, and a rejected subscription is only visible in the log.
    /// Returns the identifier the SUBSCRIBE was sent with.
    pub fn subscribe(&mut self, topic_filter: &str, qos: QoS) -> Result<PacketId, Error> {
        self.ensure_connected()?;
        let packet_id = self.next_packet_id()?;
        packet::encode_subscribe(packet_id, topic_filter, qos, &mut self.tx)?;
        self.transmit()?;
        info!("subscribed to {} (packet {})", topic_filter, packet_id);
        Ok(packet_id)
    }

    /// Drive the session; call this regularly from the application loop.
    ///
    /// 1. Reads whatever the transport has buffered and dispatches every
    ///    complete packet: PUBLISH goes to the handler (QoS 1 ones are
    ///    PUBACKed first), PUBACK retires the matching pending entry.
    /// 2. Re-sends QoS 1 publishes whose PUBACK is overdue, and gives up on
    ///    those that ran out of retries.
    /// 3. Sends a PINGREQ once the keepalive interval has passed since the
    ///    last CONNACK or PINGRESP, and waits for the answer. If none comes
    ///    the session disconnects and, depending on [`ReconnectPolicy`],
    ///    tries to connect once more.
    ///
    /// Does nothing while not connected. A malformed PUBLISH is dropped
    /// without reaching the handler and reported as [`Error::Protocol`]; the
    /// session stays connected.
    pub fn poll(&mut self) -> Result<(), Error> {
        if self.state != State::Connected {
            return Ok(());
        }
        self.service_inbound()?;
        if self.state != State::Connected {
            return Ok(());
        }
        self.service_retries()?;
        self.service_keep_alive();
        Ok(())
    }

    /// Current connection state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Shorthand for `state() == State::Connected`.
    pub fn is_connected(&self) -> bool {
        self.state == State::Connected
    }

    /// QoS 1 publishes still waiting for a PUBACK.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// `packet_id` belongs to a QoS 1 publish still waiting for a PUBACK.
    pub fn is_pending(&self, packet_id: PacketId) -> bool {
        self.pending.contains(packet_id)
    }

    /// Identifier of the last successful connection; empty before the first.
    ///
    /// This is the identifier a keepalive reconnect uses.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The session configuration.
    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    /// The clock driving timeouts.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// The clock driving timeouts, mutably.
    pub fn clock_mut(&mut self) -> &mut K {
        &mut self.clock
    }

    /// The message handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The message handler, mutably.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// The open transport connection, if any.
    pub fn connection(&self) -> Option<&N::Connection> {
        self.connection.as_ref()
    }

    /// The open transport connection, mutably.
    pub fn connection_mut(&mut self) -> Option<&mut N::Connection> {
        self.connection.as_mut()
    }

    fn ensure_connected(&self) -> Result<(), Error> {
        match self.state {
            State::Connected => Ok(()),
            state => Err(Error::InvalidState(state)),
        }
    }

    fn next_packet_id(&mut self) -> Result<PacketId, Error> {
        let pending = &self.pending;
        self.packet_ids
            .next_unused(|id| pending.contains(id))
            .ok_or(Error::PendingFull)
    }

    /// Connect using the stored client identifier.
    fn establish(&mut self) -> Result<(), Error> {
        self.state = State::Connecting;
        info!(
            "connecting to {}:{} as {}",
            self.config.host,
            self.config.port,
            self.client_id.as_str()
        );
        match self.handshake() {
            Ok(()) => {
                self.state = State::Connected;
                self.last_activity_ms = self.clock.now_ms();
                self.awaiting_pingresp = false;
                info!("connected as {}", self.client_id.as_str());
                Ok(())
            }
            Err(e) => {
                error!("connect failed: {}", e);
                self.drop_connection();
                Err(e)
            }
        }
    }

    fn handshake(&mut self) -> Result<(), Error> {
        let mut remote: String<REMOTE_LEN> = String::new();
        write!(remote, "{}:{}", self.config.host, self.config.port)
            .map_err(|_| TransportError::InvalidAddress)?;
        let connection = self
            .connector
            .connect(&remote)
            .map_err(|_| TransportError::ConnectionRefused)?;
        self.connection = Some(connection);
        self.rx.clear();
        self.pending.clear();

        packet::encode_connect(&self.client_id, self.config.keep_alive_secs, &mut self.tx)?;
        self.send()?;
        self.await_connack()
    }

    fn await_connack(&mut self) -> Result<(), Error> {
        let started = self.clock.now_ms();
        loop {
            self.fill_rx()?;
            if let Some(header) = self.rx.next_frame()? {
                let verdict = match packet::decode(self.rx.frame(header)) {
                    Ok(Packet::ConnAck { return_code: 0, .. }) => Ok(()),
                    Ok(Packet::ConnAck { return_code, .. }) => {
                        Err(ProtocolError::ConnectionRefused(return_code).into())
                    }
                    Ok(_) => Err(ProtocolError::UnexpectedPacket.into()),
                    Err(e) => Err(e.into()),
                };
                self.rx.consume(header.total_len());
                return verdict;
            }
            if self.clock.elapsed_since(started) >= u64::from(self.config.connect_timeout_ms) {
                return Err(Error::Timeout);
            }
            self.clock.delay_ms(self.config.wait_step_ms.max(1));
        }
    }

    fn service_inbound(&mut self) -> Result<(), Error> {
        loop {
            let received = match self.fill_rx() {
                Ok(n) => n,
                Err(e) => {
                    error!("read failed: {}", e);
                    self.drop_connection();
                    return Err(e);
                }
            };
            let dispatched = self.dispatch_frames()?;
            if received == 0 && dispatched == 0 {
                return Ok(());
            }
        }
    }

    /// Move available transport bytes into the receive buffer.
    fn fill_rx(&mut self) -> Result<usize, Error> {
        let connection = self.connection.as_mut().ok_or(TransportError::NotOpen)?;
        let mut total = 0;
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let want = connection.available().min(self.rx.room()).min(READ_CHUNK);
            if want == 0 {
                return Ok(total);
            }
            let read = connection
                .read(&mut chunk[..want])
                .map_err(|_| TransportError::ReadError)?;
            if read == 0 {
                return Ok(total);
            }
            self.rx.extend(&chunk[..read]);
            total += read;
        }
    }

    fn dispatch_frames(&mut self) -> Result<usize, Error> {
        let mut dispatched = 0;
        loop {
            let header = match self.rx.next_frame() {
                Ok(Some(header)) => header,
                Ok(None) => return Ok(dispatched),
                Err(e) => {
                    error!("lost packet framing: {}", e);
                    self.drop_connection();
                    return Err(e.into());
                }
            };
            let outcome = self.dispatch(header);
            self.rx.consume(header.total_len());
            dispatched += 1;
            if let Err(e) = outcome {
                if let Error::Transport(_) = e {
                    self.drop_connection();
                }
                return Err(e);
            }
        }
    }

    fn dispatch(&mut self, header: FrameHeader) -> Result<(), Error> {
        let now = self.clock.now_ms();
        match packet::decode(self.rx.frame(header)) {
            Ok(Packet::Publish(message)) if message.qos == QoS::ExactlyOnce => {
                warn!("dropping QoS 2 PUBLISH on {}", message.topic);
                Ok(())
            }
            Ok(Packet::Publish(message)) => {
                trace!(
                    "PUBLISH {} ({=usize} bytes)",
                    message.topic,
                    message.payload.len()
                );
                let acked = match message.packet_id {
                    Some(id) => packet::encode_puback(id, &mut self.tx)
                        .map_err(Error::from)
                        .and_then(|()| write_all(self.connection.as_mut(), &self.tx)),
                    None => Ok(()),
                };
                self.handler.on_message(&message);
                acked
            }
            Ok(Packet::PubAck(id)) => {
                if self.pending.remove(id).is_some() {
                    debug!("PUBACK {}", id);
                } else {
                    debug!("ignoring PUBACK for unknown packet {}", id);
                }
                Ok(())
            }
            Ok(Packet::SubAck {
                packet_id,
                return_code,
            }) => {
                if return_code == packet::SUBACK_FAILURE {
                    warn!("subscription {} rejected by broker", packet_id);
                } else {
                    debug!("SUBACK {} granted QoS {=u8}", packet_id, return_code);
                }
                Ok(())
            }
            Ok(Packet::PingResp) => {
                trace!("PINGRESP");
                self.last_activity_ms = now;
                self.awaiting_pingresp = false;
                Ok(())
            }
            Ok(Packet::ConnAck { .. }) => {
                warn!("ignoring CONNACK on an established session");
                Ok(())
            }
            Err(ProtocolError::Unsupported(kind)) => {
                debug!("skipping unsupported packet 0x{=u8:x}", kind);
                Ok(())
            }
            Err(e) => {
                warn!("discarding malformed packet: {}", e);
                Err(e.into())
            }
        }
    }

    fn service_retries(&mut self) -> Result<(), Error> {
        let interval = u64::from(self.config.retry_interval_ms);
        if interval == 0 || self.pending.is_empty() {
            return Ok(());
        }
        let now = self.clock.now_ms();
        for id in self.pending.due(now, interval) {
            let Some(entry) = self.pending.get_mut(id) else {
                continue;
            };
            if entry.attempts >= self.config.max_retries {
                warn!("giving up on packet {} after {=u8} retries", id, entry.attempts);
                self.pending.remove(id);
                continue;
            }
            entry.attempts += 1;
            entry.sent_at_ms = now;
            debug!("re-sending packet {} (attempt {=u8})", id, entry.attempts);
            packet::encode_publish(&entry.as_publish(id, true), &mut self.tx)?;
            if let Err(e) = write_all(self.connection.as_mut(), &self.tx) {
                error!("re-send failed: {}", e);
                self.drop_connection();
                return Err(e);
            }
        }
        Ok(())
    }

    fn service_keep_alive(&mut self) {
        let interval = u64::from(self.config.keep_alive_secs) * 1_000;
        if interval == 0 || self.clock.elapsed_since(self.last_activity_ms) < interval {
            return;
        }
        let Err(e) = self.ping() else {
            return;
        };
        warn!("keepalive failed: {}", e);
        self.drop_connection();
        if self.config.reconnect == ReconnectPolicy::SameClientId {
            info!("reconnecting as {}", self.client_id.as_str());
            // a failure here is already logged and leaves the session disconnected
            let _ = self.establish();
        }
    }

    /// Send PINGREQ and wait for PINGRESP, dispatching whatever else arrives.
    fn ping(&mut self) -> Result<(), Error> {
        packet::encode_pingreq(&mut self.tx)?;
        self.send()?;
        self.awaiting_pingresp = true;
        let started = self.clock.now_ms();
        loop {
            match self.service_inbound() {
                Ok(()) => {}
                Err(Error::Protocol(e)) if self.state == State::Connected => {
                    warn!("ignoring malformed packet while waiting for PINGRESP: {}", e);
                }
                Err(e) => return Err(e),
            }
            if !self.awaiting_pingresp {
                return Ok(());
            }
            if self.clock.elapsed_since(started) >= u64::from(self.config.ping_timeout_ms) {
                return Err(Error::Timeout);
            }
            self.clock.delay_ms(self.config.wait_step_ms.max(1));
        }
    }

    /// Write the packet in `tx`, disconnecting if that fails.
    fn transmit(&mut self) -> Result<(), Error> {
        let sent = self.send();
        if let Err(e) = &sent {
            error!("write failed: {}", e);
            self.drop_connection();
        }
        sent
    }

    fn send(&mut self) -> Result<(), Error> {
        write_all(self.connection.as_mut(), &self.tx)
    }

    /// Close the transport and reset per-connection state.
    fn drop_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            if connection.close().is_err() {
                warn!("closing the transport failed");
            }
        }
        self.state = State::Disconnected;
        self.awaiting_pingresp = false;
        self.pending.clear();
        self.rx.clear();
    }
}

impl<N, K, H, const MAX_PENDING: usize, const RX: usize> fmt::Debug
    for Session<'_, N, K, H, MAX_PENDING, RX>
where
    N: Connect,
    K: Clock,
    H: MessageHandler,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("client_id", &self.client_id.as_str())
            .field("config", &self.config)
            .field("pending", &self.pending.len())
            .field("buffered", &self.rx.len())
            .finish_non_exhaustive()
    }
}

/// Write all of `bytes`, looping over short writes, then flush.
fn write_all<C>(connection: Option<&mut C>, bytes: &[u8]) -> Result<(), Error>
where
    C: Write,
{
    let connection = connection.ok_or(TransportError::NotOpen)?;
    let mut written = 0;
    while written < bytes.len() {
        match connection.write(&bytes[written..]) {
            Ok(0) => return Err(TransportError::ConnectionClosed.into()),
            Ok(n) => written += n,
            Err(_) => return Err(TransportError::WriteError.into()),
        }
    }
    connection.flush().map_err(|_| TransportError::WriteError)?;
    trace!("wrote {=usize} bytes", bytes.len());
    Ok(())
}
