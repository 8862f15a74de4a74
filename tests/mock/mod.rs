//! Mock broker, transport and clock for session tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use minimqtt::network::error::Error;
use minimqtt::network::{Available, Close, Connect, Connection, Read, Write};
use minimqtt::system::Clock;

/// Scripted broker shared between a test and the connections it hands out
#[derive(Clone, Default)]
pub struct Broker {
    state: Rc<RefCell<BrokerState>>,
}

#[derive(Default)]
struct BrokerState {
    inbound: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    remotes: Vec<String>,
    closes: usize,
    connack: Option<u8>,
    pingresp: bool,
    ping_preamble: Vec<u8>,
    puback: bool,
    fail_connect: bool,
    fail_write: bool,
}

impl Broker {
    /// A broker that accepts connections and answers pings
    pub fn new() -> Self {
        let broker = Self::default();
        broker.set_connack(Some(0));
        broker.set_pingresp(true);
        broker
    }

    /// Return code sent in reply to CONNECT, or no reply at all
    pub fn set_connack(&self, return_code: Option<u8>) {
        self.state.borrow_mut().connack = return_code;
    }

    /// Answer PINGREQ with PINGRESP
    pub fn set_pingresp(&self, enabled: bool) {
        self.state.borrow_mut().pingresp = enabled;
    }

    /// Bytes delivered right before the next PINGRESP
    pub fn set_ping_preamble(&self, bytes: &[u8]) {
        self.state.borrow_mut().ping_preamble = bytes.to_vec();
    }

    /// Answer QoS 1 PUBLISH with PUBACK
    pub fn set_puback(&self, enabled: bool) {
        self.state.borrow_mut().puback = enabled;
    }

    /// Refuse new connections
    pub fn set_fail_connect(&self, enabled: bool) {
        self.state.borrow_mut().fail_connect = enabled;
    }

    /// Fail every write
    pub fn set_fail_write(&self, enabled: bool) {
        self.state.borrow_mut().fail_write = enabled;
    }

    /// Queue bytes for the client to read
    pub fn push(&self, bytes: &[u8]) {
        self.state.borrow_mut().inbound.extend(bytes.iter().copied());
    }

    /// Bytes queued but not yet read by the client
    pub fn unread(&self) -> usize {
        self.state.borrow().inbound.len()
    }

    /// Every packet written so far, one entry per write call
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.borrow().written.clone()
    }

    /// Take and forget the packets written so far
    pub fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.state.borrow_mut().written)
    }

    /// Addresses passed to `connect`
    pub fn remotes(&self) -> Vec<String> {
        self.state.borrow().remotes.clone()
    }

    /// Number of connections closed by the client
    pub fn closes(&self) -> usize {
        self.state.borrow().closes
    }

    /// A connector that opens connections to this broker
    pub fn network(&self) -> MockNetwork {
        MockNetwork {
            broker: self.clone(),
        }
    }

    fn reply_to(state: &mut BrokerState, packet: &[u8]) {
        let Some(&header) = packet.first() else {
            return;
        };
        match header & 0xF0 {
            0x10 => {
                if let Some(code) = state.connack {
                    state.inbound.extend([0x20, 0x02, 0x00, code]);
                }
            }
            0xC0 => {
                let preamble = std::mem::take(&mut state.ping_preamble);
                state.inbound.extend(preamble);
                if state.pingresp {
                    state.inbound.extend([0xD0, 0x00]);
                }
            }
            0x30 if header & 0x06 == 0x02 && state.puback => {
                let topic_len = usize::from(u16::from_be_bytes([packet[2], packet[3]]));
                let id = &packet[4 + topic_len..6 + topic_len];
                state.inbound.extend([0x40, 0x02, id[0], id[1]]);
            }
            _ => {}
        }
    }
}

/// Connector handing out [`MockConnection`]s
pub struct MockNetwork {
    broker: Broker,
}

impl Connect for MockNetwork {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let mut state = self.broker.state.borrow_mut();
        state.remotes.push(remote.to_string());
        if state.fail_connect {
            return Err(Error::ConnectionRefused);
        }
        Ok(MockConnection {
            broker: self.broker.clone(),
        })
    }
}

/// One connection to the mock broker
pub struct MockConnection {
    broker: Broker,
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.broker.state.borrow_mut();
        let len = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut state = self.broker.state.borrow_mut();
        if state.fail_write {
            return Err(Error::WriteError);
        }
        state.written.push(buf.to_vec());
        Broker::reply_to(&mut state, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Available for MockConnection {
    fn available(&mut self) -> usize {
        self.broker.state.borrow().inbound.len()
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        self.broker.state.borrow_mut().closes += 1;
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Manually driven clock; `delay_ms` advances it instead of sleeping
#[derive(Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}
