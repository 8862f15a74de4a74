use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput};
use minimqtt::network::application::mqtt::{Config, QoS, Session};
use minimqtt::network::error::Error;
use minimqtt::network::{Available, Close, Connect, Connection, Read, Write};
use minimqtt::system::Clock;

/// In-memory broker that acknowledges everything it is sent
#[derive(Clone, Default)]
struct Loopback {
    inbound: Rc<RefCell<VecDeque<u8>>>,
}

impl Read for Loopback {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut inbound = self.inbound.borrow_mut();
        let len = buf.len().min(inbound.len());
        for (slot, byte) in buf.iter_mut().zip(inbound.drain(..len)) {
            *slot = byte;
        }
        Ok(len)
    }
}

impl Write for Loopback {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut inbound = self.inbound.borrow_mut();
        match buf[0] & 0xF0 {
            0x10 => inbound.extend([0x20, 0x02, 0x00, 0x00]),
            0xC0 => inbound.extend([0xD0, 0x00]),
            0x30 if buf[0] & 0x06 == 0x02 => {
                let topic_len = usize::from(u16::from_be_bytes([buf[2], buf[3]]));
                inbound.extend([0x40, 0x02, buf[4 + topic_len], buf[5 + topic_len]]);
            }
            _ => {}
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Available for Loopback {
    fn available(&mut self) -> usize {
        self.inbound.borrow().len()
    }
}

impl Close for Loopback {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for Loopback {}

impl Connect for Loopback {
    type Connection = Loopback;
    type Error = Error;

    fn connect(&mut self, _remote: &str) -> Result<Self::Connection, Self::Error> {
        Ok(self.clone())
    }
}

#[derive(Default)]
struct FrozenClock(Cell<u64>);

impl Clock for FrozenClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.set(self.0.get() + u64::from(ms));
    }
}

fn setup() -> (Session<'static, Loopback, FrozenClock>, Loopback) {
    let broker = Loopback::default();
    let config = Config::new("bench.local", "minimqtt-bench");
    let mut session = Session::new(broker.clone(), FrozenClock::default(), config);
    session.connect_default().expect("loopback accepts");
    (session, broker)
}

pub fn bench_publish_qos0(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_publish_qos0");
    let payload = b"hello world from bench";
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish", |b| {
        b.iter_batched_ref(
            setup,
            |(session, _)| {
                session
                    .publish("minimqtt/bench", payload, QoS::AtMostOnce, false)
                    .expect("Failed to publish");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_publish_and_poll_qos1(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_publish_and_poll_qos1");
    let payload = b"hello world from bench qos1";
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));
    group.bench_function("publish_and_poll_qos1", |b| {
        b.iter_batched_ref(
            setup,
            |(session, _)| {
                for _ in 0..50 {
                    session
                        .publish("minimqtt/bench", payload, QoS::AtLeastOnce, false)
                        .expect("Failed to publish");
                    session.poll().expect("Failed to poll");
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_poll_inbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_poll_inbound");
    let mut frame = vec![0x30, 0x17, 0x00, 0x0E];
    frame.extend_from_slice(b"minimqtt/bench");
    frame.extend_from_slice(b"inbound");
    group.throughput(Throughput::Bytes(frame.len() as u64 * 10));
    group.bench_function("ten_messages", |b| {
        b.iter_batched_ref(
            || {
                let (session, broker) = setup();
                for _ in 0..10 {
                    broker.inbound.borrow_mut().extend(frame.iter().copied());
                }
                (session, broker)
            },
            |(session, _)| session.poll().expect("Failed to poll"),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
