use std::hint::black_box;

use criterion::{Criterion, Throughput};
use minimqtt::network::application::mqtt::packet::{
    PacketBuffer, decode, decode_remaining_length, encode_publish, frame_header,
};
use minimqtt::network::application::mqtt::{PacketId, Publish, QoS};

const PAYLOAD: &[u8] = b"{\"temperature\":23.5,\"humidity\":41}";

fn message(qos: QoS) -> Publish<'static> {
    Publish {
        topic: "sensors/greenhouse/1",
        payload: PAYLOAD,
        qos,
        retain: false,
        dup: false,
        packet_id: match qos {
            QoS::AtMostOnce => None,
            _ => PacketId::new(42),
        },
    }
}

pub fn bench_encode_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_publish");
    group.throughput(Throughput::Bytes(PAYLOAD.len() as u64));
    for (name, qos) in [("qos0", QoS::AtMostOnce), ("qos1", QoS::AtLeastOnce)] {
        let message = message(qos);
        let mut buf = PacketBuffer::new();
        group.bench_function(name, |b| {
            b.iter(|| {
                encode_publish(black_box(&message), &mut buf).expect("fits");
                black_box(buf.len())
            })
        });
    }
    group.finish();
}

pub fn bench_decode_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_publish");
    let mut frame = PacketBuffer::new();
    encode_publish(&message(QoS::AtLeastOnce), &mut frame).expect("fits");
    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("qos1", |b| {
        b.iter(|| decode(black_box(&frame)).expect("valid frame"))
    });
    group.finish();
}

pub fn bench_frame_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_header");
    let short = [0x30, 0x7F];
    let long = [0x30, 0xFF, 0xFF, 0xFF, 0x7F];
    group.bench_function("one_byte_length", |b| {
        b.iter(|| frame_header(black_box(&short)))
    });
    group.bench_function("four_byte_length", |b| {
        b.iter(|| decode_remaining_length(black_box(&long[1..])))
    });
    group.finish();
}
