use criterion::{criterion_group, criterion_main};

mod network {
    pub mod application {
        pub mod mqtt {
            pub mod packet;
            pub mod session;
        }
    }
}

use network::application::mqtt::{packet, session};

criterion_group!(
    benches,
    packet::bench_encode_publish,
    packet::bench_decode_publish,
    packet::bench_frame_header,
    session::bench_publish_qos0,
    session::bench_publish_and_poll_qos1,
    session::bench_poll_inbound
);
criterion_main!(benches);
