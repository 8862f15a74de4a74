//! Publishes "Button pressed" whenever Enter is hit and prints whatever
//! arrives on `test/topic`.
//!
//! ```text
//! cargo run --example button_publisher --features std [config.json]
//! ```
//!
//! Without a configuration file the broker is expected at
//! 192.168.45.188:1883. A configuration file looks like
//! `{"host":"127.0.0.1","client_id":"ESP32Client","keep_alive_secs":30}`.

use std::io::BufRead;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;
use std::{env, fs, io, thread};

use minimqtt::network::application::mqtt::{Config, QoS, Session};
use minimqtt::network::tcp::TcpConnector;
use minimqtt::system::StdClock;

const TOPIC: &str = "test/topic";

fn main() {
    let json = env::args().nth(1).map(|path| {
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {path}: {e}"))
    });
    let config = match &json {
        Some(json) => Config::from_json(json).unwrap_or_else(|e| panic!("bad configuration: {e}")),
        None => Config::new("192.168.45.188", "ESP32Client"),
    };

    let mut session = Session::new(TcpConnector::new(), StdClock::new(), config).with_handler(
        |topic: &str, payload: &[u8]| {
            println!(
                "Message received on topic: {topic}. Payload: {}",
                String::from_utf8_lossy(payload)
            );
        },
    );

    match session.connect_default() {
        Ok(()) => {
            println!("Connected to MQTT server");
            if let Err(e) = session.subscribe(TOPIC, QoS::AtLeastOnce) {
                println!("Failed to subscribe: {e}");
            }
        }
        Err(e) => println!("Failed to connect to MQTT server: {e}"),
    }

    let (presses, button) = mpsc::channel();
    thread::spawn(move || {
        for _ in io::stdin().lock().lines() {
            if presses.send(()).is_err() {
                break;
            }
        }
    });

    loop {
        if let Err(e) = session.poll() {
            println!("poll: {e}");
        }

        match button.try_recv() {
            Ok(()) => {
                match session.publish(TOPIC, b"Button pressed", QoS::AtLeastOnce, true) {
                    Ok(_) => println!("Button pressed, message sent"),
                    Err(e) => println!("Failed to send message: {e}"),
                }
                thread::sleep(Duration::from_secs(1));
            }
            Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(10)),
            Err(TryRecvError::Disconnected) => break,
        }
    }

    let _ = session.disconnect();
}
