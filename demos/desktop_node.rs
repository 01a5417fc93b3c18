//! Desktop line monitor against a real MQTT broker.
//!
//! Runs the full pipeline with simulated lines: line A toggles every two
//! seconds, line B every five. Reports go to the broker given by
//! `MQTT_HOST` / `MQTT_PORT` (default `localhost:1883`).
//!
//! # Usage
//!
//! ```sh
//! mosquitto_sub -t 'linewatch/#' -v &
//! cargo run --example desktop_node --features mqtt
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;
use rs_linewatch::hal::MockLines;
use rs_linewatch::services::{RumqttTransport, StdClock, ThreadScheduler};
use rs_linewatch::traits::{Clock, Indicator, LineInput, StatusIndicator};
use rs_linewatch::{
    startup, ChangeBuffer, Config, EdgeNode, LineId, LineValues, MqttConfig, Publisher, Sampler,
};

/// Logs indicator changes instead of driving LEDs.
struct ConsoleIndicator;

impl StatusIndicator for ConsoleIndicator {
    type Error = core::convert::Infallible;

    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), Self::Error> {
        info!("[LED] {:?} {}", indicator, if on { "on" } else { "off" });
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let host = std::env::var("MQTT_HOST").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(1883);
    let config = Config::default().with_mqtt(
        MqttConfig::default()
            .with_host(&host)
            .with_port(port)
            .with_client_id("rs-linewatch-desktop")
            .with_reconnect_interval_ms(5_000),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let clock = StdClock::new();

    let lines = Arc::new(MockLines::new(LineValues::default()));
    let changes: &'static ChangeBuffer = Box::leak(Box::new(ChangeBuffer::new()));

    let mut scheduler = ThreadScheduler::new();
    if let Err(e) = startup::register_sampler(
        &mut scheduler,
        Sampler::new(Arc::clone(&lines), changes),
        config.timing.sample_period_us,
    ) {
        std::process::exit(e.exit_code());
    }

    // Simulated wiring
    let sim = Arc::clone(&lines);
    thread::spawn(move || {
        let mut tick = 0u32;
        loop {
            thread::sleep(Duration::from_secs(1));
            tick += 1;
            if tick % 2 == 0 {
                sim.set(LineId::A, !sim.read_all().a);
            }
            if tick % 5 == 0 {
                sim.set(LineId::B, !sim.read_all().b);
            }
        }
    });

    let publisher = Publisher::new(
        RumqttTransport::new(runtime.handle().clone()),
        ConsoleIndicator,
        config.mqtt.clone(),
        config.indicator.pulse_ms,
    );
    let mut node = EdgeNode::new(Arc::clone(&lines), changes, publisher);
    node.start(clock.now_ms());

    info!("Monitoring simulated lines, Ctrl-C to stop");
    loop {
        node.tick(clock.now_ms());
        thread::sleep(Duration::from_millis(config.timing.loop_interval_ms as u64));
    }
}
