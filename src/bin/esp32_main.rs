//! ESP32-C3 SuperMini line monitor.
//!
//! Boot sequence:
//! - Registers the periodic sampler on the ESP timer service (exit 1 on failure)
//! - Joins the configured WiFi network (exit -1 on failure)
//! - Requests the MQTT connection
//!
//! Then the foreground loop runs forever: drain connection events, dispatch
//! pending edges, expire the activity LED, sleep.
//!
//! # Build
//!
//! ```bash
//! WIFI_SSID=Workshop WIFI_PASSWORD=secret MQTT_HOST=192.168.1.10 \
//!     cargo build --release --features esp32 --bin esp32_main
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{OutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info};
use rs_linewatch::hal::esp32::{
    Esp32Clock, Esp32Lines, Esp32MqttTransport, Esp32Scheduler, Esp32Wifi, GpioIndicator,
};
use rs_linewatch::traits::Clock;
use rs_linewatch::{
    startup, ChangeBuffer, Config, EdgeNode, IndicatorConfig, LineConfig, MqttConfig, Polarity,
    Publisher, Sampler, StartupError, TimingConfig, WifiConfig,
};

/// Change flags shared by the sampler timer and the main loop.
static CHANGES: ChangeBuffer = ChangeBuffer::new();

fn env_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn build_config() -> Config {
    let mut mqtt = MqttConfig::default()
        .with_host(option_env!("MQTT_HOST").unwrap_or("localhost"))
        .with_port(env_or(option_env!("MQTT_PORT"), 1883))
        .with_client_id(option_env!("MQTT_CLIENT_ID").unwrap_or("rs-linewatch"))
        .with_reconnect_interval_ms(env_or(option_env!("MQTT_RECONNECT_MS"), 0));
    if let Some(topic) = option_env!("MQTT_STATE_TOPIC") {
        mqtt = mqtt.with_state_topic(topic);
    }
    if let Some(topic) = option_env!("MQTT_ANNOUNCE_TOPIC") {
        mqtt = mqtt.with_announce_topic(topic);
    }
    if let Some(user) = option_env!("MQTT_USER") {
        mqtt = mqtt.with_auth(user, option_env!("MQTT_PASSWORD").unwrap_or(""));
    }

    let polarity = match option_env!("LINE_POLARITY") {
        Some("high") => Polarity::ActiveHigh,
        _ => Polarity::ActiveLow,
    };

    Config::default()
        .with_wifi(
            WifiConfig::default()
                .with_ssid(option_env!("WIFI_SSID").unwrap_or(""))
                .with_password(option_env!("WIFI_PASSWORD").unwrap_or("")),
        )
        .with_mqtt(mqtt)
        .with_lines(LineConfig::default().with_polarity(polarity))
        .with_timing(
            TimingConfig::default()
                .with_sample_period_us(env_or(option_env!("SAMPLE_PERIOD_US"), 1_000)),
        )
        .with_indicator(IndicatorConfig::default())
}

fn abort(err: StartupError) -> ! {
    error!("[FATAL] {}", err);
    std::process::exit(err.exit_code());
}

fn main() -> anyhow::Result<()> {
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    println!();
    println!("================================");
    println!("  rs-linewatch SuperMini Monitor");
    println!("================================");
    println!();

    let config = build_config();
    let peripherals = Peripherals::take()?;
    let clock = Esp32Clock::new();

    // =========================================================================
    // Input lines (GPIO6/7, pull-up)
    // =========================================================================
    let lines = Arc::new(Esp32Lines::new(
        peripherals.pins.gpio6,
        peripherals.pins.gpio7,
        config.lines.polarity,
    )?);
    info!("[OK] Lines initialized (GPIO6/7, {:?})", config.lines.polarity);

    // =========================================================================
    // Periodic sampler
    // =========================================================================
    let mut scheduler = Esp32Scheduler::new()?;
    if let Err(e) = startup::register_sampler(
        &mut scheduler,
        Sampler::new(Arc::clone(&lines), &CHANGES),
        config.timing.sample_period_us,
    ) {
        abort(e);
    }

    // =========================================================================
    // WiFi
    // =========================================================================
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let mut wifi = Esp32Wifi::new(peripherals.modem, sysloop, Some(nvs));
    if let Err(e) = startup::bring_up_network(&mut wifi, &config.wifi) {
        abort(e);
    }

    // =========================================================================
    // Status LEDs (GPIO2/3/8)
    // =========================================================================
    let indicator = GpioIndicator::new(
        PinDriver::output(peripherals.pins.gpio2.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio3.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio8.downgrade_output())?,
    );

    // =========================================================================
    // MQTT
    // =========================================================================
    let publisher = Publisher::new(
        Esp32MqttTransport::new(),
        indicator,
        config.mqtt.clone(),
        config.indicator.pulse_ms,
    );
    let mut node = EdgeNode::new(Arc::clone(&lines), &CHANGES, publisher);
    if config.mqtt.enabled {
        node.start(clock.now_ms());
    } else {
        info!("[SKIP] MQTT disabled");
    }

    info!(
        "Starting main loop ({} ms interval, sampling every {} us)",
        config.timing.loop_interval_ms, config.timing.sample_period_us
    );

    // =========================================================================
    // Main Loop
    // =========================================================================
    loop {
        node.tick(clock.now_ms());
        thread::sleep(Duration::from_millis(config.timing.loop_interval_ms as u64));
    }
}
