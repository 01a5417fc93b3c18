//! Shared configuration system for desktop and ESP32.
//!
//! Uses `heapless::String` for `no_std` compatibility while remaining
//! ergonomic to use on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::config::{Config, MqttConfig, TimingConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_mqtt(MqttConfig::default().with_host("192.168.1.100"))
//!     .with_timing(TimingConfig::default().with_sample_period_us(500));
//! ```

use heapless::String as HString;
use thiserror::Error;

use crate::lines::Polarity;

/// Maximum length for short config strings (hostnames, client IDs)
pub const MAX_SHORT_STRING: usize = 64;

/// Maximum length for longer config strings (topics, announcement payload)
pub const MAX_LONG_STRING: usize = 128;

/// Longest SSID allowed by 802.11
pub const MAX_SSID: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Type alias for WiFi network names
pub type SsidString = HString<MAX_SSID>;

/// Type alias for longer config strings
pub type LongString = HString<MAX_LONG_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long.
///
/// Only for fixed defaults and log text; configured values go through the
/// `with_*` setters, which reject what does not fit.
pub fn short_string(s: &str) -> ShortString {
    bounded(s)
}

/// Create a LongString from a &str, truncating if too long
pub fn long_string(s: &str) -> LongString {
    bounded(s)
}

fn bounded<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    // Largest char boundary that still fits
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= N)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// A configured value does not fit its fixed-capacity field.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{field} is {len} bytes, longer than the {max} byte limit")]
pub struct ConfigError {
    /// Name of the rejected field.
    pub field: &'static str,
    /// Length of the rejected value.
    pub len: usize,
    /// Capacity of the field.
    pub max: usize,
}

/// Store `value` in `slot` if it fits, otherwise leave `slot` as it was and
/// remember the first rejection.
fn assign<const N: usize>(
    slot: &mut HString<N>,
    rejected: &mut Option<ConfigError>,
    field: &'static str,
    value: &str,
) {
    let mut hs = HString::new();
    if hs.push_str(value).is_ok() {
        *slot = hs;
    } else if rejected.is_none() {
        *rejected = Some(ConfigError {
            field,
            len: value.len(),
            max: N,
        });
    }
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// MQTT client configuration
    pub mqtt: MqttConfig,
    /// Input line configuration
    pub lines: LineConfig,
    /// Sampler and foreground loop timing
    pub timing: TimingConfig,
    /// Status indicator configuration
    pub indicator: IndicatorConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set MQTT configuration
    pub fn with_mqtt(mut self, mqtt: MqttConfig) -> Self {
        self.mqtt = mqtt;
        self
    }

    /// Set input line configuration
    pub fn with_lines(mut self, lines: LineConfig) -> Self {
        self.lines = lines;
        self
    }

    /// Set timing configuration
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Set indicator configuration
    pub fn with_indicator(mut self, indicator: IndicatorConfig) -> Self {
        self.indicator = indicator;
        self
    }
}

// ============================================================================
// MQTT Config
// ============================================================================

/// MQTT client configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MqttConfig {
    /// Broker hostname or IPv4 address
    pub host: ShortString,
    /// Broker port
    pub port: u16,
    /// Client ID (should be unique per device)
    pub client_id: ShortString,
    /// Topic that receives a report for every dispatched edge batch
    pub state_topic: LongString,
    /// Topic that receives one announcement per accepted connection
    pub announce_topic: LongString,
    /// Payload of the connection announcement
    pub announce_payload: LongString,
    /// Username for authentication (empty = no auth)
    pub username: ShortString,
    /// Password for authentication
    pub password: ShortString,
    /// Keep-alive interval in seconds
    pub keep_alive_secs: u16,
    /// Delay before re-initializing a failed connection (0 = never)
    pub reconnect_interval_ms: u32,
    /// Whether MQTT is enabled
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    rejected: Option<ConfigError>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: short_string("localhost"),
            port: 1883,
            client_id: short_string("rs-linewatch"),
            state_topic: long_string("linewatch/lines"),
            announce_topic: long_string("linewatch/announce"),
            announce_payload: long_string("Hello from rs-linewatch!"),
            username: ShortString::new(),
            password: ShortString::new(),
            keep_alive_secs: 60,
            reconnect_interval_ms: 0,
            enabled: true,
            rejected: None,
        }
    }
}

impl MqttConfig {
    /// Set the broker host.
    ///
    /// Values that do not fit are not stored; [`validate`](Self::validate)
    /// reports them. The same holds for every string setter.
    pub fn with_host(mut self, host: &str) -> Self {
        assign(&mut self.host, &mut self.rejected, "host", host);
        self
    }

    /// Set the broker port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the client ID
    pub fn with_client_id(mut self, id: &str) -> Self {
        assign(&mut self.client_id, &mut self.rejected, "client_id", id);
        self
    }

    /// Set the line state topic
    pub fn with_state_topic(mut self, topic: &str) -> Self {
        assign(&mut self.state_topic, &mut self.rejected, "state_topic", topic);
        self
    }

    /// Set the announcement topic
    pub fn with_announce_topic(mut self, topic: &str) -> Self {
        assign(&mut self.announce_topic, &mut self.rejected, "announce_topic", topic);
        self
    }

    /// Set the announcement payload
    pub fn with_announce_payload(mut self, payload: &str) -> Self {
        assign(
            &mut self.announce_payload,
            &mut self.rejected,
            "announce_payload",
            payload,
        );
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        assign(&mut self.username, &mut self.rejected, "username", username);
        assign(&mut self.password, &mut self.rejected, "password", password);
        self
    }

    /// Set the keep-alive interval
    pub fn with_keep_alive_secs(mut self, secs: u16) -> Self {
        self.keep_alive_secs = secs;
        self
    }

    /// Set the reconnect interval (0 disables reconnection)
    pub fn with_reconnect_interval_ms(mut self, ms: u32) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }

    /// Enable or disable MQTT
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if authentication is configured
    pub fn has_auth(&self) -> bool {
        !self.username.is_empty()
    }

    /// Returns the first value a setter rejected for being too long.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rejected.clone().map_or(Ok(()), Err)
    }

    /// Returns the reconnect interval, or `None` when reconnection is disabled.
    pub fn reconnect_interval(&self) -> Option<u32> {
        (self.reconnect_interval_ms > 0).then_some(self.reconnect_interval_ms)
    }
}

// ============================================================================
// Line Config
// ============================================================================

/// Input line configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineConfig {
    /// How raw pin levels map to logical "active"
    pub polarity: Polarity,
}

impl LineConfig {
    /// Set the line polarity
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }
}

// ============================================================================
// Timing Config
// ============================================================================

/// Sampler and foreground loop timing
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingConfig {
    /// Sampler period in microseconds
    pub sample_period_us: u32,
    /// Foreground loop sleep between iterations in milliseconds
    pub loop_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sample_period_us: 1_000,
            loop_interval_ms: 1,
        }
    }
}

impl TimingConfig {
    /// Set the sampler period (clamped to at least 1us)
    pub fn with_sample_period_us(mut self, us: u32) -> Self {
        self.sample_period_us = us.max(1);
        self
    }

    /// Set the foreground loop interval
    pub fn with_loop_interval_ms(mut self, ms: u32) -> Self {
        self.loop_interval_ms = ms;
        self
    }
}

// ============================================================================
// Indicator Config
// ============================================================================

/// Status indicator configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndicatorConfig {
    /// How long the activity indicator stays lit after a publish
    pub pulse_ms: u32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self { pulse_ms: 500 }
    }
}

impl IndicatorConfig {
    /// Set the activity pulse duration
    pub fn with_pulse_ms(mut self, ms: u32) -> Self {
        self.pulse_ms = ms;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: SsidString,
    /// WiFi password
    pub password: ShortString,
    /// Association timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Whether WiFi is enabled
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    rejected: Option<ConfigError>,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: SsidString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            enabled: true,
            rejected: None,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        assign(&mut self.ssid, &mut self.rejected, "ssid", ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        assign(&mut self.password, &mut self.rejected, "password", password);
        self
    }

    /// Set the association timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Returns the first value a setter rejected for being too long.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rejected.clone().map_or(Ok(()), Err)
    }
}

// ============================================================================
// Tests
// ============================================================================
