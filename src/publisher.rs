//! MQTT publisher and connection manager.
//!
//! [`Publisher`] owns the transport handle and the [`ConnectionState`]. It
//! turns a tuple of line values into a report on the state topic, announces
//! itself once per accepted connection, and drives the status indicators.
//!
//! # Connection lifecycle
//!
//! ```text
//! Disconnected --initialize()--> Connecting --Accepted--> Connected
//!                                Connecting --Refused---> Failed
//!                                Connected  --LinkLost--> Failed
//! Failed       --initialize()--> Connecting
//! ```
//!
//! Nothing here retries on its own. Leaving `Failed` takes another
//! [`initialize`](Publisher::initialize) call, made either by the
//! application or by the node's opt-in reconnect policy.
//!
//! # Example
//!
//! ```rust
//! use rs_linewatch::{ConnectionState, ConnectionStatus, LineValues, MqttConfig, Publisher};
//! use rs_linewatch::hal::{MockIndicator, MockTransport};
//!
//! let config = MqttConfig::default().with_host("192.168.1.50");
//! let mut publisher = Publisher::new(MockTransport::new(), MockIndicator::new(), config, 500);
//!
//! publisher.initialize().unwrap();
//! assert_eq!(publisher.state(), ConnectionState::Connecting);
//!
//! publisher.on_connection_status(ConnectionStatus::Accepted);
//! assert_eq!(publisher.state(), ConnectionState::Connected);
//!
//! publisher.publish(LineValues::new(true, false), 0).unwrap();
//! let (topic, payload, _) = publisher.transport().published.last().unwrap();
//! assert_eq!(topic, "linewatch/lines");
//! assert_eq!(payload, b"lineA: true, lineB: false");
//! ```

use log::{error, info, warn};

use crate::broker::BrokerAddress;
use crate::config::MqttConfig;
use crate::error::PublisherError;
use crate::lines::LineValues;
use crate::messages::OutgoingMessage;
use crate::traits::{ConnectRequest, ConnectionStatus, Indicator, MqttTransport, StatusIndicator};

/// Connection state of the MQTT client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConnectionState {
    /// Never initialized.
    #[default]
    Disconnected,
    /// Connection requested, waiting for the broker.
    Connecting,
    /// Broker accepted the connection.
    Connected,
    /// Connection refused or lost; needs another `initialize()`.
    Failed,
}

impl ConnectionState {
    /// Returns the state as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        }
    }
}

/// Publish counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Line reports handed to the transport.
    pub attempted: u32,
    /// Line reports accepted for delivery.
    pub accepted: u32,
    /// Line reports rejected by the transport.
    pub rejected: u32,
    /// Announcements sent after an accepted connection.
    pub announcements: u32,
    /// Connection requests made.
    pub connect_attempts: u32,
}

/// Publisher / connection manager.
pub struct Publisher<T: MqttTransport, S: StatusIndicator> {
    transport: T,
    indicator: S,
    config: MqttConfig,
    pulse_ms: u32,
    state: ConnectionState,
    pulse_until: Option<u64>,
    stats: PublishStats,
}

impl<T: MqttTransport, S: StatusIndicator> Publisher<T, S> {
    /// Create a publisher in the `Disconnected` state.
    ///
    /// `pulse_ms` is how long the activity indicator stays lit after an
    /// accepted publish.
    pub fn new(transport: T, indicator: S, config: MqttConfig, pulse_ms: u32) -> Self {
        Self {
            transport,
            indicator,
            config,
            pulse_ms,
            state: ConnectionState::Disconnected,
            pulse_until: None,
            stats: PublishStats::default(),
        }
    }

    /// Request a connection to the configured broker.
    ///
    /// Returns once the request is queued; the outcome is delivered later
    /// through [`on_connection_status`](Self::on_connection_status). Calling
    /// this while `Connecting` or `Connected` does nothing.
    ///
    /// # Errors
    ///
    /// Configuration values rejected for length, broker address validation
    /// failures and transport rejections are returned after being logged. The state becomes `Failed` and the
    /// failure indicator is lit; no retry is scheduled.
    pub fn initialize(&mut self) -> Result<(), PublisherError<T::Error>> {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            warn!(
                "[MQTT] initialize() ignored, connection already {}",
                self.state.as_str()
            );
            return Ok(());
        }

        if let Err(e) = self.config.validate() {
            error!("[MQTT] Invalid configuration: {}", e);
            self.enter_failed();
            return Err(e.into());
        }

        let broker = match BrokerAddress::resolve(self.config.host.as_str()) {
            Ok(broker) => broker,
            Err(e) => {
                error!(
                    "[MQTT] Failed to resolve broker address {}: {}",
                    self.config.host, e
                );
                self.enter_failed();
                return Err(e.into());
            }
        };

        let credentials = self
            .config
            .has_auth()
            .then(|| (self.config.username.as_str(), self.config.password.as_str()));
        let request = ConnectRequest {
            broker: &broker,
            port: self.config.port,
            client_id: self.config.client_id.as_str(),
            keep_alive_secs: self.config.keep_alive_secs,
            credentials,
        };

        self.stats.connect_attempts = self.stats.connect_attempts.wrapping_add(1);
        match self.transport.connect(&request) {
            Ok(()) => {
                self.state = ConnectionState::Connecting;
                info!(
                    "[MQTT] Connecting to MQTT broker at {}:{}...",
                    broker, self.config.port
                );
                Ok(())
            }
            Err(e) => {
                error!("[MQTT] Connection failed with error code: {:?}", e);
                self.enter_failed();
                Err(PublisherError::Connect(e))
            }
        }
    }

    /// Handle an asynchronous connection notification.
    ///
    /// This is the only place the state changes after `initialize()`.
    /// `Accepted` and `Refused` answer a pending request and only count
    /// while `Connecting`; `LinkLost` only counts while a link exists or is
    /// being set up. Anything else is stale and ignored.
    pub fn on_connection_status(&mut self, status: ConnectionStatus) {
        match (self.state, status) {
            (ConnectionState::Connecting, ConnectionStatus::Accepted) => {
                self.state = ConnectionState::Connected;
                info!("[MQTT] Connected successfully");
                self.announce();
                self.light(Indicator::Success, true);
                self.light(Indicator::Failure, false);
            }
            (ConnectionState::Connecting, ConnectionStatus::Refused { code }) => {
                error!("[MQTT] Connection failed with status: {}", code);
                self.enter_failed();
            }
            (
                ConnectionState::Connecting | ConnectionState::Connected,
                ConnectionStatus::LinkLost,
            ) => {
                warn!("[MQTT] Connection to broker lost");
                self.enter_failed();
            }
            (state, status) => {
                warn!(
                    "[MQTT] Ignoring {:?} received while {}",
                    status,
                    state.as_str()
                );
            }
        }
    }

    /// Drain every pending notification from the transport.
    ///
    /// Returns how many notifications were handled.
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(status) = self.transport.try_recv_status() {
            self.on_connection_status(status);
            handled += 1;
        }
        handled
    }

    /// Publish a line report.
    ///
    /// The report is attempted whatever the connection state; a transport
    /// that is not connected is expected to reject it. Rejection is logged
    /// and returned but does not change the connection state.
    pub fn publish(
        &mut self,
        values: LineValues,
        now_ms: u64,
    ) -> Result<(), PublisherError<T::Error>> {
        let message = OutgoingMessage::line_report(self.config.state_topic.as_str(), values);
        self.stats.attempted = self.stats.attempted.wrapping_add(1);

        match self
            .transport
            .publish(message.topic, message.as_bytes(), false)
        {
            Ok(()) => {
                self.stats.accepted = self.stats.accepted.wrapping_add(1);
                info!("[MQTT] Message published: {}", message.payload_str());
                self.light(Indicator::Activity, true);
                self.pulse_until = Some(now_ms.saturating_add(self.pulse_ms as u64));
                Ok(())
            }
            Err(e) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                warn!("[MQTT] Failed to publish message. Error: {:?}", e);
                Err(PublisherError::Publish(e))
            }
        }
    }

    /// Turn the activity indicator off once its pulse has elapsed.
    pub fn update(&mut self, now_ms: u64) {
        if let Some(until) = self.pulse_until {
            if now_ms >= until {
                self.pulse_until = None;
                self.light(Indicator::Activity, false);
            }
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the activity pulse is still running.
    pub fn is_pulsing(&self) -> bool {
        self.pulse_until.is_some()
    }

    /// Publish counters.
    pub fn stats(&self) -> PublishStats {
        self.stats
    }

    /// The MQTT configuration in use.
    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get a reference to the indicator.
    pub fn indicator(&self) -> &S {
        &self.indicator
    }

    fn announce(&mut self) {
        let topic = self.config.announce_topic.as_str();
        let payload = self.config.announce_payload.as_bytes();
        self.stats.announcements = self.stats.announcements.wrapping_add(1);
        match self.transport.publish(topic, payload, false) {
            Ok(()) => info!(
                "[MQTT] Announcement published to {}: {}",
                topic, self.config.announce_payload
            ),
            Err(e) => warn!("[MQTT] Failed to publish announcement. Error: {:?}", e),
        }
    }

    fn enter_failed(&mut self) {
        self.state = ConnectionState::Failed;
        self.light(Indicator::Success, false);
        self.light(Indicator::Failure, true);
    }

    fn light(&mut self, indicator: Indicator, on: bool) {
        if self.indicator.set(indicator, on).is_err() {
            warn!("[LED] Failed to set {:?} indicator", indicator);
        }
    }
}
