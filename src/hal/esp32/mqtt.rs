//! MQTT transport for ESP32-C3 on top of the ESP-IDF MQTT client.
//!
//! Connection events are read on a dedicated thread and forwarded to the
//! foreground loop through a channel:
//!
//! | ESP-IDF event | [`ConnectionStatus`] |
//! |---------------|----------------------|
//! | `Connected` | `Accepted` |
//! | `Disconnected` after `Connected` | `LinkLost` |
//! | `Disconnected` before `Connected` | `Refused { code: ESP_FAIL }` |
//!
//! The ESP-IDF client reconnects on its own. To keep a lost connection
//! lost, the client is dropped as soon as `LinkLost` or `Refused` is taken
//! from the channel; a new `connect()` builds a fresh client with its own
//! channel, so late events from the previous one are never read.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::traits::{ConnectRequest, ConnectionStatus, MqttTransport};
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttConnection, EventPayload, MqttClientConfiguration, QoS,
};
use esp_idf_svc::sys::{EspError, ESP_FAIL};
use log::{debug, warn};
use thiserror::Error;

/// Error type for ESP32 MQTT operations.
#[derive(Debug, Error)]
pub enum Esp32MqttError {
    /// No client exists (never connected, or the connection was lost).
    #[error("MQTT client not connected")]
    NotConnected,
    /// ESP-IDF rejected the request.
    #[error("MQTT client error: {0}")]
    Client(#[from] EspError),
}

/// ESP-IDF backed [`MqttTransport`].
pub struct Esp32MqttTransport {
    client: Option<EspMqttClient<'static>>,
    status_rx: Receiver<ConnectionStatus>,
}

impl Esp32MqttTransport {
    /// Creates a transport with no client.
    pub fn new() -> Self {
        // Sender dropped at once: no status until the first connect()
        let (_, status_rx) = channel();
        Self {
            client: None,
            status_rx,
        }
    }
}

impl Default for Esp32MqttTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttTransport for Esp32MqttTransport {
    type Error = Esp32MqttError;

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), Esp32MqttError> {
        // Replaces any previous client and its event channel
        self.client = None;
        let (status_tx, status_rx) = channel();
        self.status_rx = status_rx;

        let url = format!("mqtt://{}:{}", request.broker, request.port);
        let conf = MqttClientConfiguration {
            client_id: Some(request.client_id),
            keep_alive_interval: Some(Duration::from_secs(request.keep_alive_secs as u64)),
            username: request.credentials.map(|(user, _)| user),
            password: request.credentials.map(|(_, pass)| pass),
            ..Default::default()
        };

        let (client, connection) = EspMqttClient::new(url.as_str(), &conf)?;

        thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(6 * 1024)
            .spawn(move || forward_events(connection, status_tx))
            .map_err(|e| {
                warn!("[MQTT] Failed to spawn event thread: {}", e);
                Esp32MqttError::Client(EspError::from_infallible::<ESP_FAIL>())
            })?;

        self.client = Some(client);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Esp32MqttError> {
        let client = self.client.as_mut().ok_or(Esp32MqttError::NotConnected)?;
        // Outbox enqueue, does not wait for the network
        client.enqueue(topic, QoS::AtMostOnce, retain, payload)?;
        Ok(())
    }

    fn try_recv_status(&mut self) -> Option<ConnectionStatus> {
        match self.status_rx.try_recv() {
            Ok(status) => {
                if !matches!(status, ConnectionStatus::Accepted) {
                    self.client = None;
                }
                Some(status)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn forward_events(mut connection: EspMqttConnection, status_tx: Sender<ConnectionStatus>) {
    let mut connected = false;
    // Ends when the client is dropped
    while let Ok(event) = connection.next() {
        let status = match event.payload() {
            EventPayload::Connected(_) => {
                connected = true;
                ConnectionStatus::Accepted
            }
            EventPayload::Disconnected if connected => {
                connected = false;
                ConnectionStatus::LinkLost
            }
            EventPayload::Disconnected => ConnectionStatus::Refused { code: ESP_FAIL },
            EventPayload::Error(e) => {
                warn!("[MQTT] Error event: {:?}", e);
                continue;
            }
            other => {
                debug!("[MQTT] Event: {:?}", other);
                continue;
            }
        };
        if status_tx.send(status).is_err() {
            break;
        }
    }
    debug!("[MQTT] Event thread finished");
}
