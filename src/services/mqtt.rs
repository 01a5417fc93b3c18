//! Desktop MQTT transport built on `rumqttc`.
//!
//! The `rumqttc` event loop runs as a tokio task. It forwards the outcome of
//! the connection to the foreground loop through an unbounded channel that
//! [`RumqttTransport::try_recv_status`](crate::traits::MqttTransport::try_recv_status)
//! drains without blocking:
//!
//! | Event loop result | [`ConnectionStatus`] |
//! |-------------------|----------------------|
//! | `ConnAck` success | `Accepted` |
//! | `ConnAck` refusal | `Refused { code }` (MQTT return code) |
//! | error before `ConnAck` | `Refused { code: -1 }` |
//! | error after `ConnAck` | `LinkLost` |
//!
//! The event loop stops at the first error, so the transport never
//! reconnects on its own.
//!
//! # Example
//!
//! ```ignore
//! let runtime = tokio::runtime::Runtime::new()?;
//! let transport = RumqttTransport::new(runtime.handle().clone());
//! let mut publisher = Publisher::new(transport, indicator, config.mqtt, 500);
//! publisher.initialize()?;
//! ```

use std::time::Duration;

use log::{debug, warn};
use rumqttc::{
    AsyncClient, ClientError, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions,
    Packet, QoS,
};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::traits::{ConnectRequest, ConnectionStatus, MqttTransport};

/// Request queue depth between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 10;

/// Code reported when the connection fails before the broker answers.
pub const TRANSPORT_FAILURE: i32 = -1;

/// MQTT-related errors
#[derive(Debug, Error)]
pub enum RumqttError {
    /// No tokio runtime to run the event loop on.
    #[error("no tokio runtime available")]
    NoRuntime,
    /// No client exists (never connected, or the connection was lost).
    #[error("MQTT client not connected")]
    NotConnected,
    /// The request queue rejected the message.
    #[error("MQTT client error: {0}")]
    Client(#[from] ClientError),
}

/// `rumqttc` backed [`MqttTransport`].
pub struct RumqttTransport {
    runtime: Handle,
    client: Option<AsyncClient>,
    event_task: Option<JoinHandle<()>>,
    // One channel per client
    status_rx: mpsc::UnboundedReceiver<ConnectionStatus>,
}

impl RumqttTransport {
    /// Creates a transport whose event loop runs on `runtime`.
    pub fn new(runtime: Handle) -> Self {
        // Sender dropped at once: no status until the first connect()
        let (_, status_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            client: None,
            event_task: None,
            status_rx,
        }
    }

    /// Creates a transport on the runtime of the calling context.
    pub fn from_current() -> Result<Self, RumqttError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| RumqttError::NoRuntime)
    }

    /// Whether a client is currently held.
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    fn teardown(&mut self) {
        self.client = None;
        if let Some(task) = self.event_task.take() {
            task.abort();
        }
    }
}

impl MqttTransport for RumqttTransport {
    type Error = RumqttError;

    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), RumqttError> {
        self.teardown();

        let mut options =
            MqttOptions::new(request.client_id, request.broker.to_string(), request.port);
        options.set_keep_alive(Duration::from_secs(request.keep_alive_secs as u64));
        if let Some((username, password)) = request.credentials {
            options.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        self.status_rx = status_rx;
        self.event_task = Some(self.runtime.spawn(forward_events(eventloop, status_tx)));
        self.client = Some(client);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), RumqttError> {
        let client = self.client.as_ref().ok_or(RumqttError::NotConnected)?;
        client.try_publish(topic, QoS::AtMostOnce, retain, payload.to_vec())?;
        Ok(())
    }

    fn try_recv_status(&mut self) -> Option<ConnectionStatus> {
        let status = self.status_rx.try_recv().ok()?;
        if status != ConnectionStatus::Accepted {
            self.teardown();
        }
        Some(status)
    }
}

impl Drop for RumqttTransport {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn forward_events(
    mut eventloop: EventLoop,
    status_tx: mpsc::UnboundedSender<ConnectionStatus>,
) {
    let mut connected = false;
    loop {
        let status = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    connected = true;
                    ConnectionStatus::Accepted
                } else {
                    ConnectionStatus::Refused {
                        code: ack.code as i32,
                    }
                }
            }
            Ok(event) => {
                debug!("[MQTT] Event: {:?}", event);
                continue;
            }
            Err(e) => {
                warn!("[MQTT] Event loop error: {}", e);
                let status = match e {
                    _ if connected => ConnectionStatus::LinkLost,
                    ConnectionError::ConnectionRefused(code) => ConnectionStatus::Refused {
                        code: code as i32,
                    },
                    _ => ConnectionStatus::Refused {
                        code: TRANSPORT_FAILURE,
                    },
                };
                let _ = status_tx.send(status);
                break;
            }
        };

        let refused = matches!(status, ConnectionStatus::Refused { .. });
        if status_tx.send(status).is_err() || refused {
            break;
        }
    }
    debug!("[MQTT] Event loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerAddress;

    async fn next_status(transport: &mut RumqttTransport) -> Option<ConnectionStatus> {
        for _ in 0..100 {
            if let Some(status) = transport.try_recv_status() {
                return Some(status);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }

    #[test]
    fn from_current_needs_runtime() {
        assert!(matches!(
            RumqttTransport::from_current(),
            Err(RumqttError::NoRuntime)
        ));
    }

    #[tokio::test]
    async fn publish_without_client_fails() {
        let mut transport = RumqttTransport::from_current().unwrap();
        assert!(matches!(
            transport.publish("t", b"x", false),
            Err(RumqttError::NotConnected)
        ));
        assert_eq!(transport.try_recv_status(), None);
    }

    #[tokio::test]
    async fn unreachable_broker_is_refused() {
        let mut transport = RumqttTransport::from_current().unwrap();
        let broker = BrokerAddress::resolve("127.0.0.1").unwrap();
        let request = ConnectRequest {
            broker: &broker,
            port: 1,
            client_id: "linewatch-test",
            keep_alive_secs: 5,
            credentials: None,
        };

        transport.connect(&request).unwrap();
        assert!(transport.has_client());

        let status = next_status(&mut transport).await;
        assert!(matches!(status, Some(ConnectionStatus::Refused { .. })));
        // Torn down, no automatic reconnect
        assert!(!transport.has_client());
        assert!(matches!(
            transport.publish("t", b"x", false),
            Err(RumqttError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn reconnect_discards_previous_client_events() {
        let mut transport = RumqttTransport::from_current().unwrap();
        let broker = BrokerAddress::resolve("127.0.0.1").unwrap();
        let request = ConnectRequest {
            broker: &broker,
            port: 1,
            client_id: "linewatch-test",
            keep_alive_secs: 5,
            credentials: None,
        };

        transport.connect(&request).unwrap();
        // Let the first event loop report its refusal without draining it
        for _ in 0..100 {
            if transport.event_task.as_ref().map_or(true, |t| t.is_finished()) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        transport.connect(&request).unwrap();
        // The new event loop has not run yet on this single-threaded runtime
        assert_eq!(transport.try_recv_status(), None);
        assert!(transport.has_client());
    }
}
