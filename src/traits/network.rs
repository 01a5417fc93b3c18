//! Network abstraction traits for the MQTT transport and the IP bearer.
//!
//! # Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MqttTransport`] | Connect, publish, and report connection status |
//! | [`NetworkBearer`] | Bring up the WiFi link before MQTT starts |
//!
//! # Connection notifications
//!
//! A transport learns about connection outcomes asynchronously (an event
//! thread, a callback, a tokio task). It queues them as
//! [`ConnectionStatus`] values; the foreground loop drains the queue with
//! [`MqttTransport::try_recv_status`] once per iteration, so notifications
//! are handled one at a time on the same context that publishes.

use core::net::Ipv4Addr;

use crate::broker::BrokerAddress;

// ============================================================================
// MQTT Transport
// ============================================================================

/// Asynchronous connection notification from the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The broker accepted the connection.
    Accepted,
    /// The connection attempt was refused or could not be established.
    Refused {
        /// Transport specific reason code.
        code: i32,
    },
    /// An established connection was lost.
    LinkLost,
}

/// Parameters of a connection request.
#[derive(Clone, Copy, Debug)]
pub struct ConnectRequest<'a> {
    /// Validated broker address.
    pub broker: &'a BrokerAddress,
    /// Broker port.
    pub port: u16,
    /// Client identity presented to the broker.
    pub client_id: &'a str,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Optional username / password pair.
    pub credentials: Option<(&'a str, &'a str)>,
}

/// MQTT transport capability.
///
/// Sync-first like the rest of the hardware traits: `connect` and `publish`
/// only *request* work and return immediately. The outcome of `connect`
/// arrives later through [`try_recv_status`](Self::try_recv_status).
///
/// # Implementation Notes
///
/// - `connect` must not block waiting for the broker
/// - `publish` returning `Ok` means "accepted for delivery"
/// - `try_recv_status` is non-blocking and never reorders notifications
/// - The transport must not reconnect on its own after reporting `LinkLost`
pub trait MqttTransport {
    /// Error type for transport operations.
    type Error: core::fmt::Debug;

    /// Request a connection to the broker.
    fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), Self::Error>;

    /// Request delivery of one message.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Take the next pending connection notification, if any.
    fn try_recv_status(&mut self) -> Option<ConnectionStatus>;
}

// ============================================================================
// Network Bearer
// ============================================================================

/// Failure of a WiFi association attempt.
#[derive(Debug)]
pub enum AssociateError<E> {
    /// No association within the allowed time.
    Timeout,
    /// The driver reported an error.
    Failed(E),
}

/// IP bearer bring-up (WiFi station mode on the device).
///
/// All operations block; they run once at startup before the foreground
/// loop begins.
pub trait NetworkBearer {
    /// Driver error type.
    type Error: core::fmt::Debug;

    /// Initialize the radio / network stack.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Join the access point, giving up after `timeout_ms`.
    fn associate(
        &mut self,
        ssid: &str,
        password: &str,
        timeout_ms: u32,
    ) -> Result<(), AssociateError<Self::Error>>;

    /// Address assigned to this node, once associated.
    fn ip_addr(&self) -> Option<Ipv4Addr>;
}
