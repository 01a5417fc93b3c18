//! # rs-linewatch
//!
//! Edge-detecting line monitor that reports two digital inputs over MQTT.
//!
//! ## Features
//!
//! - **Periodic sampling**: a timer-driven sampler raises a per-line change flag on every edge
//! - **Fresh reporting**: the foreground loop re-reads the lines before publishing
//! - **Connection management**: explicit MQTT state machine with status indicators
//! - **Hardware abstraction**: traits for lines, indicators, timers, WiFi and MQTT
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Hardware and network abstractions
//! - `change` - Lock-free change flags shared between sampler and loop
//! - `sampler` - Edge detection, runs in the timer context
//! - `dispatcher` - Consumes flags, reads current values
//! - `publisher` - MQTT connection state machine and line reports
//! - `node` - Foreground loop tying dispatcher and publisher together
//! - `startup` - Fatal boot steps (timer registration, WiFi)
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use rs_linewatch::{
//!     ChangeBuffer, ConnectionStatus, EdgeNode, LineId, LineValues, MqttConfig, Publisher,
//!     Sampler,
//!     hal::{MockIndicator, MockLines, MockTransport},
//! };
//!
//! let lines = MockLines::new(LineValues::new(false, false));
//! let changes = ChangeBuffer::new();
//!
//! // Timer side
//! let mut sampler = Sampler::new(&lines, &changes);
//!
//! // Foreground side
//! let publisher = Publisher::new(MockTransport::new(), MockIndicator::new(), MqttConfig::default(), 500);
//! let mut node = EdgeNode::new(&lines, &changes, publisher);
//! node.start(0);
//! node.publisher_mut().transport_mut().queue_status(ConnectionStatus::Accepted);
//!
//! // Line A goes active
//! lines.set(LineId::A, true);
//! sampler.sample();
//!
//! let report = node.tick(1);
//! assert_eq!(report.dispatched, Some(LineValues::new(true, false)));
//!
//! let reports = node.publisher().transport().published_to("linewatch/lines");
//! assert_eq!(reports[0].1, b"lineA: true, lineB: false".to_vec());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Broker address validation.
pub mod broker;
/// Change flags shared between the sampler and the foreground loop.
pub mod change;
/// Foreground consumer of the change flags.
pub mod dispatcher;
/// Startup and publisher error types.
pub mod error;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Line identifiers, values and polarity.
pub mod lines;
/// Foreground loop of an edge node.
pub mod node;
/// MQTT publisher and connection state machine.
pub mod publisher;
/// Periodic edge sampler.
pub mod sampler;
/// Fatal boot sequence.
pub mod startup;
/// Core traits for hardware and network abstraction.
pub mod traits;

/// Shared configuration system for desktop and ESP32.
pub mod config;

/// Outgoing MQTT message construction.
pub mod messages;

/// Desktop runtime services: rumqttc transport, thread scheduler (feature-gated).
#[cfg(feature = "mqtt")]
pub mod services;

// Re-exports for convenience
pub use broker::{BrokerAddress, BrokerAddressError};
pub use change::{ChangeBuffer, ChangeSignal};
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{PublisherError, StartupError};
pub use lines::{LineId, LineState, LineValues, Polarity};
pub use node::{EdgeNode, TickReport};
pub use publisher::{ConnectionState, PublishStats, Publisher};
pub use sampler::Sampler;
pub use traits::{
    // Hardware
    Clock,
    Indicator,
    LineInput,
    PeriodicScheduler,
    StatusIndicator,
    // Network
    AssociateError,
    ConnectRequest,
    ConnectionStatus,
    MqttTransport,
    NetworkBearer,
};

// Config re-exports
pub use config::{
    Config, ConfigError, IndicatorConfig, LineConfig, MqttConfig, TimingConfig, WifiConfig,
};

pub use messages::{format_line_payload, OutgoingMessage};
