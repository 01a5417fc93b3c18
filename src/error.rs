//! Error types.
//!
//! Two classes of failure exist:
//!
//! - [`StartupError`]: the node cannot run at all. Returned by the boot
//!   sequence in [`crate::startup`]; the binary aborts with
//!   [`StartupError::exit_code`].
//! - [`PublisherError`]: the MQTT side is degraded. Logged, signalled on the
//!   failure indicator, and otherwise ignored; the sampler and dispatcher
//!   keep running.

use thiserror::Error;

use crate::broker::BrokerAddressError;
use crate::config::ConfigError;

/// Fatal startup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    /// The periodic sampler could not be registered.
    #[error("failed to register periodic sampler")]
    TimerRegistration,
    /// The network stack / radio failed to initialize.
    #[error("network bearer initialization failed")]
    NetworkInit,
    /// The access point did not accept us in time.
    #[error("WiFi association timed out after {timeout_ms} ms")]
    AssociationTimeout {
        /// Configured association timeout.
        timeout_ms: u32,
    },
    /// The access point association failed for another reason.
    #[error("WiFi association failed")]
    AssociationFailed,
    /// A WiFi setting did not fit its field.
    #[error("invalid WiFi configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl StartupError {
    /// Process exit status for this failure.
    ///
    /// ```
    /// use rs_linewatch::StartupError;
    ///
    /// assert_eq!(StartupError::TimerRegistration.exit_code(), 1);
    /// assert_eq!(StartupError::NetworkInit.exit_code(), -1);
    /// ```
    pub const fn exit_code(&self) -> i32 {
        match self {
            StartupError::TimerRegistration => 1,
            StartupError::NetworkInit
            | StartupError::AssociationTimeout { .. }
            | StartupError::AssociationFailed
            | StartupError::InvalidConfig(_) => -1,
        }
    }
}

/// Recoverable MQTT failure.
#[derive(Debug, Error)]
pub enum PublisherError<E: core::fmt::Debug> {
    /// A broker setting did not fit its field.
    #[error("invalid MQTT configuration: {0}")]
    Config(#[from] ConfigError),
    /// The configured broker host is not usable.
    #[error("failed to resolve broker address: {0}")]
    AddressResolution(#[from] BrokerAddressError),
    /// The transport rejected the connection request (including client
    /// allocation failures).
    #[error("MQTT connection failed with error: {0:?}")]
    Connect(E),
    /// The transport rejected a publish.
    #[error("failed to publish message, error: {0:?}")]
    Publish(E),
}
